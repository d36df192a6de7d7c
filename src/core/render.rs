use crate::domain::model::{Orientation, PlotSpec};
use crate::utils::error::{Result, SplitError};
use plotters::coord::ranged1d::SegmentValue;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::io::Cursor;
use std::path::Path;

/// Segments narrower than this carry no percentage label.
const MIN_ANNOTATED_PERCENT: f64 = 8.0;
const BAR_GAP_PX: u32 = 3;
/// Upper bound for the band axis; beyond it bars get thinner instead.
pub const MAX_CANVAS_PX: u32 = 16_384;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Svg,
}

impl OutputFormat {
    pub fn from_path(path: &str) -> Result<Self> {
        let extension = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match extension.as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            _ => Err(SplitError::InvalidConfigValueError {
                field: "output_path".to_string(),
                value: path.to_string(),
                reason: "Output must end in .png or .svg".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub title: String,
    pub label_a: String,
    pub label_b: String,
    pub color_a: RGBColor,
    pub color_b: RGBColor,
    pub orientation: Orientation,
}

pub fn parse_hex_color(value: &str) -> Result<RGBColor> {
    let invalid = || SplitError::InvalidConfigValueError {
        field: "color".to_string(),
        value: value.to_string(),
        reason: "Expected a color in #RRGGBB form".to_string(),
    };

    let digits = value.strip_prefix('#').ok_or_else(invalid)?;
    if digits.len() != 6 {
        return Err(invalid());
    }
    let channel = |i: usize| {
        digits
            .get(i..i + 2)
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .ok_or_else(invalid)
    };
    Ok(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

/// One bar in chart space. `slot` is the category index on the band axis;
/// for horizontal charts slot 0 is the bottom row, so the first bar gets the
/// highest slot and lands on top.
#[derive(Debug, Clone, PartialEq)]
pub struct BarLayout {
    pub slot: i32,
    pub species: String,
    pub segment_a: (f64, f64),
    pub segment_b: (f64, f64),
    pub annotation_a: Option<String>,
    pub annotation_b: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub width: u32,
    pub height: u32,
    pub bars: Vec<BarLayout>,
    /// Species name per slot, for axis labels.
    pub slot_names: Vec<String>,
}

impl ChartLayout {
    pub fn new(plot: &PlotSpec, orientation: Orientation) -> Self {
        let n = plot.len();
        let (width, height) = canvas_size(n, orientation);

        let bars: Vec<BarLayout> = plot
            .bars
            .iter()
            .enumerate()
            .map(|(i, bar)| BarLayout {
                slot: match orientation {
                    Orientation::Horizontal => (n - 1 - i) as i32,
                    Orientation::Vertical => i as i32,
                },
                species: bar.species.clone(),
                segment_a: (0.0, bar.percent_a),
                segment_b: (bar.percent_a, 100.0),
                annotation_a: annotation(bar.percent_a),
                annotation_b: annotation(bar.percent_b),
            })
            .collect();

        let mut slot_names = vec![String::new(); n];
        for bar in &bars {
            slot_names[bar.slot as usize] = bar.species.clone();
        }

        Self {
            width,
            height,
            bars,
            slot_names,
        }
    }

    fn slot_label(&self, value: &SegmentValue<i32>) -> String {
        match value {
            SegmentValue::CenterOf(slot) | SegmentValue::Exact(slot) => self
                .slot_names
                .get(*slot as usize)
                .cloned()
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        }
    }

    fn label_area(&self) -> u32 {
        let longest = self
            .slot_names
            .iter()
            .map(|name| name.chars().count())
            .max()
            .unwrap_or(0) as u32;
        (longest * 7 + 20).clamp(60, 320)
    }
}

/// Grows along the band axis so labels stay legible, up to [`MAX_CANVAS_PX`].
pub fn canvas_size(bars: usize, orientation: Orientation) -> (u32, u32) {
    let bars = u32::try_from(bars).unwrap_or(u32::MAX);
    let band = |base: u32, per_bar: u32, min: u32| {
        base.saturating_add(per_bar.saturating_mul(bars))
            .clamp(min, MAX_CANVAS_PX)
    };
    match orientation {
        Orientation::Horizontal => (1000, band(140, 26, 360)),
        Orientation::Vertical => (band(160, 36, 480), 640),
    }
}

/// Byte length of an RGB pixel buffer for the canvas.
fn rgb_buffer_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or_else(|| SplitError::Render {
            message: format!("a {}x{} canvas is too large to allocate", width, height),
        })
}

/// Whether a sans-serif font can be resolved for measuring text.
pub fn has_usable_font() -> bool {
    ("sans-serif", 12).into_font().box_size("Ag").is_ok()
}

fn annotation(percent: f64) -> Option<String> {
    (percent >= MIN_ANNOTATED_PERCENT).then(|| format!("{:.0}%", percent))
}

/// Renders the whole chart into memory; nothing touches disk here.
pub fn render_chart(plot: &PlotSpec, style: &ChartStyle, format: OutputFormat) -> Result<Vec<u8>> {
    if !has_usable_font() {
        return Err(SplitError::Render {
            message: "no sans-serif font could be loaded for chart labels".to_string(),
        });
    }
    let layout = ChartLayout::new(plot, style.orientation);
    let (width, height) = (layout.width, layout.height);
    tracing::debug!(
        "Rendering {} bars on a {}x{} {:?} canvas",
        layout.bars.len(),
        width,
        height,
        format
    );

    match format {
        OutputFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
                draw(&root, &layout, style).map_err(render_error)?;
                root.present().map_err(render_error)?;
            }
            Ok(svg.into_bytes())
        }
        OutputFormat::Png => {
            let mut buffer = vec![0u8; rgb_buffer_len(width, height)?];
            {
                let root =
                    BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
                draw(&root, &layout, style).map_err(render_error)?;
                root.present().map_err(render_error)?;
            }

            let image = image::RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
                SplitError::Render {
                    message: "pixel buffer does not match canvas size".to_string(),
                }
            })?;
            let mut encoded = Cursor::new(Vec::new());
            image
                .write_to(&mut encoded, image::ImageFormat::Png)
                .map_err(render_error)?;
            Ok(encoded.into_inner())
        }
    }
}

fn render_error<E: std::fmt::Display>(e: E) -> SplitError {
    SplitError::Render {
        message: e.to_string(),
    }
}

type DrawResult<DB> = std::result::Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &ChartLayout,
    style: &ChartStyle,
) -> DrawResult<DB> {
    root.fill(&WHITE)?;
    match style.orientation {
        Orientation::Horizontal => draw_horizontal(root, layout, style),
        Orientation::Vertical => draw_vertical(root, layout, style),
    }
}

fn annotation_style<'a>() -> TextStyle<'a> {
    ("sans-serif", 12)
        .into_font()
        .color(&WHITE)
        .pos(Pos::new(HPos::Center, VPos::Center))
}

fn draw_horizontal<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &ChartLayout,
    style: &ChartStyle,
) -> DrawResult<DB> {
    let slots = layout.slot_names.len().max(1) as i32;
    let mut chart = ChartBuilder::on(root)
        .caption(&style.title, ("sans-serif", 22))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(layout.label_area())
        .build_cartesian_2d(0f64..100f64, (0..slots).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Share of observations (%)")
        .y_labels(slots as usize)
        .y_label_formatter(&|v| layout.slot_label(v))
        .draw()?;

    let (color_a, color_b) = (style.color_a, style.color_b);
    let band = |slot: i32, (start, end): (f64, f64), color: RGBColor| {
        let mut rect = Rectangle::new(
            [
                (start, SegmentValue::Exact(slot)),
                (end, SegmentValue::Exact(slot + 1)),
            ],
            color.filled(),
        );
        rect.set_margin(BAR_GAP_PX, BAR_GAP_PX, 0, 0);
        rect
    };

    chart
        .draw_series(layout.bars.iter().map(|bar| band(bar.slot, bar.segment_a, color_a)))?
        .label(style.label_a.as_str())
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color_a.filled()));
    chart
        .draw_series(layout.bars.iter().map(|bar| band(bar.slot, bar.segment_b, color_b)))?
        .label(style.label_b.as_str())
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color_b.filled()));

    let annotations = layout.bars.iter().flat_map(|bar| {
        [
            (&bar.annotation_a, bar.segment_a, bar.slot),
            (&bar.annotation_b, bar.segment_b, bar.slot),
        ]
    });
    chart.draw_series(annotations.filter_map(|(text, (start, end), slot)| {
        text.as_ref().map(|text| {
            Text::new(
                text.clone(),
                ((start + end) / 2.0, SegmentValue::CenterOf(slot)),
                annotation_style(),
            )
        })
    }))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn draw_vertical<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &ChartLayout,
    style: &ChartStyle,
) -> DrawResult<DB> {
    let slots = layout.slot_names.len().max(1) as i32;
    let mut chart = ChartBuilder::on(root)
        .caption(&style.title, ("sans-serif", 22))
        .margin(16)
        .x_label_area_size(layout.label_area().min(160))
        .y_label_area_size(50)
        .build_cartesian_2d((0..slots).into_segmented(), 0f64..100f64)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc("Share of observations (%)")
        .x_labels(slots as usize)
        .x_label_formatter(&|v| layout.slot_label(v))
        .x_label_style(
            ("sans-serif", 12)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .draw()?;

    let (color_a, color_b) = (style.color_a, style.color_b);
    let column = |slot: i32, (start, end): (f64, f64), color: RGBColor| {
        let mut rect = Rectangle::new(
            [
                (SegmentValue::Exact(slot), start),
                (SegmentValue::Exact(slot + 1), end),
            ],
            color.filled(),
        );
        rect.set_margin(0, 0, BAR_GAP_PX, BAR_GAP_PX);
        rect
    };

    chart
        .draw_series(layout.bars.iter().map(|bar| column(bar.slot, bar.segment_a, color_a)))?
        .label(style.label_a.as_str())
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color_a.filled()));
    chart
        .draw_series(layout.bars.iter().map(|bar| column(bar.slot, bar.segment_b, color_b)))?
        .label(style.label_b.as_str())
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color_b.filled()));

    let annotations = layout.bars.iter().flat_map(|bar| {
        [
            (&bar.annotation_a, bar.segment_a, bar.slot),
            (&bar.annotation_b, bar.segment_b, bar.slot),
        ]
    });
    chart.draw_series(annotations.filter_map(|(text, (start, end), slot)| {
        text.as_ref().map(|text| {
            Text::new(
                text.clone(),
                (SegmentValue::CenterOf(slot), (start + end) / 2.0),
                annotation_style(),
            )
        })
    }))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PlotBar;

    fn plot(bars: &[(&str, f64)]) -> PlotSpec {
        PlotSpec {
            bars: bars
                .iter()
                .map(|(species, percent_a)| PlotBar {
                    species: species.to_string(),
                    percent_a: *percent_a,
                    percent_b: 100.0 - percent_a,
                })
                .collect(),
        }
    }

    fn style(orientation: Orientation) -> ChartStyle {
        ChartStyle {
            title: "Agriculture vs Forest".to_string(),
            label_a: "Agriculture".to_string(),
            label_b: "Forest".to_string(),
            color_a: RGBColor(0x8c, 0x6d, 0x31),
            color_b: RGBColor(0x31, 0xa3, 0x54),
            orientation,
        }
    }

    #[test]
    fn test_output_format_from_path() {
        assert_eq!(OutputFormat::from_path("chart.png").unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::from_path("out/Chart.SVG").unwrap(), OutputFormat::Svg);
        assert!(OutputFormat::from_path("chart.pdf").is_err());
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#31a354").unwrap(), RGBColor(0x31, 0xa3, 0x54));
        assert_eq!(parse_hex_color("#FFFFFF").unwrap(), RGBColor(255, 255, 255));
        assert!(parse_hex_color("31a354").is_err());
        assert!(parse_hex_color("#31a3").is_err());
        assert!(parse_hex_color("#gg0000").is_err());
        assert!(parse_hex_color("#ééé").is_err());
    }

    #[test]
    fn test_horizontal_layout_puts_first_bar_on_top() {
        let layout = ChartLayout::new(
            &plot(&[("Sparrow", 75.0), ("Robin", 53.3), ("Wren", 5.0)]),
            Orientation::Horizontal,
        );

        assert_eq!(layout.bars[0].slot, 2);
        assert_eq!(layout.bars[2].slot, 0);
        assert_eq!(layout.slot_names, vec!["Wren", "Robin", "Sparrow"]);
    }

    #[test]
    fn test_vertical_layout_runs_left_to_right() {
        let layout = ChartLayout::new(
            &plot(&[("Sparrow", 75.0), ("Robin", 53.3)]),
            Orientation::Vertical,
        );

        assert_eq!(layout.bars[0].slot, 0);
        assert_eq!(layout.slot_names, vec!["Sparrow", "Robin"]);
    }

    #[test]
    fn test_segments_span_full_bar() {
        let layout = ChartLayout::new(&plot(&[("Robin", 53.3)]), Orientation::Horizontal);
        let bar = &layout.bars[0];

        assert_eq!(bar.segment_a, (0.0, 53.3));
        assert_eq!(bar.segment_b, (53.3, 100.0));
    }

    #[test]
    fn test_annotations_round_only_for_display() {
        let layout = ChartLayout::new(&plot(&[("Robin", 53.6), ("Owl", 96.0)]), Orientation::Horizontal);

        assert_eq!(layout.bars[0].annotation_a.as_deref(), Some("54%"));
        assert_eq!(layout.bars[0].annotation_b.as_deref(), Some("46%"));
        assert_eq!(layout.bars[1].annotation_a.as_deref(), Some("96%"));
        assert_eq!(layout.bars[1].annotation_b, None);
        assert_eq!(layout.bars[0].segment_a.1, 53.6);
    }

    #[test]
    fn test_canvas_grows_with_species() {
        let (w_small, h_small) = canvas_size(3, Orientation::Horizontal);
        let (w_big, h_big) = canvas_size(80, Orientation::Horizontal);
        assert_eq!(w_small, w_big);
        assert!(h_big > h_small);

        let (w_small, _) = canvas_size(3, Orientation::Vertical);
        let (w_big, _) = canvas_size(80, Orientation::Vertical);
        assert!(w_big > w_small);
    }

    #[test]
    fn test_canvas_is_capped_for_huge_plots() {
        for orientation in [Orientation::Horizontal, Orientation::Vertical] {
            let (width, height) = canvas_size(60_000, orientation);
            assert!(width <= MAX_CANVAS_PX && height <= MAX_CANVAS_PX);
            assert!(rgb_buffer_len(width, height).is_ok());
        }
        assert_eq!(
            canvas_size(usize::MAX, Orientation::Horizontal),
            (1000, MAX_CANVAS_PX)
        );
    }

    #[test]
    fn test_buffer_len_overflow_is_a_render_error() {
        assert_eq!(rgb_buffer_len(1000, 360).unwrap(), 1_080_000);
        assert!(matches!(
            rgb_buffer_len(u32::MAX, u32::MAX),
            Err(SplitError::Render { .. })
        ));
    }

    #[test]
    fn test_empty_plot_has_no_bars() {
        let layout = ChartLayout::new(&PlotSpec::default(), Orientation::Horizontal);
        assert!(layout.bars.is_empty());
        assert_eq!(canvas_size(0, Orientation::Horizontal), (layout.width, layout.height));
    }

    #[test]
    fn test_render_svg_contains_species() {
        if !has_usable_font() {
            eprintln!("no sans-serif font found, skipping");
            return;
        }
        let bytes = render_chart(
            &plot(&[("Sparrow", 75.0), ("Robin", 53.3)]),
            &style(Orientation::Horizontal),
            OutputFormat::Svg,
        )
        .unwrap();
        let svg = String::from_utf8(bytes).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Sparrow"));
        assert!(svg.contains("Forest"));
    }

    #[test]
    fn test_render_png_signature() {
        if !has_usable_font() {
            eprintln!("no sans-serif font found, skipping");
            return;
        }
        let bytes = render_chart(
            &plot(&[("Sparrow", 75.0)]),
            &style(Orientation::Vertical),
            OutputFormat::Png,
        )
        .unwrap();

        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_render_empty_plot() {
        if !has_usable_font() {
            eprintln!("no sans-serif font found, skipping");
            return;
        }
        for format in [OutputFormat::Svg, OutputFormat::Png] {
            let bytes = render_chart(&PlotSpec::default(), &style(Orientation::Horizontal), format)
                .unwrap();
            assert!(!bytes.is_empty());
        }
    }
}
