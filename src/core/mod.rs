pub mod aggregate;
pub mod etl;
pub mod loader;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod report;

pub use crate::domain::model::{HabitatCounts, PlotSpec, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
