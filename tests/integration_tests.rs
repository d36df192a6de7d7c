use anyhow::Result;
use habitat_split::core::render::has_usable_font;
use habitat_split::core::{Pipeline, TransformResult};
use habitat_split::domain::model::NormalizeMode;
use habitat_split::{Engine, HabitatPipeline, LocalStorage, SplitConfig, SplitError};
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

fn percent_a(result: &TransformResult, species: &str) -> Option<f64> {
    result
        .normalized
        .iter()
        .find(|r| r.species == species)
        .and_then(|r| r.split)
        .map(|s| s.percent_a)
}

#[tokio::test]
async fn test_csv_inputs_through_transform() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let agri = write(
        temp_dir.path(),
        "agriculture.csv",
        "ID,trap\nSparrow,1\nSparrow,2\nSparrow,3\nRobin,1\nOwl,2\n",
    );
    let forest = write(temp_dir.path(), "forest.csv", "ID,trap\nSparrow,1\nRobin,4\nRobin,5\nRobin,6\n");

    let config = SplitConfig::new(agri, forest);
    let pipeline = HabitatPipeline::new(LocalStorage::default(), config);

    let counts = pipeline.extract().await?;
    let result = pipeline.transform(counts).await?;

    assert_eq!(result.merged.len(), 3);
    assert_eq!(result.total_a, 5);
    assert_eq!(result.total_b, 4);
    assert_eq!(percent_a(&result, "Sparrow"), Some(75.0));
    assert_eq!(percent_a(&result, "Robin"), Some(25.0));
    assert_eq!(percent_a(&result, "Owl"), Some(100.0));

    let order: Vec<&str> = result.plot.bars.iter().map(|b| b.species.as_str()).collect();
    assert_eq!(order, vec!["Owl", "Sparrow", "Robin"]);
    Ok(())
}

#[tokio::test]
async fn test_effort_mode_with_species_column_and_counts() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let agri = write(
        temp_dir.path(),
        "agri.csv",
        "species,count\nSparrow,90\nRobin,10\n",
    );
    let forest = write(temp_dir.path(), "forest.csv", "species,count\nSparrow,9\nRobin,1\n");

    let mut config = SplitConfig::new(agri, forest);
    config.count_column = Some("count".to_string());
    config.normalize_mode = NormalizeMode::Effort;
    let pipeline = HabitatPipeline::new(LocalStorage::default(), config);

    let counts = pipeline.extract().await?;
    let result = pipeline.transform(counts).await?;

    // Same rates in both habitats once effort is removed.
    for species in ["Sparrow", "Robin"] {
        let value = percent_a(&result, species).unwrap();
        assert!((value - 50.0).abs() < 1e-9, "{species}: {value}");
    }
    Ok(())
}

#[tokio::test]
async fn test_empty_habitat_table_is_not_an_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let agri = write(temp_dir.path(), "agri.csv", "ID\nOwl\nOwl\n");
    let forest = write(temp_dir.path(), "forest.csv", "ID\n");

    let pipeline = HabitatPipeline::new(LocalStorage::default(), SplitConfig::new(agri, forest));
    let counts = pipeline.extract().await?;

    assert!(counts.counts_b.is_empty());
    let result = pipeline.transform(counts).await?;
    assert_eq!(result.merged[0].count_b, 0);
    assert_eq!(percent_a(&result, "Owl"), Some(100.0));
    Ok(())
}

#[tokio::test]
async fn test_missing_column_aborts_without_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let agri = write(temp_dir.path(), "agri.csv", "ID\nOwl\n");
    let forest = write(temp_dir.path(), "forest.csv", "name\nOwl\n");
    let output = temp_dir.path().join("chart.png");

    let mut config = SplitConfig::new(agri, forest.clone());
    config.output_path = output.to_str().unwrap().to_string();
    let engine = Engine::new(HabitatPipeline::new(LocalStorage::default(), config));

    match engine.run().await {
        Err(SplitError::MissingColumn { path, .. }) => assert_eq!(path, forest),
        other => panic!("expected MissingColumn, got {:?}", other),
    }
    assert!(!output.exists());
    Ok(())
}

#[tokio::test]
async fn test_missing_file_aborts_without_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let agri = write(temp_dir.path(), "agri.csv", "ID\nOwl\n");
    let forest = temp_dir.path().join("absent.csv").to_str().unwrap().to_string();
    let output = temp_dir.path().join("chart.svg");

    let mut config = SplitConfig::new(agri, forest.clone());
    config.output_path = output.to_str().unwrap().to_string();
    let engine = Engine::new(HabitatPipeline::new(LocalStorage::default(), config));

    match engine.run().await {
        Err(SplitError::FileNotFound { path }) => assert_eq!(path, forest),
        other => panic!("expected FileNotFound, got {:?}", other),
    }
    assert!(!output.exists());
    Ok(())
}

#[tokio::test]
async fn test_unsupported_input_format() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let agri = write(temp_dir.path(), "agri.tsv", "ID\tcount\nOwl\t1\n");
    let forest = write(temp_dir.path(), "forest.csv", "ID\nOwl\n");

    let pipeline = HabitatPipeline::new(LocalStorage::default(), SplitConfig::new(agri, forest));

    match pipeline.extract().await {
        Err(SplitError::UnsupportedFormat { extension, accepted, .. }) => {
            assert_eq!(extension, "tsv");
            assert!(accepted.contains(".csv"));
        }
        other => panic!("expected UnsupportedFormat, got {:?}", other.map(|_| ())),
    }
    Ok(())
}

#[tokio::test]
async fn test_end_to_end_writes_chart_and_summary() -> Result<()> {
    if !has_usable_font() {
        eprintln!("no sans-serif font found, skipping");
        return Ok(());
    }
    let temp_dir = TempDir::new()?;
    let agri = write(temp_dir.path(), "agri.csv", "ID\nSparrow\nSparrow\nSparrow\nRobin\n");
    let forest = write(temp_dir.path(), "forest.csv", "ID\nSparrow\nRobin\nGhost\n");
    let output = temp_dir.path().join("out").join("split.svg");
    let summary = temp_dir.path().join("out").join("split.csv");

    let mut config = SplitConfig::new(agri, forest);
    config.output_path = output.to_str().unwrap().to_string();
    config.summary_path = Some(summary.to_str().unwrap().to_string());

    let engine = Engine::new_with_monitoring(
        HabitatPipeline::new(LocalStorage::default(), config),
        false,
    );
    let saved = engine.run().await?;

    assert_eq!(saved, output.to_str().unwrap());
    let svg = std::fs::read_to_string(&output)?;
    assert!(svg.contains("Sparrow"));
    let table = std::fs::read_to_string(&summary)?;
    assert!(table.starts_with("species,count_a,count_b,percent_a,percent_b"));
    assert!(table.contains("Sparrow,3,1,75.0,25.0"));
    Ok(())
}
