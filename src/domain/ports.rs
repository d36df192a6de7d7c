use crate::domain::model::{HabitatCounts, NormalizeMode, Orientation, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Removing a file that does not exist is not an error.
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Everything the pipeline reads from configuration.
pub trait ConfigProvider: Send + Sync {
    fn habitat_a_path(&self) -> &str;
    fn habitat_b_path(&self) -> &str;
    fn label_a(&self) -> &str;
    fn label_b(&self) -> &str;
    /// `None` falls back to the default identifier columns.
    fn id_column(&self) -> Option<&str>;
    fn count_column(&self) -> Option<&str>;
    fn normalize_mode(&self) -> NormalizeMode;
    fn color_a(&self) -> &str;
    fn color_b(&self) -> &str;
    fn orientation(&self) -> Orientation;
    fn output_path(&self) -> &str;
    fn summary_path(&self) -> Option<&str>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<HabitatCounts>;
    async fn transform(&self, counts: HabitatCounts) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
