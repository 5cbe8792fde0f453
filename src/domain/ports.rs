use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Extract → transform → load, each phase run to completion before the next.
#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: Send;
    type Transformed: Send;
    type Report: Send;

    fn name(&self) -> &'static str;
    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<Self::Transformed>;
    async fn load(&self, result: Self::Transformed) -> Result<Self::Report>;
}
