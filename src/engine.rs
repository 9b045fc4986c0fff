use crate::types::Label;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Engine {
    async fn predict(&self, text: String) -> Result<Label>;
}
