//! Storage trait definitions.

use async_trait::async_trait;

use crate::error::Result;
use crate::tools::ToolDefinition;

/// Durable store of tool definitions.
///
/// Backing medium and scoping (per user, per workspace) are up to the implementation.
#[async_trait]
pub trait ToolStore: Send + Sync {
    /// Read every stored definition, in stored order.
    async fn load_all(&self) -> Result<Vec<ToolDefinition>>;

    /// Replace the stored set with `tools`, preserving their order.
    async fn save_all(&self, tools: &[ToolDefinition]) -> Result<()>;
}
