//! In-memory store for tests and ephemeral registries.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::traits::ToolStore;
use crate::error::{Result, ToolregError};
use crate::tools::ToolDefinition;

/// Volatile `ToolStore` that keeps the last saved set in memory.
#[derive(Debug, Default)]
pub struct MemoryToolStore {
    tools: Mutex<Vec<ToolDefinition>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryToolStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `tools`.
    pub fn with_tools(tools: Vec<ToolDefinition>) -> Self {
        Self {
            tools: Mutex::new(tools),
            ..Default::default()
        }
    }

    /// Make subsequent `save_all` calls fail.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `save_all` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Snapshot of the stored set.
    pub fn snapshot(&self) -> Result<Vec<ToolDefinition>> {
        let tools = self.tools.lock().map_err(|e| ToolregError::Storage(e.to_string()))?;
        Ok(tools.clone())
    }
}

#[async_trait]
impl ToolStore for MemoryToolStore {
    async fn load_all(&self) -> Result<Vec<ToolDefinition>> {
        self.snapshot()
    }

    async fn save_all(&self, tools: &[ToolDefinition]) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ToolregError::Storage("save rejected".to_string()));
        }
        let mut stored = self.tools.lock().map_err(|e| ToolregError::Storage(e.to_string()))?;
        *stored = tools.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::CommandDefinition;

    fn tool(name: &str) -> ToolDefinition {
        ToolDefinition::new(name, "desc", "1.0.0").with_command(CommandDefinition::new("run", "Run"))
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = MemoryToolStore::new();
        store.save_all(&[tool("a"), tool("b")]).await.unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "a");
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_with_tools() {
        let store = MemoryToolStore::with_tools(vec![tool("seed")]);
        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded[0].name, "seed");
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_fail_saves() {
        let store = MemoryToolStore::new();
        store.fail_saves(true);
        let result = store.save_all(&[tool("a")]).await;
        assert!(matches!(result, Err(ToolregError::Storage(_))));
        assert!(store.snapshot().unwrap().is_empty());

        store.fail_saves(false);
        assert!(store.save_all(&[tool("a")]).await.is_ok());
    }
}
