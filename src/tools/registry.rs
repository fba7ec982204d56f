//! Tool registry
//!
//! Owns the set of installed tools. Installs are validated, applied in memory
//! and written through to the injected `ToolStore`; lookups never touch storage.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::{Result, ToolregError};
use crate::storage::ToolStore;

use super::definition::ToolDefinition;
use super::validator::{parse_definition, validate};

/// Registry of installed tools, keyed by name in first-install order
pub struct ToolRegistry {
    tools: RwLock<IndexMap<String, ToolDefinition>>,
    /// What the store currently holds. Held across every mutation so writes are serialized.
    durable: Mutex<Vec<ToolDefinition>>,
    store: Arc<dyn ToolStore>,
    closed: AtomicBool,
}

impl ToolRegistry {
    /// Open a registry, reading every stored definition.
    ///
    /// Stored definitions that no longer pass validation are skipped.
    pub async fn open(store: Arc<dyn ToolStore>) -> Result<Self> {
        let stored = store.load_all().await?;

        let mut tools = IndexMap::new();
        for tool in &stored {
            match revalidate(tool) {
                Ok(tool) => {
                    tools.insert(tool.name.clone(), tool);
                }
                Err(e) => log::warn!("Skipping stored tool '{}': {}", tool.name, e),
            }
        }

        log::info!("Opened tool registry with {} tool(s)", tools.len());
        Ok(Self {
            tools: RwLock::new(tools),
            durable: Mutex::new(stored),
            store,
            closed: AtomicBool::new(false),
        })
    }

    /// Install a serialized definition
    pub async fn install_json(&self, input: &str) -> Result<ToolDefinition> {
        let tool = parse_definition(input)?;
        self.commit(tool).await
    }

    /// Install a raw JSON definition
    pub async fn install_raw(&self, raw: &Value) -> Result<ToolDefinition> {
        let tool = validate(raw)?;
        self.commit(tool).await
    }

    /// Install a typed definition, replacing any tool with the same name
    pub async fn install(&self, tool: ToolDefinition) -> Result<ToolDefinition> {
        let tool = revalidate(&tool)?;
        self.commit(tool).await
    }

    async fn commit(&self, tool: ToolDefinition) -> Result<ToolDefinition> {
        let mut durable = self.durable.lock().await;
        self.ensure_open()?;

        let name = tool.name.clone();
        let previous = self.write().insert(name.clone(), tool.clone());

        let mut next = durable.clone();
        match next.iter_mut().find(|t| t.name == name) {
            Some(slot) => *slot = tool.clone(),
            None => next.push(tool.clone()),
        }

        if let Err(e) = self.store.save_all(&next).await {
            log::warn!("Failed to persist tool '{}', rolling back: {}", name, e);
            let mut tools = self.write();
            match previous {
                Some(previous) => {
                    tools.insert(name, previous);
                }
                None => {
                    tools.shift_remove(&name);
                }
            }
            return Err(e);
        }
        *durable = next;

        if previous.is_some() {
            log::info!("Replaced tool '{}' (version {})", name, tool.version);
        } else {
            log::info!("Installed tool '{}' (version {})", name, tool.version);
        }
        Ok(tool)
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<ToolDefinition> {
        self.read().get(name).cloned()
    }

    /// All tools in insertion order
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.read().values().cloned().collect()
    }

    /// List all tool names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Check if a tool is installed
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Get number of tools
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove a tool from memory. The store is untouched until `persist` is called.
    pub async fn remove(&self, name: &str) -> Option<ToolDefinition> {
        let _durable = self.durable.lock().await;
        let removed = self.write().shift_remove(name);
        if removed.is_some() {
            log::info!("Removed tool '{}'", name);
        }
        removed
    }

    /// Write the current in-memory set through to the store
    pub async fn persist(&self) -> Result<()> {
        let mut durable = self.durable.lock().await;
        self.ensure_open()?;
        let snapshot = self.list();
        self.store.save_all(&snapshot).await?;
        *durable = snapshot;
        Ok(())
    }

    /// Close the registry, waiting for in-flight writes. Later writes are refused.
    pub async fn close(&self) {
        let _durable = self.durable.lock().await;
        if !self.closed.swap(true, Ordering::SeqCst) {
            log::info!("Closed tool registry");
        }
    }

    /// Check if `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(ToolregError::InvalidState("registry is closed".to_string()));
        }
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, ToolDefinition>> {
        self.tools.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<String, ToolDefinition>> {
        self.tools.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

fn revalidate(tool: &ToolDefinition) -> Result<ToolDefinition> {
    let raw = serde_json::to_value(tool)?;
    Ok(validate(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{JsonlToolStore, MemoryToolStore};
    use crate::tools::{CommandDefinition, ParameterDefinition, ParameterType};

    fn tool(name: &str, description: &str) -> ToolDefinition {
        ToolDefinition::new(name, description, "1.0.0").with_command(
            CommandDefinition::new("read", "Read a file")
                .with_parameter(ParameterDefinition::new("path", "File path", ParameterType::String).required()),
        )
    }

    async fn create_test_registry() -> (ToolRegistry, Arc<MemoryToolStore>) {
        let store = Arc::new(MemoryToolStore::new());
        let registry = ToolRegistry::open(store.clone()).await.unwrap();
        (registry, store)
    }

    #[tokio::test]
    async fn test_open_empty() {
        let (registry, _store) = create_test_registry().await;
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(!registry.is_closed());
    }

    #[tokio::test]
    async fn test_open_loads_stored_tools() {
        let store = Arc::new(MemoryToolStore::with_tools(vec![tool("A", "a"), tool("B", "b")]));
        let registry = ToolRegistry::open(store).await.unwrap();
        assert_eq!(registry.names(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_open_skips_invalid_stored_tools() {
        let empty = ToolDefinition::new("Empty", "no commands", "1.0.0");
        let store = Arc::new(MemoryToolStore::with_tools(vec![empty, tool("A", "a")]));
        let registry = ToolRegistry::open(store.clone()).await.unwrap();
        assert_eq!(registry.names(), vec!["A"]);

        // Skipped in memory, but an unrelated install must not drop it from storage
        registry.install(tool("B", "b")).await.unwrap();
        let stored: Vec<_> = store.snapshot().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(stored, vec!["Empty", "A", "B"]);
    }

    #[tokio::test]
    async fn test_open_refuses_unreadable_store() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("tools.jsonl");
        let content = format!(
            "{}\n{{\"name\":\"B\",\"truncated\n",
            serde_json::to_string(&tool("A", "a")).unwrap()
        );
        std::fs::write(&path, &content).unwrap();

        let store = Arc::new(JsonlToolStore::new(&path));
        let err = ToolRegistry::open(store).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Storage);

        // Nothing was rewritten, so the damaged record is still there to repair
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[tokio::test]
    async fn test_install_and_get() {
        let (registry, store) = create_test_registry().await;
        let installed = registry.install(tool("Files", "File ops")).await.unwrap();
        assert_eq!(installed.name, "Files");

        let fetched = registry.get("Files").unwrap();
        assert_eq!(fetched, installed);
        assert!(registry.get("Missing").is_none());
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.snapshot().unwrap(), vec![installed]);
    }

    #[tokio::test]
    async fn test_install_json() {
        let (registry, _store) = create_test_registry().await;
        let json = tool("Files", "File ops").to_json_pretty().unwrap();
        registry.install_json(&json).await.unwrap();
        assert!(registry.contains("Files"));
    }

    #[tokio::test]
    async fn test_install_json_malformed() {
        let (registry, store) = create_test_registry().await;
        let err = registry.install_json("{oops").await.unwrap_err();
        assert!(matches!(err, ToolregError::Parse(_)));
        assert!(registry.is_empty());
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_install_rejects_invalid() {
        let (registry, store) = create_test_registry().await;
        let err = registry
            .install(ToolDefinition::new("Empty", "no commands", "1.0.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolregError::Validation(_)));
        assert!(registry.is_empty());
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_install_raw() {
        let (registry, _store) = create_test_registry().await;
        let raw = serde_json::to_value(tool("Files", "File ops")).unwrap();
        registry.install_raw(&raw).await.unwrap();
        assert!(registry.contains("Files"));
    }

    #[tokio::test]
    async fn test_reinstall_overwrites_by_name() {
        let (registry, store) = create_test_registry().await;
        registry.install(tool("A", "first")).await.unwrap();
        registry.install(tool("B", "other")).await.unwrap();
        registry.install(tool("A", "second")).await.unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("A").unwrap().description, "second");
        // Original position is kept
        assert_eq!(registry.names(), vec!["A", "B"]);

        let stored = store.snapshot().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].description, "second");
    }

    #[tokio::test]
    async fn test_list_order_after_remove() {
        let (registry, _store) = create_test_registry().await;
        for name in ["A", "B", "C"] {
            registry.install(tool(name, name)).await.unwrap();
        }
        let removed = registry.remove("B").await;
        assert_eq!(removed.unwrap().name, "B");

        let names: Vec<_> = registry.list().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_remove_is_in_memory_only() {
        let (registry, store) = create_test_registry().await;
        registry.install(tool("A", "a")).await.unwrap();
        registry.install(tool("B", "b")).await.unwrap();
        registry.remove("A").await;

        assert_eq!(store.save_count(), 2);
        assert_eq!(store.snapshot().unwrap().len(), 2);

        // A later install leaves the removed tool in the store
        registry.install(tool("C", "c")).await.unwrap();
        let stored: Vec<_> = store.snapshot().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(stored, vec!["A", "B", "C"]);
        assert_eq!(registry.names(), vec!["B", "C"]);
    }

    #[tokio::test]
    async fn test_remove_missing() {
        let (registry, _store) = create_test_registry().await;
        assert!(registry.remove("ghost").await.is_none());
    }

    #[tokio::test]
    async fn test_persist_writes_removals() {
        let (registry, store) = create_test_registry().await;
        registry.install(tool("A", "a")).await.unwrap();
        registry.install(tool("B", "b")).await.unwrap();
        registry.remove("A").await;
        registry.persist().await.unwrap();

        let stored: Vec<_> = store.snapshot().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(stored, vec!["B"]);
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back_new_tool() {
        let (registry, store) = create_test_registry().await;
        store.fail_saves(true);

        let err = registry.install(tool("A", "a")).await.unwrap_err();
        assert!(matches!(err, ToolregError::Storage(_)));
        assert!(!registry.contains("A"));
    }

    #[tokio::test]
    async fn test_failed_save_restores_previous_definition() {
        let (registry, store) = create_test_registry().await;
        registry.install(tool("A", "first")).await.unwrap();
        store.fail_saves(true);

        assert!(registry.install(tool("A", "second")).await.is_err());
        assert_eq!(registry.get("A").unwrap().description, "first");
        assert_eq!(store.snapshot().unwrap()[0].description, "first");
    }

    #[tokio::test]
    async fn test_concurrent_installs_same_name() {
        let (registry, store) = create_test_registry().await;
        let registry = Arc::new(registry);

        let mut handles = Vec::new();
        for i in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.install(tool("Shared", &format!("v{}", i))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Memory and store agree on whichever install committed last
        let in_memory = registry.get("Shared").unwrap();
        let stored = store.snapshot().unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(stored, vec![in_memory]);
        assert_eq!(store.save_count(), 8);
    }

    #[tokio::test]
    async fn test_close_refuses_writes() {
        let (registry, _store) = create_test_registry().await;
        registry.install(tool("A", "a")).await.unwrap();
        registry.close().await;

        assert!(registry.is_closed());
        let err = registry.install(tool("B", "b")).await.unwrap_err();
        assert!(matches!(err, ToolregError::InvalidState(_)));
        assert!(registry.persist().await.is_err());
        // Reads still work
        assert!(registry.get("A").is_some());
    }

    #[tokio::test]
    async fn test_isolated_registries() {
        let (first, _a) = create_test_registry().await;
        let (second, _b) = create_test_registry().await;
        first.install(tool("A", "a")).await.unwrap();
        assert!(second.is_empty());
    }
}
