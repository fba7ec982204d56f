//! JSONL-backed tool store, one definition per line.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::traits::ToolStore;
use crate::error::{Result, ToolregError};
use crate::tools::ToolDefinition;

/// Tool store persisted to a single JSONL file.
#[derive(Debug, Clone)]
pub struct JsonlToolStore {
    path: PathBuf,
}

impl JsonlToolStore {
    /// Create a store at the given file path. The file is created on first save.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ToolStore for JsonlToolStore {
    async fn load_all(&self) -> Result<Vec<ToolDefinition>> {
        if !fs::try_exists(&self.path).await? {
            log::debug!("No tool store at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).await?;
        let mut tools = Vec::new();
        for (lineno, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            // Refuse to load rather than drop the line on the next save
            let tool = serde_json::from_str::<ToolDefinition>(line).map_err(|e| {
                ToolregError::Storage(format!(
                    "Unreadable line {} in {}: {}",
                    lineno + 1,
                    self.path.display(),
                    e
                ))
            })?;
            tools.push(tool);
        }

        log::debug!("Loaded {} tool(s) from {}", tools.len(), self.path.display());
        Ok(tools)
    }

    async fn save_all(&self, tools: &[ToolDefinition]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolregError::Storage(format!("Failed to create {}: {}", parent.display(), e)))?;
        }

        let mut buf = String::new();
        for tool in tools {
            buf.push_str(&serde_json::to_string(tool)?);
            buf.push('\n');
        }

        // Write beside the target and rename so a crash never leaves a torn file
        let temp = self.temp_path();
        if let Err(e) = replace_file(&temp, &self.path, buf.as_bytes()).await {
            if let Err(cleanup) = fs::remove_file(&temp).await {
                log::debug!("Could not remove {}: {}", temp.display(), cleanup);
            }
            return Err(ToolregError::Storage(format!("Failed to write {}: {}", self.path.display(), e)));
        }

        log::debug!("Saved {} tool(s) to {}", tools.len(), self.path.display());
        Ok(())
    }
}

async fn replace_file(temp: &Path, target: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(temp).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(temp, target).await
}
