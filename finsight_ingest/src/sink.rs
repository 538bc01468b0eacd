//! Document sinks.

use async_trait::async_trait;
use finsight_core::DocumentSink;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// One written document, as stored by the sinks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SinkEntry {
    pub index: String,
    pub id: String,
    pub document: serde_json::Value,
}

/// Appends every document as one JSON line to a file.
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlSink {
    /// Create (or truncate) the output file, creating parent directories.
    pub async fn create(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = File::create(path).await?;
        info!("Writing documents to {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentSink for JsonlSink {
    async fn write(&self, index: &str, id: &str, body: &serde_json::Value) -> anyhow::Result<()> {
        let entry = SinkEntry {
            index: index.to_string(),
            id: id.to_string(),
            document: body.clone(),
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        self.file.lock().await.write_all(line.as_bytes()).await?;
        debug!("Document {id} written to index {index}");
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let mut file = self.file.lock().await;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }
}

/// Keeps written documents in memory.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<SinkEntry>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far, in write order.
    pub async fn entries(&self) -> Vec<SinkEntry> {
        self.entries.lock().await.clone()
    }

    /// Entries written to `index`.
    pub async fn entries_in(&self, index: &str) -> Vec<SinkEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|e| e.index == index)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn write(&self, index: &str, id: &str, body: &serde_json::Value) -> anyhow::Result<()> {
        let mut entries = self.entries.lock().await;
        let entry = SinkEntry {
            index: index.to_string(),
            id: id.to_string(),
            document: body.clone(),
        };
        // Same index and id overwrite, as an index would.
        match entries.iter_mut().find(|e| e.index == index && e.id == id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn test_jsonl_sink_writes_one_line_per_document() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = dir.path().join("out").join("docs.jsonl");
        let sink = JsonlSink::create(&path).await.expect("sink should be created");

        sink.write("company_data", "a", &json!({"company_id": 1}))
            .await
            .expect("write should succeed");
        sink.write("metrics_data", "b", &json!({"metric_name": "revenue"}))
            .await
            .expect("write should succeed");
        sink.flush().await.expect("flush should succeed");

        let content = std::fs::read_to_string(&path).expect("output should be readable");
        let entries: Vec<SinkEntry> = content
            .lines()
            .map(|l| serde_json::from_str(l).expect("each line should be a JSON entry"))
            .collect();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].index, "company_data");
        assert_eq!(entries[1].document["metric_name"], "revenue");
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn test_memory_sink_overwrites_same_id() {
        let sink = MemorySink::new();
        sink.write("idx", "a", &json!({"v": 1})).await.expect("write should succeed");
        sink.write("idx", "a", &json!({"v": 2})).await.expect("write should succeed");
        sink.write("other", "a", &json!({"v": 3})).await.expect("write should succeed");

        let entries = sink.entries_in("idx").await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].document["v"], 2);
        assert_eq!(sink.entries().await.len(), 2);
    }
}
