//! Row-oriented tabular storage with named partitions.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// A store of partitions, each an ordered list of rows of string cells.
#[async_trait]
pub(crate) trait TabularStore: Send + Sync {
    async fn partition_exists(&self, partition: &str) -> Result<bool>;

    /// Creates an empty partition. Creating an existing one is not an error.
    async fn create_partition(&self, partition: &str) -> Result<()>;

    /// Every row of the partition, restricted to the given column range.
    /// Rows shorter than the range are padded with empty cells.
    async fn read_range(&self, partition: &str, columns: Range<usize>) -> Result<Vec<Vec<String>>>;

    async fn append_row(&self, partition: &str, row: Vec<String>) -> Result<()>;
}

fn project(row: &[String], columns: &Range<usize>) -> Vec<String> {
    columns
        .clone()
        .map(|i| row.get(i).cloned().unwrap_or_default())
        .collect()
}

/// In-process store. Backs dry runs and tests; also counts calls.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    partitions: RwLock<HashMap<String, Vec<Vec<String>>>>,
    reads: AtomicUsize,
    appends: AtomicUsize,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub(crate) fn append_count(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    /// All rows of a partition, header included.
    #[cfg(test)]
    pub(crate) async fn rows(&self, partition: &str) -> Vec<Vec<String>> {
        self.partitions
            .read()
            .await
            .get(partition)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl TabularStore for MemoryStore {
    async fn partition_exists(&self, partition: &str) -> Result<bool> {
        Ok(self.partitions.read().await.contains_key(partition))
    }

    async fn create_partition(&self, partition: &str) -> Result<()> {
        self.partitions
            .write()
            .await
            .entry(partition.to_string())
            .or_default();
        Ok(())
    }

    async fn read_range(&self, partition: &str, columns: Range<usize>) -> Result<Vec<Vec<String>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let partitions = self.partitions.read().await;
        let rows = partitions
            .get(partition)
            .ok_or_else(|| AppError::Store(format!("Partition '{}' does not exist", partition)))?;
        Ok(rows.iter().map(|row| project(row, &columns)).collect())
    }

    async fn append_row(&self, partition: &str, row: Vec<String>) -> Result<()> {
        let mut partitions = self.partitions.write().await;
        let rows = partitions
            .get_mut(partition)
            .ok_or_else(|| AppError::Store(format!("Partition '{}' does not exist", partition)))?;
        rows.push(row);
        self.appends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// One `<partition>.jsonl` file per partition; each line is a JSON array of cells.
#[derive(Debug, Clone)]
pub(crate) struct JsonlStore {
    dir: PathBuf,
}

impl JsonlStore {
    /// Creates the data directory if needed.
    pub(crate) async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        tracing::debug!(target: "store_task", "Using data directory {}", dir.display());
        Ok(Self { dir })
    }

    fn partition_path(&self, partition: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", partition))
    }
}

#[async_trait]
impl TabularStore for JsonlStore {
    async fn partition_exists(&self, partition: &str) -> Result<bool> {
        Ok(fs::try_exists(self.partition_path(partition)).await?)
    }

    async fn create_partition(&self, partition: &str) -> Result<()> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.partition_path(partition))
            .await?;
        tracing::info!(target: "store_task", "Created partition '{}'", partition);
        Ok(())
    }

    async fn read_range(&self, partition: &str, columns: Range<usize>) -> Result<Vec<Vec<String>>> {
        let content = fs::read_to_string(self.partition_path(partition)).await?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| -> Result<Vec<String>> {
                let row: Vec<String> = serde_json::from_str(line)?;
                Ok(project(&row, &columns))
            })
            .collect()
    }

    async fn append_row(&self, partition: &str, row: Vec<String>) -> Result<()> {
        let path = self.partition_path(partition);
        if !fs::try_exists(&path).await? {
            return Err(AppError::Store(format!(
                "Partition '{}' does not exist",
                partition
            )));
        }
        let mut line = serde_json::to_string(&row)?;
        line.push('\n');
        let mut file = OpenOptions::new().append(true).open(&path).await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
