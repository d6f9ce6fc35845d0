//! JSON 檔案快照儲存

use std::fs;
use std::path::{Path, PathBuf};

use crate::parse::restore;
use crate::snapshot::Snapshot;
use crate::{SnapshotStore, StoreError};

/// 將快照寫入單一 JSON 檔案
///
/// 先寫入暫存檔再改名，寫入中途失敗不會破壞既有快照。
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        if !self.path.exists() {
            tracing::debug!("快照檔案不存在：{}", self.path.display());
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        Ok(Some(restore(&value)))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let raw = serde_json::to_string_pretty(snapshot)?;
        let temp = self.temp_path();
        fs::write(&temp, raw)?;
        fs::rename(&temp, &self.path)?;

        tracing::debug!("快照已寫入：{}", self.path.display());
        Ok(())
    }
}
