//! 記憶體快照儲存

use std::sync::{Mutex, PoisonError};

use crate::parse::restore;
use crate::snapshot::Snapshot;
use crate::{SnapshotStore, StoreError};

/// 將快照以 JSON 文字保存在記憶體中
///
/// 讀取時走與檔案儲存相同的還原流程。
#[derive(Debug, Default)]
pub struct MemoryStore {
    raw: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以既有的 JSON 文字建立
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    /// 目前保存的 JSON 文字
    pub fn raw(&self) -> Option<String> {
        self.raw.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let guard = self.raw.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_deref() {
            Some(raw) => {
                let value: serde_json::Value = serde_json::from_str(raw)?;
                Ok(Some(restore(&value)))
            }
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let raw = serde_json::to_string(snapshot)?;
        *self.raw.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wms_core::ProductionPlanItem;

    #[test]
    fn test_empty_store_loads_none() {
        assert!(MemoryStore::new().load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        let mut snapshot = Snapshot::default();
        snapshot.plan.push(ProductionPlanItem::new("M1", 3));

        store.save(&snapshot).unwrap();

        assert_eq!(store.load().unwrap(), Some(snapshot));
    }

    #[test]
    fn test_corrupt_json_is_an_error() {
        let store = MemoryStore::from_raw("{ not json");

        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }
}
