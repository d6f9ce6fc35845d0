//! 稽核紀錄

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use wms_core::{AuditPayload, AuditRecord, IdAllocator};

/// 有上限的稽核紀錄，最新的在最前面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLog {
    records: VecDeque<AuditRecord>,
    capacity: usize,
}

impl AuditLog {
    /// 預設保留筆數
    pub const DEFAULT_CAPACITY: usize = 200;

    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// 從既有紀錄還原（最新在前），超出上限的舊紀錄會被捨棄
    pub fn from_records(records: Vec<AuditRecord>, capacity: usize) -> Self {
        let mut log = Self::new(capacity);
        log.records = records.into();
        log.records.truncate(log.capacity);
        log
    }

    /// 新增紀錄並回傳；超出上限時丟棄最舊的紀錄
    pub fn append(
        &mut self,
        payload: AuditPayload,
        ids: &mut impl IdAllocator,
        timestamp: DateTime<Utc>,
    ) -> &AuditRecord {
        let record = AuditRecord {
            id: ids.next_id(),
            timestamp,
            kind: payload.kind(),
            payload,
        };
        tracing::debug!("新增稽核紀錄 {}（{:?}）", record.id, record.kind);

        self.records.push_front(record);
        if self.records.len() > self.capacity {
            self.records.truncate(self.capacity);
            tracing::debug!("稽核紀錄已達上限 {}，捨棄最舊紀錄", self.capacity);
        }
        &self.records[0]
    }

    /// 最新在前
    pub fn iter(&self) -> impl Iterator<Item = &AuditRecord> {
        self.records.iter()
    }

    pub fn latest(&self) -> Option<&AuditRecord> {
        self.records.front()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 複製出所有紀錄（最新在前）
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.iter().cloned().collect()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
