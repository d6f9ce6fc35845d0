//! 倉庫狀態快照

use serde::{Deserialize, Serialize};
use wms_core::{
    AuditRecord, Catalog, EngineConfig, Lot, MachineStock, PendingDelivery, ProductionPlanItem,
    SequentialIds,
};

/// 可持久化的完整倉庫狀態
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub lots: Vec<Lot>,
    pub catalog: Catalog,
    pub machine_stock: Vec<MachineStock>,
    pub pending_delivery: PendingDelivery,
    pub plan: Vec<ProductionPlanItem>,

    /// 稽核紀錄（最新在前）
    pub history: Vec<AuditRecord>,

    pub config: EngineConfig,

    /// 下一個可分配的 ID
    pub next_id: u64,
}

impl Snapshot {
    /// 快照中已使用的最大 ID
    pub fn max_id(&self) -> u64 {
        let lot_ids = self.lots.iter().map(|lot| lot.id.0);
        let record_ids = self.history.iter().map(|record| record.id);
        lot_ids.chain(record_ids).max().unwrap_or(0)
    }

    /// 重建 ID 分配器，保證不會與既有 ID 重複
    pub fn id_allocator(&self) -> SequentialIds {
        let mut ids = SequentialIds::starting_at(self.next_id);
        ids.observe(self.max_id());
        ids
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            lots: Vec::new(),
            catalog: Catalog::default(),
            machine_stock: Vec::new(),
            pending_delivery: PendingDelivery::default(),
            plan: Vec::new(),
            history: Vec::new(),
            config: EngineConfig::default(),
            next_id: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use wms_core::{AuditPayload, DeliveryPayload, IdAllocator, LotId, Part};

    #[test]
    fn test_id_allocator_skips_used_ids() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut snapshot = Snapshot::default();
        snapshot
            .lots
            .push(Lot::new(LotId(7), &Part::new("X", "x"), 1, date));
        snapshot.history.push(AuditRecord {
            id: 12,
            timestamp: Utc::now(),
            kind: wms_core::AuditKind::Delivery,
            payload: AuditPayload::Delivery(DeliveryPayload {
                supplier: "-".to_string(),
                date,
                lines: Vec::new(),
            }),
        });

        assert_eq!(snapshot.max_id(), 12);
        assert_eq!(snapshot.id_allocator().next_id(), 13);

        snapshot.next_id = 40;
        assert_eq!(snapshot.id_allocator().next_id(), 40);
    }
}
