//! 批次分配策略

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wms_core::{Lot, LotId, PartKey, RequirementMap};

use crate::fifo::FifoAllocator;
use crate::manual::ManualAllocator;

/// 分配結果：從某批次取用的數量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub lot_id: LotId,
    pub part: PartKey,
    pub quantity_taken: u64,
}

impl AllocationEntry {
    pub fn new(lot_id: LotId, part: PartKey, quantity_taken: u64) -> Self {
        Self {
            lot_id,
            part,
            quantity_taken,
        }
    }
}

/// 分配模式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationMode {
    /// 先進先出：依批次ID由小到大取用
    Fifo,

    /// 手動：呼叫端指定每個批次的取用量，必須剛好滿足需求
    Manual(BTreeMap<LotId, u64>),
}

/// 分配錯誤
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("找不到批次 {0}")]
    LotNotFound(LotId),

    #[error("批次 {lot_id}（{part}）不是此生產計劃需要的零件")]
    UnrequestedAllocation { lot_id: LotId, part: PartKey },

    #[error("批次 {lot_id} 只有 {available} 件，無法取用 {requested} 件")]
    OverAllocation {
        lot_id: LotId,
        requested: u64,
        available: u64,
    },

    #[error("零件 {part} 已選 {requested} 件，需求為 {required} 件")]
    AllocationMismatch {
        part: PartKey,
        requested: u64,
        required: u64,
    },

    #[error("零件 {part} 需求 {required} 件，批次只能提供 {allocated} 件")]
    Insufficient {
        part: PartKey,
        required: u64,
        allocated: u64,
    },
}

/// 分配策略分派
pub struct AllocationCalculator;

impl AllocationCalculator {
    /// 依模式執行分配；任何情況下都不修改傳入的批次
    pub fn allocate(
        mode: &AllocationMode,
        requirements: &RequirementMap,
        lots: &[Lot],
    ) -> Result<Vec<AllocationEntry>, AllocationError> {
        match mode {
            AllocationMode::Fifo => FifoAllocator::allocate(requirements, lots),
            AllocationMode::Manual(requested) => {
                ManualAllocator::allocate(requested, requirements, lots)
            }
        }
    }

    /// 依零件彙總分配量
    pub fn totals_by_part(entries: &[AllocationEntry]) -> RequirementMap {
        let mut totals = RequirementMap::new();
        for entry in entries {
            let total = totals.entry(entry.part.clone()).or_insert(0);
            *total = total.saturating_add(entry.quantity_taken);
        }
        totals
    }
}
