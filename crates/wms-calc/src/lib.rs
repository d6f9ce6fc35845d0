//! # WMS Calculation Engine
//!
//! 庫存分配與耗用引擎：需求彙總、缺料檢查、批次分配（FIFO / 手動）、耗用提交與稽核

pub mod allocation;
pub mod audit;
pub mod availability;
pub mod consumption;
pub mod delivery;
pub mod fifo;
pub mod manual;
pub mod production;
pub mod requirements;
pub mod stock;

// Re-export 主要類型
pub use allocation::{AllocationCalculator, AllocationEntry, AllocationError, AllocationMode};
pub use audit::AuditLog;
pub use availability::AvailabilityChecker;
pub use consumption::{Consumption, ConsumptionCommitter};
pub use delivery::{DeliveryOutcome, DeliveryReceiver};
pub use fifo::FifoAllocator;
pub use manual::ManualAllocator;
pub use production::{ProductionFinalizer, ProductionOutcome};
pub use requirements::RequirementCalculator;
pub use stock::{StockRow, StockSummary};

use wms_core::{PartKey, Shortage};

/// 生產結案錯誤
///
/// 所有錯誤都在異動庫存之前偵測，回傳錯誤時批次集合保持不變。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FinalizeError {
    #[error("生產計劃為空")]
    EmptyPlan,

    #[error("零件 {0} 需求數量超出可表示範圍")]
    QuantityOverflow(PartKey),

    #[error("庫存不足：{} 項零件缺料", .0.len())]
    Shortage(Vec<Shortage>),

    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

impl FinalizeError {
    /// 缺料清單（僅 `Shortage` 有值）
    pub fn shortages(&self) -> &[Shortage] {
        match self {
            FinalizeError::Shortage(list) => list,
            _ => &[],
        }
    }
}
