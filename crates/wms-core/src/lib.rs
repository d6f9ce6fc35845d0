//! # WMS Core
//!
//! 倉庫核心資料模型與類型定義：零件、批次、機台 BOM、生產計劃、稽核紀錄

pub mod audit;
pub mod catalog;
pub mod config;
pub mod delivery;
pub mod ids;
pub mod lot;
pub mod machine;
pub mod part;
pub mod plan;
pub mod supplier;

// Re-export 主要類型
pub use audit::{
    AuditKind, AuditPayload, AuditRecord, DeliveryPayload, LotTrace, MachineTrace,
    PartTrace, ProductionPayload, ReceivedLine,
};
pub use catalog::Catalog;
pub use config::{DateWindow, EngineConfig, StockLevel, Thresholds};
pub use delivery::{DeliveryLine, PendingDelivery};
pub use ids::{IdAllocator, SequentialIds};
pub use lot::{total_on_hand, Lot, LotId};
pub use machine::{BomLine, MachineDefinition, MachineStock};
pub use part::{Part, PartKey};
pub use plan::{ProductionPlanItem, RequirementMap, Shortage};
pub use supplier::{Supplier, ANONYMOUS_SUPPLIER};

// 金額類型
pub use rust_decimal::Decimal;

/// 倉庫錯誤類型
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WmsError {
    #[error("找不到零件: {0}")]
    PartNotFound(String),

    #[error("零件 {part} 仍被使用中: {reason}")]
    PartInUse { part: String, reason: String },

    #[error("無效的零件編號: {0}")]
    InvalidSku(String),

    #[error("無效的名稱: {0}")]
    InvalidName(String),

    #[error("找不到供應商: {0}")]
    SupplierNotFound(String),

    #[error("供應商已存在: {0}")]
    DuplicateSupplier(String),

    #[error("供應商 {supplier} 仍有 {lots} 個庫存批次")]
    SupplierInUse { supplier: String, lots: usize },

    #[error("找不到機台: {0}")]
    MachineNotFound(String),

    #[error("機台 {0} 沒有 BOM，無法生產")]
    EmptyBom(String),

    #[error("交貨單沒有任何明細")]
    EmptyDelivery,

    #[error("無效的數量: {0}")]
    InvalidQuantity(String),

    #[error("無效的日期: {0}")]
    InvalidDate(String),

    #[error("配置錯誤: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, WmsError>;
