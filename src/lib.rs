//! # WMS
//!
//! 批次追蹤倉庫：收貨、生產結案（FIFO / 手動分配）、成品庫存與稽核紀錄
//!
//! 計算邏輯位於 `wms-calc`，本 crate 提供持有狀態的 [`Warehouse`] 服務與日誌初始化。

pub mod logging;
pub mod warehouse;

pub use warehouse::{Committed, Preview, Warehouse, WarehouseError};

pub use wms_calc::{AllocationError, AllocationMode, FinalizeError, StockRow, StockSummary};
pub use wms_core::{
    AuditPayload, AuditRecord, Catalog, Decimal, DeliveryLine, EngineConfig, Lot, LotId,
    MachineDefinition, MachineStock, Part, PartKey, ProductionPlanItem, Shortage, StockLevel,
    Supplier, Thresholds, WmsError, ANONYMOUS_SUPPLIER,
};
pub use wms_store::{JsonFileStore, MemoryStore, Snapshot, SnapshotStore, StoreError};
