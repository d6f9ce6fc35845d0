//! # WMS Store
//!
//! 倉庫狀態快照的持久化：快照模型、還原時的資料檢查、記憶體與 JSON 檔案儲存

pub mod file;
pub mod memory;
pub mod parse;
pub mod snapshot;

// Re-export 主要類型
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use parse::restore;
pub use snapshot::Snapshot;

/// 儲存錯誤
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("快照讀寫失敗: {0}")]
    Io(#[from] std::io::Error),

    #[error("快照序列化失敗: {0}")]
    Json(#[from] serde_json::Error),
}

/// 還原時單筆資料的格式錯誤
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("{0} 不是物件")]
    NotAnObject(&'static str),

    #[error("缺少欄位 {0}")]
    MissingField(&'static str),

    #[error("欄位 {0} 不可為空")]
    EmptyText(&'static str),

    #[error("欄位 {field} 必須是非負整數: {value}")]
    InvalidInteger { field: &'static str, value: String },

    #[error("欄位 {field} 不是有效的金額: {value}")]
    InvalidDecimal { field: &'static str, value: String },

    #[error("欄位 {field} 不是有效的日期: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("稽核紀錄格式錯誤: {0}")]
    InvalidRecord(String),
}

/// 快照儲存介面
pub trait SnapshotStore {
    /// 讀取快照；尚未儲存過時回傳 `None`
    fn load(&self) -> Result<Option<Snapshot>, StoreError>;

    /// 寫入快照（覆蓋既有內容）
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}
