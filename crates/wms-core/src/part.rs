//! 零件模型

use serde::{Deserialize, Serialize};
use std::fmt;

/// 零件識別鍵（去除前後空白並轉小寫）
///
/// 所有以零件為鍵的映射都使用此類型，避免大小寫不一致造成的查找錯誤。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartKey(String);

impl PartKey {
    /// 由任意輸入正規化出零件鍵
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// 零件主檔
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// 識別鍵
    pub key: PartKey,

    /// 顯示用編號（保留原始大小寫）
    pub sku: String,

    /// 零件名稱
    pub name: String,
}

impl Part {
    /// 創建新的零件
    pub fn new(sku: &str, name: &str) -> Self {
        Self {
            key: PartKey::new(sku),
            sku: sku.trim().to_string(),
            name: name.trim().to_string(),
        }
    }
}
