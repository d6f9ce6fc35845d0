//! 生產計劃模型

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::part::PartKey;

/// 零件需求量映射（零件鍵 → 需求數量）
pub type RequirementMap = BTreeMap<PartKey, u64>;

/// 生產計劃明細（待生產籃中的一行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionPlanItem {
    /// 機台代碼
    pub machine_code: String,

    /// 生產數量（至少 1）
    pub quantity: u64,
}

impl ProductionPlanItem {
    /// 創建新的計劃明細
    pub fn new(machine_code: &str, quantity: u64) -> Self {
        Self {
            machine_code: machine_code.trim().to_string(),
            quantity,
        }
    }
}

/// 缺料紀錄
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortage {
    /// 零件鍵
    pub part: PartKey,

    /// 需求數量
    pub required: u64,

    /// 現有數量
    pub available: u64,

    /// 缺口（需求 - 現有）
    pub shortfall: u64,
}

impl Shortage {
    /// 創建缺料紀錄
    pub fn new(part: PartKey, required: u64, available: u64) -> Self {
        Self {
            part,
            required,
            available,
            shortfall: required.saturating_sub(available),
        }
    }
}
