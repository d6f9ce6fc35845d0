//! 批次（Lot）模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::part::{Part, PartKey};
use crate::supplier::ANONYMOUS_SUPPLIER;

/// 批次ID（單調遞增，數值越小代表越早入庫）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotId(pub u64);

impl fmt::Display for LotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 入庫批次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    /// 批次ID
    pub id: LotId,

    /// 零件鍵
    pub part: PartKey,

    /// 入庫時的零件編號
    pub sku: String,

    /// 入庫時的零件名稱
    pub name: String,

    /// 供應商
    pub supplier: String,

    /// 單價（非負）
    pub unit_price: Decimal,

    /// 現有數量
    pub quantity: u64,

    /// 入庫日期
    pub date_received: NaiveDate,
}

impl Lot {
    /// 創建新的批次
    pub fn new(id: LotId, part: &Part, quantity: u64, date_received: NaiveDate) -> Self {
        Self {
            id,
            part: part.key.clone(),
            sku: part.sku.clone(),
            name: part.name.clone(),
            supplier: ANONYMOUS_SUPPLIER.to_string(),
            unit_price: Decimal::ZERO,
            quantity,
            date_received,
        }
    }

    /// 建構器模式：設置供應商
    pub fn with_supplier(mut self, supplier: &str) -> Self {
        self.supplier = supplier.to_string();
        self
    }

    /// 建構器模式：設置單價（負值視為 0）
    pub fn with_unit_price(mut self, unit_price: Decimal) -> Self {
        self.unit_price = unit_price.max(Decimal::ZERO);
        self
    }

    /// 檢查批次是否已耗盡
    pub fn is_depleted(&self) -> bool {
        self.quantity == 0
    }

    /// 批次總價值
    ///
    /// 超出 `Decimal` 範圍時飽和為 `Decimal::MAX`。
    pub fn value(&self) -> Decimal {
        self.unit_price
            .checked_mul(Decimal::from(self.quantity))
            .unwrap_or(Decimal::MAX)
    }
}

/// 計算某零件在所有批次中的現有總量
pub fn total_on_hand(lots: &[Lot], part: &PartKey) -> u64 {
    lots.iter()
        .filter(|lot| &lot.part == part)
        .map(|lot| lot.quantity)
        .fold(0, u64::saturating_add)
}
