//! 供應商模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::part::PartKey;

/// 未指定供應商時批次上記錄的名稱
pub const ANONYMOUS_SUPPLIER: &str = "-";

/// 供應商與其零件報價
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub name: String,

    /// 各零件的報價（非負）
    #[serde(default)]
    pub prices: BTreeMap<PartKey, Decimal>,
}

impl Supplier {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            prices: BTreeMap::new(),
        }
    }

    /// 建構器模式：設置報價
    pub fn with_price(mut self, part: &str, price: Decimal) -> Self {
        self.prices
            .insert(PartKey::new(part), price.max(Decimal::ZERO));
        self
    }

    pub fn price(&self, part: &PartKey) -> Option<Decimal> {
        self.prices.get(part).copied()
    }

    /// 是否為此零件報過價
    pub fn quotes(&self, part: &PartKey) -> bool {
        self.prices.contains_key(part)
    }
}
