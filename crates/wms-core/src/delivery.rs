//! 交貨單模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::part::PartKey;

/// 交貨明細
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryLine {
    /// 零件鍵
    pub part: PartKey,

    /// 交貨數量
    pub quantity: u64,

    /// 單價
    pub unit_price: Decimal,
}

impl DeliveryLine {
    pub fn new(part: &str, quantity: u64, unit_price: Decimal) -> Self {
        Self {
            part: PartKey::new(part),
            quantity,
            unit_price: unit_price.max(Decimal::ZERO),
        }
    }
}

/// 進行中的交貨單
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDelivery {
    /// 供應商
    pub supplier: Option<String>,

    /// 交貨日期
    pub date: Option<NaiveDate>,

    /// 明細
    pub lines: Vec<DeliveryLine>,
}

impl PendingDelivery {
    /// 創建空的交貨單
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置供應商
    pub fn with_supplier(mut self, supplier: &str) -> Self {
        self.supplier = Some(supplier.trim().to_string());
        self
    }

    /// 建構器模式：設置交貨日期
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// 建構器模式：添加明細
    pub fn with_line(mut self, line: DeliveryLine) -> Self {
        self.lines.push(line);
        self
    }

    /// 添加明細
    pub fn add_line(&mut self, line: DeliveryLine) {
        self.lines.push(line);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 檢查是否有明細引用某零件
    pub fn references(&self, part: &PartKey) -> bool {
        self.lines.iter().any(|line| &line.part == part)
    }

    /// 清空交貨單
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
