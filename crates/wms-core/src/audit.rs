//! 稽核紀錄模型

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lot::LotId;
use crate::part::PartKey;

/// 稽核事件類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditKind {
    /// 收貨
    Delivery,
    /// 生產
    Production,
}

/// 稽核紀錄（建立後不可修改）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: AuditKind,
    pub payload: AuditPayload,
}

/// 稽核內容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditPayload {
    Delivery(DeliveryPayload),
    Production(ProductionPayload),
}

impl AuditPayload {
    pub fn kind(&self) -> AuditKind {
        match self {
            AuditPayload::Delivery(_) => AuditKind::Delivery,
            AuditPayload::Production(_) => AuditKind::Production,
        }
    }
}

/// 收貨內容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPayload {
    pub supplier: String,
    pub date: NaiveDate,
    pub lines: Vec<ReceivedLine>,
}

/// 收貨明細與其落入的批次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedLine {
    pub lot_id: LotId,
    pub sku: String,
    pub name: String,
    pub quantity: u64,
    pub unit_price: Decimal,
}

/// 生產內容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionPayload {
    /// 生產日期
    pub date: NaiveDate,

    /// 每一行計劃的耗用追溯
    pub machines: Vec<MachineTrace>,
}

/// 單一計劃行的耗用追溯
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineTrace {
    pub code: String,
    pub name: String,
    pub quantity: u64,
    pub parts: Vec<PartTrace>,
}

impl MachineTrace {
    /// 此行耗用零件的總成本
    pub fn total_cost(&self) -> Decimal {
        self.parts
            .iter()
            .map(PartTrace::cost)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// 單台成本
    pub fn unit_cost(&self) -> Decimal {
        if self.quantity == 0 {
            return Decimal::ZERO;
        }
        self.total_cost() / Decimal::from(self.quantity)
    }
}

/// 單一零件的耗用追溯
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartTrace {
    pub part: PartKey,
    pub sku: String,
    pub name: String,
    pub quantity: u64,
    pub lots: Vec<LotTrace>,
}

impl PartTrace {
    pub fn cost(&self) -> Decimal {
        self.lots
            .iter()
            .map(LotTrace::cost)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }
}

/// 耗用當下凍結的批次快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotTrace {
    pub lot_id: LotId,
    pub quantity: u64,
    pub sku: String,
    pub name: String,
    pub supplier: String,
    pub date_received: NaiveDate,
    pub unit_price: Decimal,
}

impl LotTrace {
    pub fn cost(&self) -> Decimal {
        self.unit_price
            .checked_mul(Decimal::from(self.quantity))
            .unwrap_or(Decimal::MAX)
    }
}
