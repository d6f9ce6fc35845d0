//! 還原邊界：從未受信任的 JSON 重建狀態
//!
//! 每一筆資料個別檢查，格式錯誤的資料略過並記錄警告，不影響其他資料。

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::str::FromStr;
use wms_core::{
    AuditRecord, BomLine, Catalog, DeliveryLine, EngineConfig, Lot, LotId, MachineDefinition,
    MachineStock, Part, PartKey, PendingDelivery, ProductionPlanItem, Supplier,
    ANONYMOUS_SUPPLIER,
};

use crate::snapshot::Snapshot;
use crate::ParseError;

type Object = Map<String, Value>;

fn object<'a>(value: &'a Value, what: &'static str) -> Result<&'a Object, ParseError> {
    value.as_object().ok_or(ParseError::NotAnObject(what))
}

fn text(obj: &Object, field: &'static str) -> Result<String, ParseError> {
    optional_text(obj, field).ok_or(ParseError::EmptyText(field))
}

fn optional_text(obj: &Object, field: &'static str) -> Option<String> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn integer(obj: &Object, field: &'static str) -> Result<u64, ParseError> {
    let value = obj.get(field).ok_or(ParseError::MissingField(field))?;
    value.as_u64().ok_or_else(|| ParseError::InvalidInteger {
        field,
        value: value.to_string(),
    })
}

fn positive_integer(obj: &Object, field: &'static str) -> Result<u64, ParseError> {
    match integer(obj, field)? {
        0 => Err(ParseError::InvalidInteger {
            field,
            value: "0".to_string(),
        }),
        n => Ok(n),
    }
}

/// 金額接受字串或數字；缺少時為 0，負值視為 0
fn decimal(obj: &Object, field: &'static str) -> Result<Decimal, ParseError> {
    decimal_value(obj.get(field)).ok_or_else(|| ParseError::InvalidDecimal {
        field,
        value: obj.get(field).map(Value::to_string).unwrap_or_default(),
    })
}

fn decimal_value(value: Option<&Value>) -> Option<Decimal> {
    let parsed = match value {
        None | Some(Value::Null) => Some(Decimal::ZERO),
        Some(Value::String(raw)) => Decimal::from_str(raw.trim()).ok(),
        Some(Value::Number(n)) => {
            let raw = n.to_string();
            Decimal::from_str(&raw)
                .or_else(|_| Decimal::from_scientific(&raw))
                .ok()
        }
        Some(_) => None,
    };
    parsed.map(|d| d.max(Decimal::ZERO))
}

fn date(obj: &Object, field: &'static str) -> Result<NaiveDate, ParseError> {
    let raw = obj
        .get(field)
        .and_then(Value::as_str)
        .ok_or(ParseError::MissingField(field))?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ParseError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}

/// 解析批次
pub fn parse_lot(value: &Value) -> Result<Lot, ParseError> {
    let obj = object(value, "lot")?;
    let sku = text(obj, "sku")?;
    let part = optional_text(obj, "part").unwrap_or_else(|| sku.clone());

    Ok(Lot {
        id: LotId(integer(obj, "id")?),
        part: PartKey::new(&part),
        name: text(obj, "name")?,
        supplier: optional_text(obj, "supplier").unwrap_or_else(|| ANONYMOUS_SUPPLIER.to_string()),
        unit_price: decimal(obj, "unit_price")?,
        quantity: integer(obj, "quantity")?,
        date_received: date(obj, "date_received")?,
        sku,
    })
}

/// 解析零件主檔
pub fn parse_part(value: &Value) -> Result<Part, ParseError> {
    let obj = object(value, "part")?;
    Ok(Part::new(&text(obj, "sku")?, &text(obj, "name")?))
}

/// 解析供應商；無效的報價略過
///
/// 報價接受映射（零件鍵 → 價格）或 `[零件, 價格]` 陣列。
pub fn parse_supplier(value: &Value) -> Result<Supplier, ParseError> {
    let obj = object(value, "supplier")?;
    let mut supplier = Supplier::new(&text(obj, "name")?);

    let entries: Vec<(&str, Option<&Value>)> = match obj.get("prices") {
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.as_str(), Some(v))).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_array)
            .filter(|pair| pair.len() >= 2)
            .filter_map(|pair| Some((pair[0].as_str()?, pair.get(1))))
            .collect(),
        _ => Vec::new(),
    };
    for (part, price) in entries {
        let key = PartKey::new(part);
        match decimal_value(price).filter(|_| !key.is_empty()) {
            Some(price) => {
                supplier.prices.insert(key, price);
            }
            None => tracing::warn!("略過供應商 {} 的無效報價：{}", supplier.name, part),
        }
    }
    Ok(supplier)
}

/// 解析機台定義；無效的 BOM 明細略過
pub fn parse_machine(value: &Value) -> Result<MachineDefinition, ParseError> {
    let obj = object(value, "machine")?;
    let mut machine = MachineDefinition::new(&text(obj, "code")?, &text(obj, "name")?);
    machine.bom = collect(obj, "bom", |line| {
        let line = object(line, "bom line")?;
        Ok(BomLine::new(
            &text(line, "part")?,
            positive_integer(line, "quantity_per_unit")?,
        ))
    });
    Ok(machine)
}

/// 解析成品庫存
pub fn parse_machine_stock(value: &Value) -> Result<MachineStock, ParseError> {
    let obj = object(value, "machine stock")?;
    let code = text(obj, "code")?;
    Ok(MachineStock {
        name: optional_text(obj, "name").unwrap_or_else(|| code.clone()),
        quantity: integer(obj, "quantity")?,
        code,
    })
}

/// 解析生產計劃明細
pub fn parse_plan_item(value: &Value) -> Result<ProductionPlanItem, ParseError> {
    let obj = object(value, "plan item")?;
    Ok(ProductionPlanItem::new(
        &text(obj, "machine_code")?,
        positive_integer(obj, "quantity")?,
    ))
}

/// 解析進行中的交貨單；無效的日期視為未指定
pub fn parse_pending_delivery(value: &Value) -> Result<PendingDelivery, ParseError> {
    let obj = object(value, "pending delivery")?;
    Ok(PendingDelivery {
        supplier: optional_text(obj, "supplier"),
        date: date(obj, "date").ok(),
        lines: collect(obj, "lines", |line| {
            let line = object(line, "delivery line")?;
            Ok(DeliveryLine::new(
                &text(line, "part")?,
                positive_integer(line, "quantity")?,
                decimal(line, "unit_price")?,
            ))
        }),
    })
}

/// 解析稽核紀錄
pub fn parse_record(value: &Value) -> Result<AuditRecord, ParseError> {
    serde_json::from_value(value.clone()).map_err(|e| ParseError::InvalidRecord(e.to_string()))
}

/// 逐筆解析陣列欄位，略過無效資料
fn collect<T>(
    obj: &Object,
    field: &'static str,
    parse: impl Fn(&Value) -> Result<T, ParseError>,
) -> Vec<T> {
    let Some(items) = obj.get(field).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match parse(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("略過無效的 {}[{}]：{}", field, index, e);
                None
            }
        })
        .collect()
}

fn restore_catalog(value: Option<&Value>) -> Catalog {
    let Some(obj) = value.and_then(Value::as_object) else {
        return Catalog::new();
    };

    // 零件可能以映射（依零件鍵）或陣列儲存
    let parts: Vec<Part> = match obj.get("parts") {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(key, part)| match parse_part(part) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::warn!("略過無效的零件 {}：{}", key, e);
                    None
                }
            })
            .collect(),
        _ => collect(obj, "parts", parse_part),
    };

    let mut catalog = parts
        .into_iter()
        .fold(Catalog::new(), |catalog, part| catalog.with_part(&part.sku, &part.name));
    let suppliers: Vec<Supplier> = match obj.get("suppliers") {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(key, supplier)| match parse_supplier(supplier) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::warn!("略過無效的供應商 {}：{}", key, e);
                    None
                }
            })
            .collect(),
        _ => collect(obj, "suppliers", parse_supplier),
    };
    for supplier in suppliers {
        catalog = catalog.with_supplier(supplier);
    }
    for machine in collect(obj, "machines", parse_machine) {
        catalog = catalog.with_machine(machine);
    }
    catalog
}

fn restore_config(value: Option<&Value>) -> EngineConfig {
    let Some(value) = value else {
        return EngineConfig::default();
    };
    EngineConfig::from_json_str(&value.to_string()).unwrap_or_else(|e| {
        tracing::warn!("配置無效，使用預設值：{}", e);
        EngineConfig::default()
    })
}

/// 從 JSON 還原快照
///
/// 不是物件的輸入得到空快照；重複的批次ID只保留第一筆；
/// `next_id` 會調整到大於所有既有 ID。
pub fn restore(value: &Value) -> Snapshot {
    let Some(root) = value.as_object() else {
        tracing::warn!("快照不是 JSON 物件，以空狀態開始");
        return Snapshot::default();
    };

    let mut seen = HashSet::new();
    let lots: Vec<Lot> = collect(root, "lots", parse_lot)
        .into_iter()
        .filter(|lot| {
            let fresh = seen.insert(lot.id);
            if !fresh {
                tracing::warn!("略過重複的批次 {}", lot.id);
            }
            fresh
        })
        .collect();

    let pending_delivery = match root.get("pending_delivery") {
        Some(value) => parse_pending_delivery(value).unwrap_or_else(|e| {
            tracing::warn!("交貨單無效，已清空：{}", e);
            PendingDelivery::default()
        }),
        None => PendingDelivery::default(),
    };

    let mut snapshot = Snapshot {
        lots,
        catalog: restore_catalog(root.get("catalog")),
        machine_stock: collect(root, "machine_stock", parse_machine_stock),
        pending_delivery,
        plan: collect(root, "plan", parse_plan_item),
        history: collect(root, "history", parse_record),
        config: restore_config(root.get("config")),
        next_id: root.get("next_id").and_then(Value::as_u64).unwrap_or(1),
    };
    snapshot.next_id = snapshot.id_allocator().peek();

    tracing::debug!(
        "快照還原完成：批次 {} 個，稽核紀錄 {} 筆",
        snapshot.lots.len(),
        snapshot.history.len()
    );
    snapshot
}
