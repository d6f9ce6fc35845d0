//! 倉庫示範：登錄供應商報價、收貨兩批零件後以 FIFO 生產，再以手動分配生產
//!
//! 執行：`cargo run --example warehouse_demo -- [快照檔案路徑]`

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use wms::{
    AllocationMode, AuditPayload, DeliveryLine, EngineConfig, JsonFileStore, MachineDefinition,
    PartKey, Warehouse,
};

fn main() -> Result<()> {
    wms::logging::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "warehouse_demo.json".to_string());
    let warehouse = Warehouse::open(JsonFileStore::new(&path), EngineConfig::default())
        .with_context(|| format!("無法開啟快照 {path}"))?;
    let today = Utc::now().date_naive();

    let suppliers = ["Stal-Pol", "Metal-Bud"];
    for supplier in suppliers {
        if warehouse.catalog().supplier(supplier).is_none() {
            warehouse.add_supplier(supplier)?.into_value();
        }
    }
    warehouse
        .upsert_part_for_suppliers("FRAME-01", "Rama stalowa", &suppliers)?
        .into_value();
    warehouse
        .upsert_part_for_suppliers("BOLT-M8", "Śruba M8", &suppliers)?
        .into_value();
    warehouse
        .update_supplier_price("Stal-Pol", "FRAME-01", Decimal::from(120))?
        .into_value();
    warehouse
        .update_supplier_price("Metal-Bud", "FRAME-01", Decimal::from(135))?
        .into_value();
    warehouse
        .upsert_machine(
            MachineDefinition::new("TK-100", "Tokarka")
                .with_bom_line("FRAME-01", 1)
                .with_bom_line("BOLT-M8", 8),
        )?
        .into_value();

    for (supplier, frames, bolts) in [("Stal-Pol", 2, 10), ("Metal-Bud", 3, 20)] {
        warehouse.set_delivery_supplier(Some(supplier))?.into_value();
        warehouse.set_delivery_date(today)?.into_value();
        let price = warehouse.quoted_price(supplier, "FRAME-01");
        warehouse
            .add_to_delivery(DeliveryLine::new("FRAME-01", frames, price))?
            .into_value();
        warehouse
            .add_to_delivery(DeliveryLine::new("BOLT-M8", bolts, Decimal::new(35, 2)))?
            .into_value();
        let committed = warehouse.receive_delivery()?;
        if let Some(e) = &committed.persistence_error {
            eprintln!("警告：收貨已入帳但未能寫入快照：{e}");
        }
    }

    warehouse.add_to_plan("TK-100", 2)?.into_value();
    let preview = warehouse.preview()?;
    println!("需求：");
    for (part, quantity) in &preview.requirements {
        println!("  {part}: {quantity}");
    }
    if !preview.is_feasible() {
        bail!("缺料：{:?}", preview.shortages);
    }

    let record = warehouse
        .finalize_production(today, &AllocationMode::Fifo)?
        .into_value();
    if let AuditPayload::Production(payload) = &record.payload {
        for machine in &payload.machines {
            println!(
                "生產 {} × {}，單台成本 {}",
                machine.name,
                machine.quantity,
                machine.unit_cost()
            );
            for part in &machine.parts {
                for lot in &part.lots {
                    println!(
                        "  {} 取自批次 {}（{}）{} 件",
                        part.sku, lot.lot_id, lot.supplier, lot.quantity
                    );
                }
            }
        }
    }

    // 手動指定由最新的批次出貨
    warehouse.add_to_plan("TK-100", 1)?.into_value();
    let lots = warehouse.lots();
    let requirements = warehouse.preview()?.requirements;
    let mut manual = std::collections::BTreeMap::new();
    for part in ["frame-01", "bolt-m8"] {
        let required = requirements.get(&PartKey::new(part)).copied().unwrap_or(0);
        let Some(lot) = lots.iter().rev().find(|lot| lot.part.as_str() == part) else {
            bail!("找不到 {part} 的批次");
        };
        manual.insert(lot.id, required);
    }
    warehouse
        .finalize_production(today, &AllocationMode::Manual(manual))?
        .into_value();

    println!("庫存：");
    for row in warehouse.stock_summary().rows {
        println!(
            "  {:<10} {:>5} 件  {:>3} 批  {:?}",
            row.sku, row.quantity, row.lot_count, row.level
        );
    }
    for stock in warehouse.machine_stock() {
        println!("成品 {} {}：{}", stock.code, stock.name, stock.quantity);
    }

    Ok(())
}
