//! 庫存總覽

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wms_core::{Catalog, Lot, PartKey, StockLevel, Thresholds};

/// 單一零件的庫存彙總
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRow {
    pub part: PartKey,
    pub sku: String,
    pub name: String,
    pub lot_count: usize,
    pub quantity: u64,
    /// 庫存金額（數量 × 批次單價）
    pub value: Decimal,
    pub level: StockLevel,
}

/// 庫存總覽（依零件鍵排序）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummary {
    pub rows: Vec<StockRow>,
}

impl StockSummary {
    /// 彙總目錄中每個零件的庫存
    ///
    /// 目錄內沒有批次的零件也列出（數量 0）；批次引用但目錄已無的零件同樣列出。
    pub fn build(lots: &[Lot], catalog: &Catalog, thresholds: &Thresholds) -> Self {
        let mut totals: BTreeMap<PartKey, (usize, u64, Decimal)> = catalog
            .parts()
            .map(|part| (part.key.clone(), (0, 0, Decimal::ZERO)))
            .collect();

        for lot in lots {
            let entry = totals.entry(lot.part.clone()).or_default();
            entry.0 += 1;
            entry.1 = entry.1.saturating_add(lot.quantity);
            entry.2 = entry.2.saturating_add(lot.value());
        }

        let rows = totals
            .into_iter()
            .map(|(part, (lot_count, quantity, value))| {
                let (sku, name) = match catalog.part(&part) {
                    Some(p) => (p.sku.clone(), p.name.clone()),
                    None => lots
                        .iter()
                        .find(|lot| lot.part == part)
                        .map(|lot| (lot.sku.clone(), lot.name.clone()))
                        .unwrap_or_else(|| (part.to_string(), String::new())),
                };
                StockRow {
                    level: thresholds.classify(quantity),
                    part,
                    sku,
                    name,
                    lot_count,
                    quantity,
                    value,
                }
            })
            .collect();

        Self { rows }
    }

    pub fn row(&self, part: &PartKey) -> Option<&StockRow> {
        self.rows.iter().find(|row| &row.part == part)
    }

    /// 某等級的零件數
    pub fn count(&self, level: StockLevel) -> usize {
        self.rows.iter().filter(|row| row.level == level).count()
    }

    /// 全部庫存金額
    pub fn total_value(&self) -> Decimal {
        self.rows
            .iter()
            .map(|row| row.value)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;
    use wms_core::{LotId, Part};

    fn lot(id: u64, sku: &str, quantity: u64, price: i64) -> Lot {
        Lot::new(
            LotId(id),
            &Part::new(sku, sku),
            quantity,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
        .with_unit_price(Decimal::from(price))
    }

    #[test]
    fn test_summary_totals() {
        let catalog = Catalog::new()
            .with_part("A", "Alfa")
            .with_part("B", "Beta")
            .with_part("C", "Gamma");
        let lots = vec![lot(1, "A", 80, 2), lot(2, "A", 70, 1), lot(3, "B", 60, 1)];

        let summary = StockSummary::build(&lots, &catalog, &Thresholds::default());

        let a = summary.row(&PartKey::new("A")).unwrap();
        assert_eq!((a.lot_count, a.quantity, a.level), (2, 150, StockLevel::Ok));
        assert_eq!(a.value, Decimal::from(230));
        assert_eq!(a.name, "Alfa");

        assert_eq!(summary.row(&PartKey::new("B")).unwrap().level, StockLevel::Low);
        assert_eq!(summary.row(&PartKey::new("C")).unwrap().level, StockLevel::Critical);
        assert_eq!(summary.count(StockLevel::Critical), 1);
        assert_eq!(summary.total_value(), Decimal::from(290));
    }

    #[test]
    fn test_orphan_lot_is_listed() {
        let lots = vec![lot(1, "Z", 5, 0)];
        let summary = StockSummary::build(&lots, &Catalog::new(), &Thresholds::default());

        assert_eq!(summary.rows.len(), 1);
        assert_eq!(summary.rows[0].sku, "Z");
    }

    #[rstest]
    #[case(101, StockLevel::Ok)]
    #[case(100, StockLevel::Low)]
    #[case(51, StockLevel::Low)]
    #[case(50, StockLevel::Critical)]
    #[case(0, StockLevel::Critical)]
    fn test_level_boundaries(#[case] quantity: u64, #[case] expected: StockLevel) {
        let catalog = Catalog::new().with_part("A", "Alfa");
        let lots = vec![lot(1, "A", quantity, 0)];

        let summary = StockSummary::build(&lots, &catalog, &Thresholds::default());
        assert_eq!(summary.rows[0].level, expected);
    }
}
