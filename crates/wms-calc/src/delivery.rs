//! 收貨入庫

use rust_decimal::Decimal;
use wms_core::{
    Catalog, DeliveryPayload, IdAllocator, Lot, LotId, PartKey, PendingDelivery, ReceivedLine,
    Result, WmsError, ANONYMOUS_SUPPLIER,
};

/// 收貨結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// 含新批次的批次集合
    pub lots: Vec<Lot>,

    /// 稽核內容
    pub payload: DeliveryPayload,
}

/// 收貨入庫
pub struct DeliveryReceiver;

impl DeliveryReceiver {
    /// 將交貨單轉為新批次
    ///
    /// 同一張交貨單內零件與單價都相同的明細合併為一個批次；
    /// 不會併入既有批次。所有明細都驗證通過後才分配批次ID。
    /// 供應商必須已登錄於目錄；未指定時批次記為 `-`。
    pub fn receive(
        delivery: &PendingDelivery,
        lots: &[Lot],
        catalog: &Catalog,
        ids: &mut impl IdAllocator,
    ) -> Result<DeliveryOutcome> {
        if delivery.is_empty() {
            return Err(WmsError::EmptyDelivery);
        }
        let date = delivery
            .date
            .ok_or_else(|| WmsError::InvalidDate("交貨單未指定日期".to_string()))?;
        catalog.check_supplier(delivery.supplier.as_deref())?;
        let supplier = delivery
            .supplier
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(ANONYMOUS_SUPPLIER)
            .to_string();

        // 先驗證並合併，再分配ID
        let mut merged: Vec<(PartKey, Decimal, u64)> = Vec::new();
        for line in &delivery.lines {
            if catalog.part(&line.part).is_none() {
                return Err(WmsError::PartNotFound(line.part.to_string()));
            }
            if line.quantity == 0 {
                return Err(WmsError::InvalidQuantity(format!(
                    "交貨明細 {} 數量為 0",
                    line.part
                )));
            }
            let price = line.unit_price.max(Decimal::ZERO);
            match merged
                .iter_mut()
                .find(|(part, unit_price, _)| part == &line.part && *unit_price == price)
            {
                Some((_, _, quantity)) => {
                    *quantity = quantity.checked_add(line.quantity).ok_or_else(|| {
                        WmsError::InvalidQuantity(format!("交貨明細 {} 合計數量溢位", line.part))
                    })?;
                }
                None => merged.push((line.part.clone(), price, line.quantity)),
            }
        }

        let mut new_lots = lots.to_vec();
        let mut received = Vec::with_capacity(merged.len());
        for (key, unit_price, quantity) in merged {
            let Some(part) = catalog.part(&key) else {
                return Err(WmsError::PartNotFound(key.to_string()));
            };
            let lot = Lot::new(LotId(ids.next_id()), part, quantity, date)
                .with_supplier(&supplier)
                .with_unit_price(unit_price);

            received.push(ReceivedLine {
                lot_id: lot.id,
                sku: lot.sku.clone(),
                name: lot.name.clone(),
                quantity,
                unit_price: lot.unit_price,
            });
            new_lots.push(lot);
        }

        tracing::info!(
            "收貨完成：供應商 {}，明細 {} 行，新增批次 {} 個",
            supplier,
            delivery.lines.len(),
            received.len()
        );

        Ok(DeliveryOutcome {
            lots: new_lots,
            payload: DeliveryPayload {
                supplier,
                date,
                lines: received,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wms_core::{DeliveryLine, Part, SequentialIds, Supplier};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn catalog() -> Catalog {
        Catalog::new()
            .with_part("X", "Rama")
            .with_part("Y", "Koło")
            .with_supplier(Supplier::new("Stal-Pol"))
    }

    fn delivery() -> PendingDelivery {
        PendingDelivery::new().with_date(date())
    }

    #[test]
    fn test_one_lot_per_line() {
        let mut ids = SequentialIds::starting_at(5);
        let pending = delivery()
            .with_supplier("Stal-Pol")
            .with_line(DeliveryLine::new("X", 10, Decimal::from(3)))
            .with_line(DeliveryLine::new("Y", 4, Decimal::new(125, 2)));

        let outcome = DeliveryReceiver::receive(&pending, &[], &catalog(), &mut ids).unwrap();

        assert_eq!(outcome.lots.len(), 2);
        assert_eq!(outcome.lots[0].id, LotId(5));
        assert_eq!(outcome.lots[0].supplier, "Stal-Pol");
        assert_eq!(outcome.lots[1].unit_price, Decimal::new(125, 2));
        assert_eq!(outcome.payload.lines[1].lot_id, LotId(6));
        assert_eq!(ids.peek(), 7);
    }

    #[test]
    fn test_identical_lines_merge_within_delivery() {
        let mut ids = SequentialIds::default();
        let pending = delivery()
            .with_line(DeliveryLine::new("X", 10, Decimal::from(3)))
            .with_line(DeliveryLine::new("x", 5, Decimal::from(3)))
            .with_line(DeliveryLine::new("X", 1, Decimal::from(4)));

        let outcome = DeliveryReceiver::receive(&pending, &[], &catalog(), &mut ids).unwrap();

        let lots: Vec<(u64, u64)> = outcome.lots.iter().map(|l| (l.id.0, l.quantity)).collect();
        assert_eq!(lots, vec![(1, 15), (2, 1)]);
        assert_eq!(outcome.payload.supplier, "-");
    }

    #[test]
    fn test_unregistered_supplier_is_rejected() {
        let mut ids = SequentialIds::default();
        let pending = delivery()
            .with_supplier("Nieznany")
            .with_line(DeliveryLine::new("X", 1, Decimal::ONE));

        let err = DeliveryReceiver::receive(&pending, &[], &catalog(), &mut ids).unwrap_err();

        assert_eq!(err, WmsError::SupplierNotFound("Nieznany".to_string()));
        assert_eq!(ids.peek(), 1);
    }

    #[test]
    fn test_merge_overflow_is_rejected() {
        let mut ids = SequentialIds::default();
        let pending = delivery()
            .with_line(DeliveryLine::new("X", u64::MAX, Decimal::ONE))
            .with_line(DeliveryLine::new("X", 1, Decimal::ONE));

        let err = DeliveryReceiver::receive(&pending, &[], &catalog(), &mut ids).unwrap_err();

        assert!(matches!(err, WmsError::InvalidQuantity(_)));
        assert_eq!(ids.peek(), 1);
    }

    #[test]
    fn test_never_merges_into_existing_lots() {
        let existing = vec![Lot::new(LotId(1), &Part::new("X", "Rama"), 7, date())];
        let mut ids = SequentialIds::starting_at(2);
        let pending = delivery().with_line(DeliveryLine::new("X", 3, Decimal::ZERO));

        let outcome = DeliveryReceiver::receive(&pending, &existing, &catalog(), &mut ids).unwrap();

        assert_eq!(outcome.lots.len(), 2);
        assert_eq!(outcome.lots[0], existing[0]);
        assert_eq!(outcome.lots[1].quantity, 3);
    }

    #[test]
    fn test_invalid_line_mints_no_ids() {
        let mut ids = SequentialIds::default();
        let pending = delivery()
            .with_line(DeliveryLine::new("X", 3, Decimal::ZERO))
            .with_line(DeliveryLine::new("NOPE", 1, Decimal::ZERO));

        let err = DeliveryReceiver::receive(&pending, &[], &catalog(), &mut ids).unwrap_err();

        assert_eq!(err, WmsError::PartNotFound("nope".to_string()));
        assert_eq!(ids.peek(), 1);
    }

    #[test]
    fn test_rejects_empty_zero_quantity_and_missing_date() {
        let mut ids = SequentialIds::default();

        let err = DeliveryReceiver::receive(&delivery(), &[], &catalog(), &mut ids).unwrap_err();
        assert_eq!(err, WmsError::EmptyDelivery);

        let pending = delivery().with_line(DeliveryLine::new("X", 0, Decimal::ZERO));
        let err = DeliveryReceiver::receive(&pending, &[], &catalog(), &mut ids).unwrap_err();
        assert!(matches!(err, WmsError::InvalidQuantity(_)));

        let pending = PendingDelivery::new().with_line(DeliveryLine::new("X", 1, Decimal::ZERO));
        let err = DeliveryReceiver::receive(&pending, &[], &catalog(), &mut ids).unwrap_err();
        assert!(matches!(err, WmsError::InvalidDate(_)));
    }
}
