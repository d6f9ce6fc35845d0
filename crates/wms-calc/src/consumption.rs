//! 耗用提交與追溯

use std::collections::{BTreeMap, HashMap, VecDeque};
use wms_core::{
    Catalog, Lot, LotId, LotTrace, MachineStock, MachineTrace, PartKey, PartTrace,
    ProductionPlanItem,
};

use crate::allocation::{AllocationEntry, AllocationError};

/// 耗用結果：新的批次集合、成品庫存與耗用追溯
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumption {
    /// 扣減後的批次（已移除數量為 0 的批次）
    pub lots: Vec<Lot>,

    /// 累加後的成品庫存
    pub machine_stock: Vec<MachineStock>,

    /// 每一行計劃的耗用追溯
    pub machines: Vec<MachineTrace>,
}

/// 耗用提交器
pub struct ConsumptionCommitter;

impl ConsumptionCommitter {
    /// 將分配套用到批次副本並建立耗用追溯
    ///
    /// 傳入的集合都不會被修改；呼叫端以回傳的集合整體取代現有狀態。
    pub fn commit(
        allocation: &[AllocationEntry],
        plan: &[ProductionPlanItem],
        lots: &[Lot],
        catalog: &Catalog,
        machine_stock: &[MachineStock],
    ) -> Result<Consumption, AllocationError> {
        // 耗用前的批次快照，追溯紀錄以此凍結供應商、日期與單價
        let snapshot: HashMap<LotId, &Lot> = lots.iter().map(|lot| (lot.id, lot)).collect();

        let mut working: Vec<Lot> = lots.to_vec();
        for entry in allocation {
            let lot = working
                .iter_mut()
                .find(|lot| lot.id == entry.lot_id)
                .ok_or(AllocationError::LotNotFound(entry.lot_id))?;

            if entry.quantity_taken > lot.quantity {
                return Err(AllocationError::OverAllocation {
                    lot_id: entry.lot_id,
                    requested: entry.quantity_taken,
                    available: lot.quantity,
                });
            }
            lot.quantity -= entry.quantity_taken;
        }

        let before = working.len();
        working.retain(|lot| !lot.is_depleted());
        tracing::debug!("耗用完成，移除 {} 個已耗盡批次", before - working.len());

        let machines = Self::build_trace(allocation, plan, catalog, &snapshot);
        let machine_stock = Self::add_produced(plan, catalog, machine_stock);

        Ok(Consumption {
            lots: working,
            machine_stock,
            machines,
        })
    }

    /// 依計劃順序，從每個零件的已分配批次佇列中依序扣取
    fn build_trace(
        allocation: &[AllocationEntry],
        plan: &[ProductionPlanItem],
        catalog: &Catalog,
        snapshot: &HashMap<LotId, &Lot>,
    ) -> Vec<MachineTrace> {
        let mut pools: BTreeMap<PartKey, VecDeque<(LotId, u64)>> = BTreeMap::new();
        for entry in allocation {
            pools
                .entry(entry.part.clone())
                .or_default()
                .push_back((entry.lot_id, entry.quantity_taken));
        }

        plan.iter()
            .map(|item| {
                let machine = catalog.machine(&item.machine_code);
                let name = machine
                    .map(|m| m.name.clone())
                    .unwrap_or_else(|| item.machine_code.clone());

                let parts = machine
                    .map(|m| m.bom.as_slice())
                    .unwrap_or_default()
                    .iter()
                    .map(|line| {
                        let needed = line.quantity_per_unit.saturating_mul(item.quantity);
                        let pool = pools.entry(line.part.clone()).or_default();
                        let lots = Self::take_from_pool(pool, needed)
                            .into_iter()
                            .map(|(lot_id, quantity)| {
                                Self::freeze_lot(lot_id, quantity, &line.part, catalog, snapshot)
                            })
                            .collect();

                        PartTrace {
                            part: line.part.clone(),
                            sku: catalog.display_sku(&line.part),
                            name: catalog.display_name(&line.part),
                            quantity: needed,
                            lots,
                        }
                    })
                    .collect();

                MachineTrace {
                    code: item.machine_code.clone(),
                    name,
                    quantity: item.quantity,
                    parts,
                }
            })
            .collect()
    }

    fn take_from_pool(pool: &mut VecDeque<(LotId, u64)>, needed: u64) -> Vec<(LotId, u64)> {
        let mut remaining = needed;
        let mut used = Vec::new();

        while remaining > 0 {
            let Some(head) = pool.front_mut() else {
                break;
            };
            let take = head.1.min(remaining);
            if take > 0 {
                used.push((head.0, take));
                head.1 -= take;
                remaining -= take;
            }
            if head.1 == 0 {
                pool.pop_front();
            }
        }

        used
    }

    fn freeze_lot(
        lot_id: LotId,
        quantity: u64,
        part: &PartKey,
        catalog: &Catalog,
        snapshot: &HashMap<LotId, &Lot>,
    ) -> LotTrace {
        match snapshot.get(&lot_id) {
            Some(lot) => LotTrace {
                lot_id,
                quantity,
                sku: lot.sku.clone(),
                name: lot.name.clone(),
                supplier: lot.supplier.clone(),
                date_received: lot.date_received,
                unit_price: lot.unit_price,
            },
            // commit 已驗證過所有批次存在
            None => LotTrace {
                lot_id,
                quantity,
                sku: catalog.display_sku(part),
                name: catalog.display_name(part),
                supplier: wms_core::ANONYMOUS_SUPPLIER.to_string(),
                date_received: chrono::NaiveDate::MIN,
                unit_price: rust_decimal::Decimal::ZERO,
            },
        }
    }

    /// 累加成品庫存，名稱一律使用目錄中目前的機台名稱
    fn add_produced(
        plan: &[ProductionPlanItem],
        catalog: &Catalog,
        machine_stock: &[MachineStock],
    ) -> Vec<MachineStock> {
        let mut stock = machine_stock.to_vec();

        for item in plan {
            let current_name = catalog
                .machine(&item.machine_code)
                .map(|m| m.name.clone())
                .unwrap_or_else(|| item.machine_code.clone());

            match stock.iter_mut().find(|s| s.code == item.machine_code) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                    existing.name = current_name;
                }
                None => stock.push(MachineStock {
                    code: item.machine_code.clone(),
                    name: current_name,
                    quantity: item.quantity,
                }),
            }
        }

        stock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use wms_core::{MachineDefinition, Part};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, day).unwrap()
    }

    fn catalog() -> Catalog {
        Catalog::new()
            .with_part("X", "Rama")
            .with_part("Y", "Koło")
            .with_machine(MachineDefinition::new("M1", "Tokarka").with_bom_line("X", 3))
            .with_machine(
                MachineDefinition::new("M2", "Frezarka")
                    .with_bom_line("X", 1)
                    .with_bom_line("Y", 2),
            )
    }

    fn lots() -> Vec<Lot> {
        let x = Part::new("X", "Rama");
        let y = Part::new("Y", "Koło");
        vec![
            Lot::new(LotId(10), &x, 4, date(1))
                .with_supplier("Stal-Pol")
                .with_unit_price(Decimal::from(3)),
            Lot::new(LotId(11), &x, 5, date(2))
                .with_supplier("Metal-Bud")
                .with_unit_price(Decimal::from(5)),
            Lot::new(LotId(12), &y, 8, date(3)).with_supplier("Koła SA"),
        ]
    }

    fn entry(id: u64, sku: &str, quantity: u64) -> AllocationEntry {
        AllocationEntry::new(LotId(id), PartKey::new(sku), quantity)
    }

    #[test]
    fn test_commit_decrements_and_removes_depleted() {
        let plan = vec![ProductionPlanItem::new("M1", 2)];
        let allocation = vec![entry(10, "X", 4), entry(11, "X", 2)];

        let result =
            ConsumptionCommitter::commit(&allocation, &plan, &lots(), &catalog(), &[]).unwrap();

        let remaining: Vec<(u64, u64)> = result.lots.iter().map(|l| (l.id.0, l.quantity)).collect();
        assert_eq!(remaining, vec![(11, 3), (12, 8)]);
        assert_eq!(
            result.machine_stock,
            vec![MachineStock {
                code: "M1".to_string(),
                name: "Tokarka".to_string(),
                quantity: 2,
            }]
        );
    }

    #[test]
    fn test_trace_freezes_lot_snapshot() {
        let plan = vec![ProductionPlanItem::new("M1", 2)];
        let allocation = vec![entry(10, "X", 4), entry(11, "X", 2)];

        let result =
            ConsumptionCommitter::commit(&allocation, &plan, &lots(), &catalog(), &[]).unwrap();

        let part = &result.machines[0].parts[0];
        assert_eq!(part.quantity, 6);
        assert_eq!(part.sku, "X");
        assert_eq!(part.lots.len(), 2);
        // 批次 #10 已被移除，但追溯仍保留其供應商與單價
        assert_eq!(part.lots[0].lot_id, LotId(10));
        assert_eq!(part.lots[0].supplier, "Stal-Pol");
        assert_eq!(part.lots[0].unit_price, Decimal::from(3));
        assert_eq!(part.lots[1].quantity, 2);
        assert_eq!(result.machines[0].total_cost(), Decimal::from(22));
    }

    #[test]
    fn test_trace_splits_pool_across_plan_lines() {
        // M1×1 需要 X:3，M2×1 需要 X:1, Y:2
        let plan = vec![
            ProductionPlanItem::new("M1", 1),
            ProductionPlanItem::new("M2", 1),
        ];
        let allocation = vec![entry(10, "X", 4), entry(12, "Y", 2)];

        let result =
            ConsumptionCommitter::commit(&allocation, &plan, &lots(), &catalog(), &[]).unwrap();

        let m1_x = &result.machines[0].parts[0];
        assert_eq!(m1_x.lots.len(), 1);
        assert_eq!((m1_x.lots[0].lot_id, m1_x.lots[0].quantity), (LotId(10), 3));

        let m2_x = &result.machines[1].parts[0];
        assert_eq!((m2_x.lots[0].lot_id, m2_x.lots[0].quantity), (LotId(10), 1));

        let m2_y = &result.machines[1].parts[1];
        assert_eq!((m2_y.lots[0].lot_id, m2_y.lots[0].quantity), (LotId(12), 2));
    }

    #[test]
    fn test_existing_stock_is_renamed_to_current_name() {
        let plan = vec![ProductionPlanItem::new("M1", 1)];
        let stock = vec![MachineStock {
            code: "M1".to_string(),
            name: "Stara nazwa".to_string(),
            quantity: 5,
        }];

        let result = ConsumptionCommitter::commit(
            &[entry(10, "X", 3)],
            &plan,
            &lots(),
            &catalog(),
            &stock,
        )
        .unwrap();

        assert_eq!(result.machine_stock[0].quantity, 6);
        assert_eq!(result.machine_stock[0].name, "Tokarka");
    }

    #[test]
    fn test_invalid_entry_leaves_input_untouched() {
        let lots = lots();
        let before = lots.clone();
        let plan = vec![ProductionPlanItem::new("M1", 1)];

        let err = ConsumptionCommitter::commit(
            &[entry(10, "X", 3), entry(99, "X", 1)],
            &plan,
            &lots,
            &catalog(),
            &[],
        )
        .unwrap_err();
        assert_eq!(err, AllocationError::LotNotFound(LotId(99)));

        let err = ConsumptionCommitter::commit(&[entry(10, "X", 5)], &plan, &lots, &catalog(), &[])
            .unwrap_err();
        assert!(matches!(err, AllocationError::OverAllocation { .. }));

        assert_eq!(lots, before);
    }
}
