//! 生產結案（交易入口）

use chrono::NaiveDate;
use wms_core::{
    Catalog, Lot, MachineStock, MachineTrace, ProductionPayload, ProductionPlanItem,
    RequirementMap,
};

use crate::allocation::{AllocationCalculator, AllocationEntry, AllocationMode};
use crate::availability::AvailabilityChecker;
use crate::consumption::ConsumptionCommitter;
use crate::requirements::RequirementCalculator;
use crate::FinalizeError;

/// 生產結案結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionOutcome {
    /// 需求彙總
    pub requirements: RequirementMap,

    /// 實際採用的分配
    pub allocation: Vec<AllocationEntry>,

    /// 新的批次集合
    pub lots: Vec<Lot>,

    /// 新的成品庫存
    pub machine_stock: Vec<MachineStock>,

    /// 耗用追溯
    pub machines: Vec<MachineTrace>,
}

impl ProductionOutcome {
    /// 轉為稽核內容
    pub fn to_payload(&self, date: NaiveDate) -> ProductionPayload {
        ProductionPayload {
            date,
            machines: self.machines.clone(),
        }
    }
}

/// 生產結案
pub struct ProductionFinalizer;

impl ProductionFinalizer {
    /// 需求彙總 → 缺料檢查 → 分配 → 耗用
    ///
    /// 任何一步失敗都直接回傳錯誤，傳入的批次與成品庫存保持不變。
    pub fn finalize(
        plan: &[ProductionPlanItem],
        lots: &[Lot],
        catalog: &Catalog,
        machine_stock: &[MachineStock],
        mode: &AllocationMode,
    ) -> Result<ProductionOutcome, FinalizeError> {
        if plan.is_empty() {
            return Err(FinalizeError::EmptyPlan);
        }

        tracing::info!(
            "開始生產結案：計劃 {} 行，批次 {} 個，模式 {}",
            plan.len(),
            lots.len(),
            match mode {
                AllocationMode::Fifo => "FIFO",
                AllocationMode::Manual(_) => "手動",
            }
        );

        // Step 1: 需求彙總
        let requirements = RequirementCalculator::compute(plan, catalog)?;

        // Step 2: 缺料檢查（有缺料即中止，不做任何分配）
        let shortages = AvailabilityChecker::check(&requirements, lots);
        if !shortages.is_empty() {
            tracing::warn!("生產結案中止：{} 項零件缺料", shortages.len());
            return Err(FinalizeError::Shortage(shortages));
        }

        // Step 3: 分配
        let allocation = AllocationCalculator::allocate(mode, &requirements, lots).map_err(|e| {
            tracing::warn!("生產結案中止：{}", e);
            e
        })?;

        // Step 4: 耗用
        let consumption =
            ConsumptionCommitter::commit(&allocation, plan, lots, catalog, machine_stock)?;

        tracing::info!(
            "生產結案完成：分配 {} 筆，剩餘批次 {} 個",
            allocation.len(),
            consumption.lots.len()
        );

        Ok(ProductionOutcome {
            requirements,
            allocation,
            lots: consumption.lots,
            machine_stock: consumption.machine_stock,
            machines: consumption.machines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::AllocationError;
    use wms_core::{LotId, MachineDefinition, Part, PartKey, Shortage};

    fn catalog() -> Catalog {
        Catalog::new()
            .with_part("X", "x")
            .with_machine(MachineDefinition::new("M1", "Tokarka").with_bom_line("X", 3))
    }

    fn lot(id: u64, quantity: u64) -> Lot {
        Lot::new(
            LotId(id),
            &Part::new("X", "x"),
            quantity,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
    }

    #[test]
    fn test_fifo_scenario() {
        let plan = vec![ProductionPlanItem::new("M1", 2)];
        let lots = vec![lot(10, 4), lot(11, 5)];

        let outcome =
            ProductionFinalizer::finalize(&plan, &lots, &catalog(), &[], &AllocationMode::Fifo)
                .unwrap();

        assert_eq!(outcome.requirements[&PartKey::new("X")], 6);
        let taken: Vec<(u64, u64)> = outcome
            .allocation
            .iter()
            .map(|e| (e.lot_id.0, e.quantity_taken))
            .collect();
        assert_eq!(taken, vec![(10, 4), (11, 2)]);
        assert_eq!(outcome.lots, vec![lot(11, 3)]);
        assert_eq!(outcome.machine_stock[0].quantity, 2);
    }

    #[test]
    fn test_shortage_blocks_before_allocation() {
        let plan = vec![ProductionPlanItem::new("M1", 2)];
        let lots = vec![lot(10, 2), lot(11, 3)];
        let before = lots.clone();

        // 即使手動分配本身也有錯，缺料仍優先回報
        let mode = AllocationMode::Manual([(LotId(99), 1)].into_iter().collect());
        let err = ProductionFinalizer::finalize(&plan, &lots, &catalog(), &[], &mode).unwrap_err();

        assert_eq!(
            err,
            FinalizeError::Shortage(vec![Shortage::new(PartKey::new("X"), 6, 5)])
        );
        assert_eq!(err.shortages()[0].shortfall, 1);
        assert_eq!(lots, before);
    }

    #[test]
    fn test_manual_rejection_is_wrapped() {
        let plan = vec![ProductionPlanItem::new("M1", 2)];
        let lots = vec![lot(10, 4), lot(11, 5)];
        let mode = AllocationMode::Manual([(LotId(10), 4), (LotId(11), 1)].into_iter().collect());

        let err = ProductionFinalizer::finalize(&plan, &lots, &catalog(), &[], &mode).unwrap_err();

        assert_eq!(
            err,
            FinalizeError::Allocation(AllocationError::AllocationMismatch {
                part: PartKey::new("X"),
                requested: 5,
                required: 6,
            })
        );
    }

    #[test]
    fn test_empty_plan() {
        let err = ProductionFinalizer::finalize(&[], &[], &catalog(), &[], &AllocationMode::Fifo)
            .unwrap_err();

        assert_eq!(err, FinalizeError::EmptyPlan);
    }

    #[test]
    fn test_requirement_overflow_is_rejected() {
        let plan = vec![ProductionPlanItem::new("M1", u64::MAX / 2)];
        let lots = vec![lot(10, 4)];

        let err =
            ProductionFinalizer::finalize(&plan, &lots, &catalog(), &[], &AllocationMode::Fifo)
                .unwrap_err();

        assert_eq!(err, FinalizeError::QuantityOverflow(PartKey::new("X")));
        assert!(err.shortages().is_empty());
    }

    #[test]
    fn test_payload_carries_date_and_trace() {
        let plan = vec![ProductionPlanItem::new("M1", 1)];
        let outcome = ProductionFinalizer::finalize(
            &plan,
            &[lot(1, 3)],
            &catalog(),
            &[],
            &AllocationMode::Fifo,
        )
        .unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let payload = outcome.to_payload(date);
        assert_eq!(payload.date, date);
        assert_eq!(payload.machines[0].parts[0].lots[0].lot_id, LotId(1));
        assert!(outcome.lots.is_empty());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeMap;
        use wms_core::{total_on_hand, LotId, MachineDefinition, Part, PartKey};

        fn catalog() -> Catalog {
            Catalog::new()
                .with_part("X", "x")
                .with_part("Y", "y")
                .with_machine(
                    MachineDefinition::new("M1", "Tokarka")
                        .with_bom_line("X", 2)
                        .with_bom_line("Y", 1),
                )
        }

        fn build_lots(quantities: &[(bool, u64)]) -> Vec<Lot> {
            let x = Part::new("X", "x");
            let y = Part::new("Y", "y");
            let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
            quantities
                .iter()
                .enumerate()
                .map(|(i, (is_x, quantity))| {
                    let part = if *is_x { &x } else { &y };
                    Lot::new(LotId(i as u64 + 1), part, *quantity, date)
                })
                .collect()
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// 結案成功時，每個零件的庫存減少量剛好等於需求；失敗時庫存不變
            #[test]
            fn stock_is_conserved(
                quantities in prop::collection::vec((any::<bool>(), 1u64..20), 0..8),
                units in 1u64..6,
            ) {
                let lots = build_lots(&quantities);
                let plan = vec![ProductionPlanItem::new("M1", units)];

                match ProductionFinalizer::finalize(&plan, &lots, &catalog(), &[], &AllocationMode::Fifo) {
                    Ok(outcome) => {
                        for (part, required) in &outcome.requirements {
                            prop_assert_eq!(
                                total_on_hand(&lots, part) - total_on_hand(&outcome.lots, part),
                                *required
                            );
                        }
                        prop_assert!(outcome.lots.iter().all(|lot| lot.quantity > 0));
                        prop_assert_eq!(outcome.machine_stock[0].quantity, units);
                    }
                    Err(err) => {
                        prop_assert!(!err.shortages().is_empty());
                        let x = PartKey::new("X");
                        let y = PartKey::new("Y");
                        prop_assert!(
                            total_on_hand(&lots, &x) < units * 2 || total_on_hand(&lots, &y) < units
                        );
                    }
                }
            }

            /// 以 FIFO 結果作為手動指定時，結案後的批次與成品庫存完全相同
            #[test]
            fn manual_replay_of_fifo_matches(
                quantities in prop::collection::vec((any::<bool>(), 1u64..20), 0..8),
                units in 1u64..6,
            ) {
                let lots = build_lots(&quantities);
                let plan = vec![ProductionPlanItem::new("M1", units)];

                let Ok(fifo) = ProductionFinalizer::finalize(
                    &plan,
                    &lots,
                    &catalog(),
                    &[],
                    &AllocationMode::Fifo,
                ) else {
                    return Ok(());
                };
                let picks: BTreeMap<LotId, u64> = fifo
                    .allocation
                    .iter()
                    .map(|entry| (entry.lot_id, entry.quantity_taken))
                    .collect();

                let manual = ProductionFinalizer::finalize(
                    &plan,
                    &lots,
                    &catalog(),
                    &[],
                    &AllocationMode::Manual(picks),
                )
                .unwrap();

                prop_assert_eq!(&manual.requirements, &fifo.requirements);
                prop_assert_eq!(&manual.lots, &fifo.lots);
                prop_assert_eq!(&manual.machine_stock, &fifo.machine_stock);
            }
        }
    }
}
