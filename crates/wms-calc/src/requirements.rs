//! 需求彙總

use wms_core::{Catalog, ProductionPlanItem, RequirementMap};

use crate::FinalizeError;

/// 需求彙總計算器
pub struct RequirementCalculator;

impl RequirementCalculator {
    /// 由生產計劃與 BOM 計算每個零件的總需求
    ///
    /// 目錄中找不到的機台直接略過；結果不含需求為 0 的零件。
    /// 任何零件的需求超出 `u64` 範圍時回傳 `QuantityOverflow`。
    pub fn compute(
        plan: &[ProductionPlanItem],
        catalog: &Catalog,
    ) -> Result<RequirementMap, FinalizeError> {
        let mut requirements = RequirementMap::new();

        for item in plan {
            let Some(machine) = catalog.machine(&item.machine_code) else {
                tracing::debug!("機台 {} 不在目錄中，略過", item.machine_code);
                continue;
            };

            for line in &machine.bom {
                // 需求數量 = 單台用量 × 生產數量
                let total = requirements.entry(line.part.clone()).or_insert(0);
                *total = line
                    .quantity_per_unit
                    .checked_mul(item.quantity)
                    .and_then(|quantity| total.checked_add(quantity))
                    .ok_or_else(|| {
                        tracing::warn!("零件 {} 需求數量溢位", line.part);
                        FinalizeError::QuantityOverflow(line.part.clone())
                    })?;
            }
        }

        requirements.retain(|_, quantity| *quantity > 0);

        tracing::debug!("需求彙總完成：{} 項零件", requirements.len());
        Ok(requirements)
    }
}
