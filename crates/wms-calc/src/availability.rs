//! 庫存可用性檢查

use std::collections::BTreeMap;
use wms_core::{Lot, PartKey, RequirementMap, Shortage};

/// 缺料檢查器
pub struct AvailabilityChecker;

impl AvailabilityChecker {
    /// 比對需求與所有批次的現有總量，回傳缺料清單
    ///
    /// 清單為空表示所有需求都可滿足。
    pub fn check(requirements: &RequirementMap, lots: &[Lot]) -> Vec<Shortage> {
        let on_hand = Self::on_hand(lots);

        let shortages: Vec<Shortage> = requirements
            .iter()
            .filter_map(|(part, &required)| {
                let available = on_hand.get(part).copied().unwrap_or(0);
                (available < required).then(|| Shortage::new(part.clone(), required, available))
            })
            .collect();

        if !shortages.is_empty() {
            tracing::debug!("缺料 {} 項: {:?}", shortages.len(), shortages);
        }

        shortages
    }

    /// 每個零件的現有總量
    pub fn on_hand(lots: &[Lot]) -> BTreeMap<PartKey, u64> {
        let mut totals: BTreeMap<PartKey, u64> = BTreeMap::new();
        for lot in lots {
            let total = totals.entry(lot.part.clone()).or_insert(0);
            *total = total.saturating_add(lot.quantity);
        }
        totals
    }
}
