//! 手動分配

use std::collections::BTreeMap;
use wms_core::{Lot, LotId, RequirementMap};

use crate::allocation::{AllocationEntry, AllocationError};

/// 手動分配器
pub struct ManualAllocator;

impl ManualAllocator {
    /// 驗證呼叫端指定的批次取用量
    ///
    /// 依批次ID由小到大逐筆檢查，每筆依序確認（遇到第一個錯誤即回傳）：
    /// 1. 批次存在
    /// 2. 批次零件在需求內
    /// 3. 取用量不超過批次數量
    ///
    /// 全部通過後才檢查每個零件的取用總量剛好等於需求。
    ///
    /// 取用量為 0 的項目忽略。回傳的分配依批次ID排序。
    pub fn allocate(
        requested: &BTreeMap<LotId, u64>,
        requirements: &RequirementMap,
        lots: &[Lot],
    ) -> Result<Vec<AllocationEntry>, AllocationError> {
        let mut picked: Vec<(&Lot, u64)> = Vec::with_capacity(requested.len());
        let mut totals = RequirementMap::new();
        for (&lot_id, &quantity) in requested {
            if quantity == 0 {
                continue;
            }
            let lot = lots
                .iter()
                .find(|lot| lot.id == lot_id)
                .ok_or(AllocationError::LotNotFound(lot_id))?;
            if !requirements.contains_key(&lot.part) {
                return Err(AllocationError::UnrequestedAllocation {
                    lot_id,
                    part: lot.part.clone(),
                });
            }
            if quantity > lot.quantity {
                return Err(AllocationError::OverAllocation {
                    lot_id,
                    requested: quantity,
                    available: lot.quantity,
                });
            }

            let total = totals.entry(lot.part.clone()).or_insert(0);
            *total = total.saturating_add(quantity);
            picked.push((lot, quantity));
        }

        for (part, &required) in requirements {
            let requested = totals.get(part).copied().unwrap_or(0);
            if requested != required {
                tracing::warn!("手動分配不符：{} 已選 {}，需求 {}", part, requested, required);
                return Err(AllocationError::AllocationMismatch {
                    part: part.clone(),
                    requested,
                    required,
                });
            }
        }

        let entries: Vec<AllocationEntry> = picked
            .into_iter()
            .map(|(lot, quantity)| AllocationEntry::new(lot.id, lot.part.clone(), quantity))
            .collect();

        tracing::debug!("手動分配驗證通過：{} 筆", entries.len());
        Ok(entries)
    }
}
