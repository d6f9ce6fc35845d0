//! 先進先出分配

use wms_core::{Lot, RequirementMap};

use crate::allocation::{AllocationEntry, AllocationError};

/// 先進先出分配器
pub struct FifoAllocator;

impl FifoAllocator {
    /// 對每個零件，依批次ID由小到大貪婪取用直到滿足需求
    ///
    /// 在批次的副本上運算；庫存不足時回傳 `Insufficient`，不產生部分分配。
    pub fn allocate(
        requirements: &RequirementMap,
        lots: &[Lot],
    ) -> Result<Vec<AllocationEntry>, AllocationError> {
        let mut working: Vec<Lot> = lots.to_vec();
        working.sort_by_key(|lot| lot.id);

        let mut entries = Vec::new();

        for (part, &required) in requirements {
            let mut remaining = required;

            for lot in working
                .iter_mut()
                .filter(|lot| &lot.part == part && lot.quantity > 0)
            {
                if remaining == 0 {
                    break;
                }

                let take = remaining.min(lot.quantity);
                lot.quantity -= take;
                remaining -= take;
                entries.push(AllocationEntry::new(lot.id, part.clone(), take));
            }

            if remaining > 0 {
                tracing::warn!("FIFO 分配失敗：{} 尚缺 {} 件", part, remaining);
                return Err(AllocationError::Insufficient {
                    part: part.clone(),
                    required,
                    allocated: required - remaining,
                });
            }
        }

        tracing::debug!("FIFO 分配完成：{} 筆", entries.len());
        Ok(entries)
    }
}
