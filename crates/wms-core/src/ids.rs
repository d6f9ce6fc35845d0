//! ID 分配

/// ID 分配器
///
/// 批次與稽核紀錄共用同一序列，ID 順序即建立順序。
pub trait IdAllocator {
    /// 取得下一個 ID
    fn next_id(&mut self) -> u64;
}

/// 單調遞增的 ID 分配器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    /// 從指定值開始分配
    pub fn starting_at(next: u64) -> Self {
        Self { next: next.max(1) }
    }

    /// 觀察到既有的 ID，確保之後分配的 ID 都比它大
    pub fn observe(&mut self, existing: u64) {
        if existing >= self.next {
            self.next = existing + 1;
        }
    }

    /// 下一個將被分配的 ID（不消耗）
    pub fn peek(&self) -> u64 {
        self.next
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdAllocator for SequentialIds {
    fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIds::default();

        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.peek(), 3);
    }

    #[test]
    fn test_observe_moves_counter_forward_only() {
        let mut ids = SequentialIds::starting_at(5);

        ids.observe(41);
        assert_eq!(ids.next_id(), 42);

        // 較小的值不影響
        ids.observe(10);
        assert_eq!(ids.next_id(), 43);
    }
}
