//! 機台與 BOM 模型

use serde::{Deserialize, Serialize};

use crate::part::PartKey;

/// BOM 明細：生產一台機台所需的零件用量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomLine {
    /// 零件鍵
    pub part: PartKey,

    /// 單台用量（至少 1）
    pub quantity_per_unit: u64,
}

impl BomLine {
    pub fn new(part: &str, quantity_per_unit: u64) -> Self {
        Self {
            part: PartKey::new(part),
            quantity_per_unit,
        }
    }
}

/// 機台定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineDefinition {
    /// 機台代碼
    pub code: String,

    /// 機台名稱
    pub name: String,

    /// 物料清單
    pub bom: Vec<BomLine>,
}

impl MachineDefinition {
    /// 創建新的機台定義（空 BOM）
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.trim().to_string(),
            name: name.trim().to_string(),
            bom: Vec::new(),
        }
    }

    /// 建構器模式：添加 BOM 明細
    pub fn with_bom_line(mut self, part: &str, quantity_per_unit: u64) -> Self {
        self.bom.push(BomLine::new(part, quantity_per_unit));
        self
    }

    /// 沒有 BOM 的機台不可生產
    pub fn is_producible(&self) -> bool {
        !self.bom.is_empty()
    }

    /// 檢查 BOM 是否引用某零件
    pub fn uses_part(&self, part: &PartKey) -> bool {
        self.bom.iter().any(|line| &line.part == part)
    }
}

/// 成品機台庫存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineStock {
    pub code: String,
    pub name: String,
    pub quantity: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_builder() {
        let machine = MachineDefinition::new("M1", "Tokarka")
            .with_bom_line("FRAME-01", 1)
            .with_bom_line("Bolt-M8", 12);

        assert!(machine.is_producible());
        assert!(machine.uses_part(&PartKey::new("bolt-m8")));
        assert!(!machine.uses_part(&PartKey::new("wheel")));
    }

    #[test]
    fn test_machine_without_bom() {
        let machine = MachineDefinition::new(" M2 ", "Frezarka");

        assert_eq!(machine.code, "M2");
        assert!(!machine.is_producible());
    }
}
