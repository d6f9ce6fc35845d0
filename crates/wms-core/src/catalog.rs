//! 零件、供應商與機台目錄

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::delivery::PendingDelivery;
use crate::lot::Lot;
use crate::machine::{BomLine, MachineDefinition};
use crate::part::{Part, PartKey};
use crate::supplier::{Supplier, ANONYMOUS_SUPPLIER};
use crate::{Result, WmsError};

const MAX_SKU_LEN: usize = 50;
const MAX_NAME_LEN: usize = 200;
const MAX_SUPPLIER_LEN: usize = 100;

/// 零件、供應商與機台目錄
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    parts: BTreeMap<PartKey, Part>,

    /// 供應商（依名稱，區分大小寫）
    #[serde(default)]
    suppliers: BTreeMap<String, Supplier>,

    machines: Vec<MachineDefinition>,
}

impl Catalog {
    /// 創建空目錄
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：添加零件（不做驗證，供測試與還原使用）
    pub fn with_part(mut self, sku: &str, name: &str) -> Self {
        let part = Part::new(sku, name);
        self.parts.insert(part.key.clone(), part);
        self
    }

    /// 建構器模式：添加供應商（不做驗證，供測試與還原使用）
    pub fn with_supplier(mut self, supplier: Supplier) -> Self {
        self.suppliers.insert(supplier.name.clone(), supplier);
        self
    }

    /// 建構器模式：添加機台（不做驗證，供測試與還原使用）
    pub fn with_machine(mut self, machine: MachineDefinition) -> Self {
        self.machines.retain(|m| m.code != machine.code);
        self.machines.push(machine);
        self
    }

    pub fn part(&self, key: &PartKey) -> Option<&Part> {
        self.parts.get(key)
    }

    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    pub fn supplier(&self, name: &str) -> Option<&Supplier> {
        self.suppliers.get(name)
    }

    pub fn suppliers(&self) -> impl Iterator<Item = &Supplier> {
        self.suppliers.values()
    }

    /// 供應商對某零件的報價，未報價時為 0
    pub fn quoted_price(&self, supplier: &str, part: &PartKey) -> Decimal {
        self.suppliers
            .get(supplier)
            .and_then(|s| s.price(part))
            .unwrap_or(Decimal::ZERO)
    }

    /// 檢查交貨單使用的供應商名稱
    ///
    /// `None` 與 [`ANONYMOUS_SUPPLIER`] 代表未指定供應商，永遠有效。
    pub fn check_supplier(&self, name: Option<&str>) -> Result<()> {
        match name.map(str::trim) {
            None | Some("") | Some(ANONYMOUS_SUPPLIER) => Ok(()),
            Some(name) if self.suppliers.contains_key(name) => Ok(()),
            Some(name) => Err(WmsError::SupplierNotFound(name.to_string())),
        }
    }

    pub fn machine(&self, code: &str) -> Option<&MachineDefinition> {
        self.machines.iter().find(|m| m.code == code)
    }

    pub fn machines(&self) -> &[MachineDefinition] {
        &self.machines
    }

    /// 零件顯示編號，找不到時退回零件鍵
    pub fn display_sku(&self, key: &PartKey) -> String {
        self.parts
            .get(key)
            .map(|p| p.sku.clone())
            .unwrap_or_else(|| key.to_string())
    }

    /// 零件名稱，找不到時為空字串
    pub fn display_name(&self, key: &PartKey) -> String {
        self.parts
            .get(key)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }

    /// 新增或更新零件
    pub fn upsert_part(&mut self, sku: &str, name: &str) -> Result<&Part> {
        self.upsert_part_for_suppliers(sku, name, &[])
    }

    /// 新增或更新零件，並在選定的供應商報價表加入此零件
    ///
    /// 已有報價的供應商保留原價，其餘以 0 加入。任一供應商不存在時不做任何異動。
    pub fn upsert_part_for_suppliers(
        &mut self,
        sku: &str,
        name: &str,
        selected_suppliers: &[&str],
    ) -> Result<&Part> {
        let sku = sku.trim();
        let name = name.trim();

        if sku.is_empty()
            || sku.len() > MAX_SKU_LEN
            || !sku
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(WmsError::InvalidSku(sku.to_string()));
        }
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(WmsError::InvalidName(name.to_string()));
        }
        if let Some(missing) = selected_suppliers
            .iter()
            .map(|s| s.trim())
            .find(|s| !self.suppliers.contains_key(*s))
        {
            return Err(WmsError::SupplierNotFound(missing.to_string()));
        }

        let part = Part::new(sku, name);
        let key = part.key.clone();
        for selected in selected_suppliers {
            if let Some(supplier) = self.suppliers.get_mut(selected.trim()) {
                supplier.prices.entry(key.clone()).or_insert(Decimal::ZERO);
            }
        }
        self.parts.insert(key.clone(), part);
        Ok(&self.parts[&key])
    }

    /// 刪除零件；仍被批次、交貨單或 BOM 引用時拒絕
    ///
    /// 刪除後所有供應商報價表中的此零件一併移除。
    pub fn remove_part(
        &mut self,
        key: &PartKey,
        lots: &[Lot],
        pending: &PendingDelivery,
    ) -> Result<Part> {
        if !self.parts.contains_key(key) {
            return Err(WmsError::PartNotFound(key.to_string()));
        }
        if lots.iter().any(|lot| &lot.part == key) {
            return Err(WmsError::PartInUse {
                part: key.to_string(),
                reason: "仍有庫存批次".to_string(),
            });
        }
        if pending.references(key) {
            return Err(WmsError::PartInUse {
                part: key.to_string(),
                reason: "在進行中的交貨單內".to_string(),
            });
        }
        if let Some(machine) = self.machines.iter().find(|m| m.uses_part(key)) {
            return Err(WmsError::PartInUse {
                part: key.to_string(),
                reason: format!("被機台 {} 的 BOM 使用", machine.name),
            });
        }

        let part = self
            .parts
            .remove(key)
            .ok_or_else(|| WmsError::PartNotFound(key.to_string()))?;
        for supplier in self.suppliers.values_mut() {
            supplier.prices.remove(key);
        }
        Ok(part)
    }

    /// 新增供應商
    ///
    /// 名稱去除前後空白後不可為空、長度上限 100 字元，且不可與既有供應商重複。
    /// [`ANONYMOUS_SUPPLIER`] 保留給未指定供應商的批次。
    pub fn add_supplier(&mut self, name: &str) -> Result<&Supplier> {
        let name = name.trim();
        if name.is_empty()
            || name == ANONYMOUS_SUPPLIER
            || name.chars().count() > MAX_SUPPLIER_LEN
        {
            return Err(WmsError::InvalidName(name.to_string()));
        }
        if self.suppliers.contains_key(name) {
            return Err(WmsError::DuplicateSupplier(name.to_string()));
        }

        let supplier = self
            .suppliers
            .entry(name.to_string())
            .or_insert_with(|| Supplier::new(name));
        Ok(&*supplier)
    }

    /// 刪除供應商；仍有批次記錄此供應商時拒絕
    pub fn remove_supplier(&mut self, name: &str, lots: &[Lot]) -> Result<Supplier> {
        if !self.suppliers.contains_key(name) {
            return Err(WmsError::SupplierNotFound(name.to_string()));
        }
        let in_use = lots.iter().filter(|lot| lot.supplier == name).count();
        if in_use > 0 {
            return Err(WmsError::SupplierInUse {
                supplier: name.to_string(),
                lots: in_use,
            });
        }

        self.suppliers
            .remove(name)
            .ok_or_else(|| WmsError::SupplierNotFound(name.to_string()))
    }

    /// 設置供應商對某零件的報價（負值視為 0），回傳實際存入的價格
    pub fn update_supplier_price(
        &mut self,
        name: &str,
        part: &PartKey,
        price: Decimal,
    ) -> Result<Decimal> {
        if !self.parts.contains_key(part) {
            return Err(WmsError::PartNotFound(part.to_string()));
        }
        let supplier = self
            .suppliers
            .get_mut(name)
            .ok_or_else(|| WmsError::SupplierNotFound(name.to_string()))?;

        let price = price.max(Decimal::ZERO);
        supplier.prices.insert(part.clone(), price);
        Ok(price)
    }

    /// 新增或更新機台定義
    ///
    /// BOM 中同一零件出現多次時保留最後一次的用量。
    pub fn upsert_machine(&mut self, machine: MachineDefinition) -> Result<&MachineDefinition> {
        let code = machine.code.trim().to_string();
        let name = machine.name.trim().to_string();
        if code.is_empty() {
            return Err(WmsError::InvalidName("機台代碼不可為空".to_string()));
        }
        if name.is_empty() {
            return Err(WmsError::InvalidName("機台名稱不可為空".to_string()));
        }

        let mut bom: Vec<BomLine> = Vec::with_capacity(machine.bom.len());
        for line in machine.bom {
            if !self.parts.contains_key(&line.part) {
                return Err(WmsError::PartNotFound(line.part.to_string()));
            }
            if line.quantity_per_unit == 0 {
                return Err(WmsError::InvalidQuantity(format!(
                    "機台 {} 的零件 {} 用量為 0",
                    code, line.part
                )));
            }
            match bom.iter_mut().find(|existing| existing.part == line.part) {
                Some(existing) => existing.quantity_per_unit = line.quantity_per_unit,
                None => bom.push(line),
            }
        }

        let definition = MachineDefinition { code, name, bom };
        let index = match self.machines.iter().position(|m| m.code == definition.code) {
            Some(index) => {
                self.machines[index] = definition;
                index
            }
            None => {
                self.machines.push(definition);
                self.machines.len() - 1
            }
        };
        Ok(&self.machines[index])
    }

    /// 刪除機台定義
    pub fn remove_machine(&mut self, code: &str) -> Result<MachineDefinition> {
        let index = self
            .machines
            .iter()
            .position(|m| m.code == code)
            .ok_or_else(|| WmsError::MachineNotFound(code.to_string()))?;
        Ok(self.machines.remove(index))
    }
}
