//! 倉庫服務
//!
//! 持有目前的倉庫狀態，串接目錄維護、收貨、生產結案與持久化。
//! 所有異動作業以 `try_lock` 取得狀態鎖，另一個作業進行中時回傳 [`WarehouseError::Busy`]；
//! 鎖在驗證到提交的整段期間都不釋放。

use chrono::{NaiveDate, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};
use uuid::Uuid;
use wms_calc::{
    AllocationMode, AuditLog, AvailabilityChecker, DeliveryReceiver, FinalizeError,
    ProductionFinalizer, RequirementCalculator, StockSummary,
};
use wms_core::{
    AuditPayload, AuditRecord, Catalog, Decimal, DeliveryLine, EngineConfig, Lot,
    MachineDefinition, MachineStock, Part, PartKey, PendingDelivery, ProductionPlanItem,
    RequirementMap, SequentialIds, Shortage, Supplier, Thresholds, WmsError, ANONYMOUS_SUPPLIER,
};
use wms_store::{Snapshot, SnapshotStore, StoreError};

/// 倉庫服務錯誤
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    #[error("另一個作業正在進行中，請稍後再試")]
    Busy,

    #[error(transparent)]
    Wms(#[from] WmsError),

    #[error(transparent)]
    Finalize(#[from] FinalizeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, WarehouseError>;

/// 已生效的異動
///
/// 寫入儲存失敗不會回滾異動，錯誤放在 `persistence_error` 交給呼叫端提示。
#[derive(Debug)]
#[must_use]
pub struct Committed<T> {
    pub value: T,
    pub persistence_error: Option<StoreError>,
}

impl<T> Committed<T> {
    pub fn is_persisted(&self) -> bool {
        self.persistence_error.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// 生產預覽（唯讀）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub requirements: RequirementMap,
    pub shortages: Vec<Shortage>,
}

impl Preview {
    pub fn is_feasible(&self) -> bool {
        self.shortages.is_empty()
    }
}

struct State {
    lots: Vec<Lot>,
    catalog: Catalog,
    machine_stock: Vec<MachineStock>,
    pending_delivery: PendingDelivery,
    plan: Vec<ProductionPlanItem>,
    history: AuditLog,
    config: EngineConfig,
    ids: SequentialIds,
}

impl State {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let ids = snapshot.id_allocator();
        let history = AuditLog::from_records(snapshot.history, snapshot.config.history_capacity);
        Self {
            lots: snapshot.lots,
            catalog: snapshot.catalog,
            machine_stock: snapshot.machine_stock,
            pending_delivery: snapshot.pending_delivery,
            plan: snapshot.plan,
            history,
            config: snapshot.config,
            ids,
        }
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            lots: self.lots.clone(),
            catalog: self.catalog.clone(),
            machine_stock: self.machine_stock.clone(),
            pending_delivery: self.pending_delivery.clone(),
            plan: self.plan.clone(),
            history: self.history.records(),
            config: self.config.clone(),
            next_id: self.ids.peek(),
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// 倉庫服務
pub struct Warehouse<S: SnapshotStore> {
    state: Mutex<State>,
    store: S,
}

impl<S: SnapshotStore> Warehouse<S> {
    /// 建立空倉庫（不讀取儲存內容）
    pub fn new(store: S, config: EngineConfig) -> Self {
        let snapshot = Snapshot {
            config,
            ..Snapshot::default()
        };
        Self {
            state: Mutex::new(State::from_snapshot(snapshot)),
            store,
        }
    }

    /// 從儲存還原；尚未儲存過時以 `config` 建立空倉庫
    pub fn open(store: S, config: EngineConfig) -> Result<Self> {
        match store.load()? {
            Some(snapshot) => {
                tracing::info!(
                    "已還原倉庫狀態：批次 {} 個，稽核紀錄 {} 筆",
                    snapshot.lots.len(),
                    snapshot.history.len()
                );
                Ok(Self {
                    state: Mutex::new(State::from_snapshot(snapshot)),
                    store,
                })
            }
            None => Ok(Self::new(store, config)),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn try_state(&self) -> Result<MutexGuard<'_, State>> {
        match self.state.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => {
                tracing::warn!("倉庫忙碌中，拒絕新的作業");
                Err(WarehouseError::Busy)
            }
        }
    }

    fn read_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist<T>(&self, state: &State, value: T) -> Committed<T> {
        let persistence_error = self.store.save(&state.to_snapshot()).err();
        if let Some(e) = &persistence_error {
            tracing::warn!("異動已生效，但寫入儲存失敗：{}", e);
        }
        Committed {
            value,
            persistence_error,
        }
    }

    // ---- 目錄 ----

    /// 新增或更新零件
    pub fn upsert_part(&self, sku: &str, name: &str) -> Result<Committed<Part>> {
        self.upsert_part_for_suppliers(sku, name, &[])
    }

    /// 新增或更新零件，並加入選定供應商的報價表（未報價者以 0 加入）
    pub fn upsert_part_for_suppliers(
        &self,
        sku: &str,
        name: &str,
        selected_suppliers: &[&str],
    ) -> Result<Committed<Part>> {
        let mut guard = self.try_state()?;
        let part = guard
            .catalog
            .upsert_part_for_suppliers(sku, name, selected_suppliers)?
            .clone();
        tracing::info!("零件已儲存：{}", part.sku);
        Ok(self.persist(&guard, part))
    }

    /// 刪除零件；仍被批次、交貨單或 BOM 引用時拒絕
    pub fn remove_part(&self, sku: &str) -> Result<Committed<Part>> {
        let mut guard = self.try_state()?;
        let state = &mut *guard;
        let part =
            state
                .catalog
                .remove_part(&PartKey::new(sku), &state.lots, &state.pending_delivery)?;
        tracing::info!("零件已刪除：{}", part.sku);
        Ok(self.persist(state, part))
    }

    pub fn add_supplier(&self, name: &str) -> Result<Committed<Supplier>> {
        let mut guard = self.try_state()?;
        let supplier = guard.catalog.add_supplier(name)?.clone();
        tracing::info!("供應商已新增：{}", supplier.name);
        Ok(self.persist(&guard, supplier))
    }

    /// 刪除供應商；仍有批次來自此供應商時拒絕
    pub fn remove_supplier(&self, name: &str) -> Result<Committed<Supplier>> {
        let mut guard = self.try_state()?;
        let state = &mut *guard;
        let supplier = state.catalog.remove_supplier(name, &state.lots)?;
        if state.pending_delivery.supplier.as_deref() == Some(supplier.name.as_str()) {
            state.pending_delivery.supplier = None;
        }
        tracing::info!("供應商已刪除：{}", supplier.name);
        Ok(self.persist(state, supplier))
    }

    /// 設置供應商報價，回傳實際存入的價格
    pub fn update_supplier_price(
        &self,
        name: &str,
        sku: &str,
        price: Decimal,
    ) -> Result<Committed<Decimal>> {
        let mut guard = self.try_state()?;
        let part = PartKey::new(sku);
        let price = guard.catalog.update_supplier_price(name, &part, price)?;
        tracing::debug!("供應商 {} 報價更新：{} = {}", name, part, price);
        Ok(self.persist(&guard, price))
    }

    /// 新增或更新機台定義
    pub fn upsert_machine(&self, machine: MachineDefinition) -> Result<Committed<MachineDefinition>> {
        let mut guard = self.try_state()?;
        let machine = guard.catalog.upsert_machine(machine)?.clone();
        tracing::info!("機台已儲存：{}（BOM {} 行）", machine.code, machine.bom.len());
        Ok(self.persist(&guard, machine))
    }

    /// 刪除機台定義，並移除計劃中該機台的明細
    pub fn remove_machine(&self, code: &str) -> Result<Committed<MachineDefinition>> {
        let mut guard = self.try_state()?;
        let state = &mut *guard;
        let machine = state.catalog.remove_machine(code)?;

        let before = state.plan.len();
        state.plan.retain(|item| item.machine_code != machine.code);
        tracing::info!(
            "機台已刪除：{}，同時移除計劃明細 {} 行",
            machine.code,
            before - state.plan.len()
        );
        Ok(self.persist(state, machine))
    }

    // ---- 收貨 ----

    /// 設置交貨單供應商
    ///
    /// 必須是已登錄的供應商；`None`、空白或 `-` 表示未指定。
    pub fn set_delivery_supplier(&self, supplier: Option<&str>) -> Result<Committed<()>> {
        let mut guard = self.try_state()?;
        guard.catalog.check_supplier(supplier)?;
        guard.pending_delivery.supplier = supplier
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != ANONYMOUS_SUPPLIER)
            .map(str::to_string);
        Ok(self.persist(&guard, ()))
    }

    /// 設置交貨日期（不可為未來日期，最多回溯設定的年數）
    pub fn set_delivery_date(&self, date: NaiveDate) -> Result<Committed<()>> {
        let mut guard = self.try_state()?;
        guard.config.delivery_dates.validate(date, today())?;
        guard.pending_delivery.date = Some(date);
        Ok(self.persist(&guard, ()))
    }

    /// 在交貨單加入一行明細
    pub fn add_to_delivery(&self, line: DeliveryLine) -> Result<Committed<()>> {
        let mut guard = self.try_state()?;
        if guard.catalog.part(&line.part).is_none() {
            return Err(WmsError::PartNotFound(line.part.to_string()).into());
        }
        if line.quantity == 0 {
            return Err(WmsError::InvalidQuantity(format!("交貨明細 {} 數量為 0", line.part)).into());
        }

        tracing::debug!("交貨單加入 {} × {}", line.part, line.quantity);
        guard.pending_delivery.add_line(line);
        Ok(self.persist(&guard, ()))
    }

    pub fn clear_delivery(&self) -> Result<Committed<()>> {
        let mut guard = self.try_state()?;
        guard.pending_delivery.clear();
        Ok(self.persist(&guard, ()))
    }

    /// 收貨入庫：每行明細成為新批次，寫入稽核紀錄並清空交貨單
    pub fn receive_delivery(&self) -> Result<Committed<AuditRecord>> {
        let mut guard = self.try_state()?;
        let state = &mut *guard;

        if let Some(date) = state.pending_delivery.date {
            state.config.delivery_dates.validate(date, today())?;
        }
        let outcome = DeliveryReceiver::receive(
            &state.pending_delivery,
            &state.lots,
            &state.catalog,
            &mut state.ids,
        )?;

        state.lots = outcome.lots;
        state.pending_delivery.clear();
        let record = state
            .history
            .append(AuditPayload::Delivery(outcome.payload), &mut state.ids, Utc::now())
            .clone();

        Ok(self.persist(state, record))
    }

    // ---- 生產 ----

    /// 在生產計劃加入一行
    ///
    /// 加入後的需求彙總超出可表示範圍時拒絕，計劃保持不變。
    pub fn add_to_plan(&self, machine_code: &str, quantity: u64) -> Result<Committed<()>> {
        let mut guard = self.try_state()?;
        let state = &mut *guard;
        let machine = state
            .catalog
            .machine(machine_code.trim())
            .ok_or_else(|| WmsError::MachineNotFound(machine_code.to_string()))?;
        if !machine.is_producible() {
            return Err(WmsError::EmptyBom(machine.code.clone()).into());
        }
        if quantity == 0 {
            return Err(WmsError::InvalidQuantity(format!("機台 {} 生產數量為 0", machine.code)).into());
        }

        let mut plan = state.plan.clone();
        plan.push(ProductionPlanItem::new(&machine.code, quantity));
        if let Err(e) = RequirementCalculator::compute(&plan, &state.catalog) {
            tracing::warn!("拒絕加入計劃：機台 {} × {}，{}", machine.code, quantity, e);
            return Err(WmsError::InvalidQuantity(format!(
                "機台 {} 生產數量 {} 過大：{}",
                machine.code, quantity, e
            ))
            .into());
        }

        state.plan = plan;
        Ok(self.persist(state, ()))
    }

    pub fn clear_plan(&self) -> Result<Committed<()>> {
        let mut guard = self.try_state()?;
        guard.plan.clear();
        Ok(self.persist(&guard, ()))
    }

    /// 需求與缺料預覽，不異動任何狀態
    ///
    /// 需求彙總溢位時回傳 [`FinalizeError::QuantityOverflow`]。
    pub fn preview(&self) -> Result<Preview> {
        let state = self.read_state();
        let requirements = RequirementCalculator::compute(&state.plan, &state.catalog)?;
        let shortages = AvailabilityChecker::check(&requirements, &state.lots);
        Ok(Preview {
            requirements,
            shortages,
        })
    }

    /// 生產結案
    ///
    /// 成功時批次與成品庫存整體替換、清空計劃並寫入稽核紀錄；
    /// 失敗時狀態完全不變。
    pub fn finalize_production(
        &self,
        date: NaiveDate,
        mode: &AllocationMode,
    ) -> Result<Committed<AuditRecord>> {
        let attempt = Uuid::new_v4();
        let span = tracing::info_span!("finalize_production", %attempt);
        let _entered = span.enter();

        let mut guard = self.try_state()?;
        let state = &mut *guard;
        state.config.production_dates.validate(date, today())?;

        let outcome = ProductionFinalizer::finalize(
            &state.plan,
            &state.lots,
            &state.catalog,
            &state.machine_stock,
            mode,
        )?;

        let payload = outcome.to_payload(date);
        state.lots = outcome.lots;
        state.machine_stock = outcome.machine_stock;
        state.plan.clear();
        let record = state
            .history
            .append(AuditPayload::Production(payload), &mut state.ids, Utc::now())
            .clone();
        tracing::info!("生產已入帳，稽核紀錄 {}", record.id);

        Ok(self.persist(state, record))
    }

    // ---- 設定 ----

    /// 設置低庫存門檻（danger 超過 warn 時壓回 warn）
    pub fn set_thresholds(&self, warn: u64, danger: u64) -> Result<Committed<Thresholds>> {
        let mut guard = self.try_state()?;
        let thresholds = Thresholds::new(warn, danger);
        guard.config.thresholds = thresholds;
        Ok(self.persist(&guard, thresholds))
    }

    // ---- 查詢 ----

    pub fn lots(&self) -> Vec<Lot> {
        self.read_state().lots.clone()
    }

    pub fn machine_stock(&self) -> Vec<MachineStock> {
        self.read_state().machine_stock.clone()
    }

    pub fn catalog(&self) -> Catalog {
        self.read_state().catalog.clone()
    }

    pub fn plan(&self) -> Vec<ProductionPlanItem> {
        self.read_state().plan.clone()
    }

    pub fn pending_delivery(&self) -> PendingDelivery {
        self.read_state().pending_delivery.clone()
    }

    pub fn config(&self) -> EngineConfig {
        self.read_state().config.clone()
    }

    /// 稽核紀錄，最新在前
    pub fn history(&self) -> Vec<AuditRecord> {
        self.read_state().history.records()
    }

    /// 供應商對某零件的報價，未報價時為 0
    pub fn quoted_price(&self, supplier: &str, sku: &str) -> Decimal {
        self.read_state()
            .catalog
            .quoted_price(supplier, &PartKey::new(sku))
    }

    pub fn stock_summary(&self) -> StockSummary {
        let state = self.read_state();
        StockSummary::build(&state.lots, &state.catalog, &state.config.thresholds)
    }

    /// 目前狀態的快照
    pub fn snapshot(&self) -> Snapshot {
        self.read_state().to_snapshot()
    }
}
