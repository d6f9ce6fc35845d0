//! 引擎配置模型

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Result, WmsError};

/// 低庫存門檻
///
/// 不變量：`danger <= warn`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// 低於等於此值為「偏低」
    warn: u64,

    /// 低於等於此值為「危急」
    danger: u64,
}

impl Thresholds {
    /// 創建門檻，`danger` 超過 `warn` 時會被壓回 `warn`
    pub fn new(warn: u64, danger: u64) -> Self {
        Self {
            warn,
            danger: danger.min(warn),
        }
    }

    pub fn warn(&self) -> u64 {
        self.warn
    }

    pub fn danger(&self) -> u64 {
        self.danger
    }

    /// 設置偏低門檻（同時維持 danger <= warn）
    pub fn set_warn(&mut self, warn: u64) {
        self.warn = warn;
        self.danger = self.danger.min(warn);
    }

    /// 設置危急門檻（超過 warn 時壓回 warn）
    pub fn set_danger(&mut self, danger: u64) {
        self.danger = danger.min(self.warn);
    }

    /// 依總量判斷庫存等級
    pub fn classify(&self, quantity: u64) -> StockLevel {
        if quantity <= self.danger {
            StockLevel::Critical
        } else if quantity <= self.warn {
            StockLevel::Low
        } else {
            StockLevel::Ok
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::new(100, 50)
    }
}

/// 庫存等級
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockLevel {
    Ok,
    Low,
    Critical,
}

/// 業務日期允許範圍
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// 是否允許未來日期
    pub allow_future: bool,

    /// 最多可回溯的年數
    pub max_past_years: u32,
}

impl DateWindow {
    pub fn new(allow_future: bool, max_past_years: u32) -> Self {
        Self {
            allow_future,
            max_past_years,
        }
    }

    /// 以 `today` 為基準檢查日期
    pub fn validate(&self, date: NaiveDate, today: NaiveDate) -> Result<()> {
        if !self.allow_future && date > today {
            return Err(WmsError::InvalidDate(format!(
                "{} 不可晚於今天 {}",
                date, today
            )));
        }

        let earliest = today
            .checked_sub_months(Months::new(self.max_past_years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN);
        if date < earliest {
            return Err(WmsError::InvalidDate(format!(
                "{} 早於允許的最早日期 {}（最多回溯 {} 年）",
                date, earliest, self.max_past_years
            )));
        }

        Ok(())
    }
}

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 稽核紀錄保留筆數
    pub history_capacity: usize,

    /// 低庫存門檻
    pub thresholds: Thresholds,

    /// 收貨日期範圍
    pub delivery_dates: DateWindow,

    /// 生產日期範圍
    pub production_dates: DateWindow,
}

impl EngineConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            history_capacity: 200,
            thresholds: Thresholds::default(),
            delivery_dates: DateWindow::new(false, 5),
            production_dates: DateWindow::new(false, 1),
        }
    }

    /// 從 JSON 讀取配置，缺少的欄位使用預設值
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| WmsError::InvalidConfig(e.to_string()))?;
        config.validated()
    }

    /// 建構器模式：設置稽核保留筆數
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// 建構器模式：設置低庫存門檻
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// 建構器模式：設置收貨日期範圍
    pub fn with_delivery_dates(mut self, window: DateWindow) -> Self {
        self.delivery_dates = window;
        self
    }

    /// 建構器模式：設置生產日期範圍
    pub fn with_production_dates(mut self, window: DateWindow) -> Self {
        self.production_dates = window;
        self
    }

    fn validated(mut self) -> Result<Self> {
        if self.history_capacity == 0 {
            return Err(WmsError::InvalidConfig(
                "history_capacity 必須大於 0".to_string(),
            ));
        }
        // 反序列化會繞過 Thresholds::new 的壓制
        self.thresholds = Thresholds::new(self.thresholds.warn, self.thresholds.danger);
        Ok(self)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::new();

        assert_eq!(config.history_capacity, 200);
        assert_eq!(config.thresholds.warn(), 100);
        assert_eq!(config.thresholds.danger(), 50);
        assert_eq!(config.delivery_dates.max_past_years, 5);
        assert_eq!(config.production_dates.max_past_years, 1);
    }

    #[test]
    fn test_threshold_clamping() {
        let mut thresholds = Thresholds::new(30, 80);
        assert_eq!(thresholds.danger(), 30);

        thresholds.set_warn(100);
        thresholds.set_danger(60);
        assert_eq!(thresholds.danger(), 60);

        // 降低 warn 會一併壓低 danger
        thresholds.set_warn(40);
        assert_eq!(thresholds.danger(), 40);
    }

    #[rstest]
    #[case(0, StockLevel::Critical)]
    #[case(50, StockLevel::Critical)]
    #[case(51, StockLevel::Low)]
    #[case(100, StockLevel::Low)]
    #[case(101, StockLevel::Ok)]
    fn test_classify(#[case] quantity: u64, #[case] expected: StockLevel) {
        assert_eq!(Thresholds::default().classify(quantity), expected);
    }

    #[test]
    fn test_date_window() {
        let today = d(2025, 6, 15);
        let window = DateWindow::new(false, 1);

        assert!(window.validate(today, today).is_ok());
        assert!(window.validate(d(2024, 6, 15), today).is_ok());
        assert!(window.validate(d(2024, 6, 14), today).is_err());
        assert!(window.validate(d(2025, 6, 16), today).is_err());

        let future_ok = DateWindow::new(true, 1);
        assert!(future_ok.validate(d(2025, 7, 1), today).is_ok());
    }

    #[test]
    fn test_config_from_json() {
        let config =
            EngineConfig::from_json_str(r#"{"history_capacity": 50, "thresholds": {"warn": 10, "danger": 20}}"#)
                .unwrap();

        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.thresholds.danger(), 10);
        // 未指定的欄位使用預設值
        assert_eq!(config.delivery_dates, DateWindow::new(false, 5));
    }

    #[test]
    fn test_config_rejects_zero_capacity() {
        let err = EngineConfig::from_json_str(r#"{"history_capacity": 0}"#).unwrap_err();

        assert!(matches!(err, WmsError::InvalidConfig(_)));
    }
}
