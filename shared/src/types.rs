use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

// region: Request Types

/// One month of scheduling input: the calendar, the staff, and the knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub year: i32,
    pub month: u32,
    /// Monthly hours baseline for a contract fraction of 1.0.
    #[serde(default = "default_full_time_hours")]
    pub full_time_hours: f64,
    pub employees: Vec<EmployeeSpec>,
    /// Days with extra expected footfall, keyed by day of month.
    #[serde(default)]
    pub heavy_days: BTreeMap<u32, HeavyDay>,
    /// Days with a special type, custom hours, or a staffing override.
    #[serde(default)]
    pub special_days: BTreeMap<u32, SpecialDay>,
    /// Days the shop is fully closed; everyone is credited.
    #[serde(default)]
    pub closed_holidays: BTreeSet<u32>,
    /// Holidays the shop stays open on. Informational only.
    #[serde(default)]
    pub open_holidays: BTreeSet<u32>,
    #[serde(default)]
    pub config: SolverConfig,
    #[serde(default)]
    pub weights: PenaltyWeights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeSpec {
    pub name: String,
    #[serde(default)]
    pub role: String,
    /// Contract fraction, 0 < c <= 1.0 for a full-timer.
    #[serde(default = "default_contract_type")]
    pub contract_type: f64,
    /// Monthly target hours. Defaults to `full_time_hours * contract_type`.
    #[serde(default)]
    pub hours_fund: Option<f64>,
    #[serde(default)]
    pub unavailable_days: BTreeSet<u32>,
    #[serde(default)]
    pub vacation_days: BTreeSet<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HeavyDay {
    #[serde(default)]
    pub extra_staff: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialDay {
    #[serde(rename = "type", default)]
    pub day_type: SpecialDayType,
    /// Custom opening time, "HH:MM".
    #[serde(default)]
    pub open: Option<String>,
    /// Custom closing time, "HH:MM".
    #[serde(default)]
    pub close: Option<String>,
    /// Overrides the estimated staffing requirement for the day.
    #[serde(default)]
    pub staff: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpecialDayType {
    /// Open with reduced hours; everyone is credited a full day.
    HolidayShortPaid,
    /// Open with reduced hours, no credit.
    HolidayShortUnpaid,
    /// Shop closed; everyone is credited.
    HolidayClosed,
    #[default]
    Normal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Derive staffing demand from the total hours fund. When off,
    /// `default_staff_count` is used as the per-day baseline instead.
    #[serde(default = "default_true")]
    pub auto_staffing: bool,
    #[serde(default = "default_staff_count")]
    pub default_staff_count: u32,
    /// Treat Friday through Sunday as busier than the rest of the week.
    #[serde(default)]
    pub busy_weekends: bool,
    #[serde(default = "default_min_duty")]
    pub min_openers: u32,
    #[serde(default = "default_min_duty")]
    pub min_closers: u32,
    #[serde(default = "default_duty_ratio")]
    pub open_ratio: f64,
    #[serde(default = "default_duty_ratio")]
    pub close_ratio: f64,
    /// Roles that satisfy the manager-on-Mondays requirement. Empty
    /// disables the requirement.
    #[serde(default = "default_manager_roles")]
    pub manager_roles: Vec<String>,
    #[serde(default = "default_open_time")]
    pub default_open_time: String,
    #[serde(default = "default_close_time")]
    pub default_close_time: String,
    /// Penalize closing one day and opening the next.
    #[serde(default = "default_true")]
    pub enable_clopen_ban: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            auto_staffing: default_true(),
            default_staff_count: default_staff_count(),
            busy_weekends: false,
            min_openers: default_min_duty(),
            min_closers: default_min_duty(),
            open_ratio: default_duty_ratio(),
            close_ratio: default_duty_ratio(),
            manager_roles: default_manager_roles(),
            default_open_time: default_open_time(),
            default_close_time: default_close_time(),
            enable_clopen_ban: default_true(),
        }
    }
}

/// Objective weights. All terms are integral, so these stay integers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PenaltyWeights {
    #[serde(default = "default_work_hours_weight")]
    pub work_hours: i64,
    #[serde(default = "default_day_shape_weight")]
    pub day_shape: i64,
    #[serde(default = "default_shift_cost_weight")]
    pub shift_cost: i64,
    #[serde(default = "default_fairness_weight")]
    pub open_close_fairness: i64,
    #[serde(default = "default_clopen_weight")]
    pub clopen: i64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            work_hours: default_work_hours_weight(),
            day_shape: default_day_shape_weight(),
            shift_cost: default_shift_cost_weight(),
            open_close_fairness: default_fairness_weight(),
            clopen: default_clopen_weight(),
        }
    }
}

fn default_full_time_hours() -> f64 {
    184.0
}

fn default_contract_type() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_staff_count() -> u32 {
    4
}

fn default_min_duty() -> u32 {
    1
}

fn default_duty_ratio() -> f64 {
    0.4
}

fn default_manager_roles() -> Vec<String> {
    vec![
        "manager".to_string(),
        "deputy".to_string(),
        "supervisor".to_string(),
    ]
}

fn default_open_time() -> String {
    "08:30".to_string()
}

fn default_close_time() -> String {
    "21:00".to_string()
}

fn default_work_hours_weight() -> i64 {
    1000
}

fn default_day_shape_weight() -> i64 {
    80
}

fn default_shift_cost_weight() -> i64 {
    5
}

fn default_fairness_weight() -> i64 {
    3
}

fn default_clopen_weight() -> i64 {
    15
}

// endregion: Request Types

// region: Response Types

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverStatus {
    Optimal,
    Feasible,
    Infeasible,
    ModelInvalid,
    Unknown,
}

impl SolverStatus {
    /// True when the solver produced an assignment worth projecting.
    pub fn has_solution(self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }

    /// The wire-level status name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Optimal => "OPTIMAL",
            Self::Feasible => "FEASIBLE",
            Self::Infeasible => "INFEASIBLE",
            Self::ModelInvalid => "MODEL_INVALID",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftKind {
    /// Starts at the day's opening time.
    Open,
    /// Ends at the day's closing time.
    Close,
    /// Strictly inside the day; neither opens nor closes.
    Flex,
    /// A single whole-day shift used on very short days.
    Fixed,
}

impl ShiftKind {
    pub fn is_opening(self) -> bool {
        matches!(self, Self::Open | Self::Fixed)
    }

    pub fn is_closing(self) -> bool {
        matches!(self, Self::Close | Self::Fixed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub status: SolverStatus,
    pub solve_time_seconds: f64,
    pub best_bound: f64,
    pub objective_value: f64,
    /// day -> employee name -> assigned shift.
    pub schedule: BTreeMap<u32, BTreeMap<String, ShiftRecord>>,
    pub employees: Vec<EmployeeStats>,
    pub understaffed: Vec<Shortfall>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShiftRecord {
    pub start: String,
    pub end: String,
    #[serde(rename = "type")]
    pub kind: ShiftKind,
    pub duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeStats {
    pub name: String,
    /// Hours on the floor.
    pub worked: f64,
    /// Credited hours for holidays and vacation.
    pub paid_off: f64,
    pub total: f64,
    pub target: f64,
    pub diff: f64,
    pub opens: u32,
    pub closes: u32,
    pub middle: u32,
}

/// A day where demand exceeded the available headcount and the
/// requirement was clamped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shortfall {
    pub day: u32,
    pub needed: u32,
    pub available: u32,
    pub deficit: u32,
}

// endregion: Response Types

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_request_fills_defaults() {
        let json = r#"{
            "year": 2025,
            "month": 12,
            "employees": [{"name": "Ana"}]
        }"#;

        let request: ScheduleRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.full_time_hours, 184.0);
        assert_eq!(request.employees[0].contract_type, 1.0);
        assert!(request.employees[0].hours_fund.is_none());
        assert!(request.config.auto_staffing);
        assert_eq!(request.config.min_openers, 1);
        assert_eq!(request.config.default_open_time, "08:30");
        assert_eq!(request.weights.work_hours, 1000);
        assert_eq!(request.weights.clopen, 15);
    }

    #[test]
    fn special_day_types_use_snake_case() {
        let json = r#"{"type": "holiday_short_paid", "open": "08:30", "close": "14:00"}"#;
        let day: SpecialDay = serde_json::from_str(json).unwrap();
        assert_eq!(day.day_type, SpecialDayType::HolidayShortPaid);
        assert_eq!(day.staff, None);
    }

    #[test]
    fn statuses_and_kinds_use_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&SolverStatus::ModelInvalid).unwrap(),
            "\"MODEL_INVALID\""
        );
        assert_eq!(
            serde_json::to_string(&ShiftKind::Open).unwrap(),
            "\"OPEN\""
        );
    }

    #[test]
    fn fixed_shifts_open_and_close() {
        assert!(ShiftKind::Fixed.is_opening());
        assert!(ShiftKind::Fixed.is_closing());
        assert!(!ShiftKind::Flex.is_opening());
        assert!(!ShiftKind::Flex.is_closing());
    }
}
