use std::collections::{BTreeMap, BTreeSet};

use shared::types::SpecialDayType;

use crate::domain::input::{NormalizedEmployee, ParsedSpecialDay};

/// Credited hours for one employee over the month.
#[derive(Debug, Clone, PartialEq)]
pub struct PaidHours {
    pub hours: f64,
    pub days: BTreeSet<u32>,
    /// Per-day credit the employee's contract earns.
    pub credit: f64,
}

/// Per-day credit tier by contract fraction.
pub fn credit_for_contract(contract_type: f64) -> f64 {
    if contract_type >= 1.0 {
        8.0
    } else if contract_type >= 0.75 {
        6.0
    } else {
        4.0
    }
}

/// Computes credited hours and the credited-day set for one employee.
///
/// Credited days are the union of closed holidays, short-paid holidays,
/// and vacation days, in that priority order; a day overlapping several
/// sources is credited exactly once.
pub fn paid_hours(
    employee: &NormalizedEmployee,
    closed_holidays: &BTreeSet<u32>,
    special_days: &BTreeMap<u32, ParsedSpecialDay>,
) -> PaidHours {
    let credit = credit_for_contract(employee.contract_type);

    let mut days = BTreeSet::new();
    let mut hours = 0.0;

    for &day in closed_holidays {
        if days.insert(day) {
            hours += credit;
        }
    }

    for (&day, entry) in special_days {
        if entry.day_type == SpecialDayType::HolidayShortPaid && days.insert(day) {
            hours += credit;
        }
    }

    for &day in &employee.vacation_days {
        if days.insert(day) {
            hours += credit;
        }
    }

    PaidHours {
        hours,
        days,
        credit,
    }
}
