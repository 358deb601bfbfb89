use std::collections::BTreeMap;

use shared::types::Shortfall;

use crate::domain::input::NormalizedInput;

/// Estimated average shift length used to turn the hours fund into a
/// daily headcount.
pub const AVG_SHIFT_HOURS: f64 = 9.5;

/// Per-day staffing requirements after overrides and availability
/// capping, plus the shortfall records for the capped days.
#[derive(Debug, Clone)]
pub struct StaffingPlan {
    /// Open day -> required staff. Closed days are absent.
    pub required: BTreeMap<u32, u32>,
    pub shortfalls: Vec<Shortfall>,
}

impl StaffingPlan {
    pub fn required_on(&self, day: u32) -> u32 {
        self.required.get(&day).copied().unwrap_or(0)
    }
}

/// Baseline requirement for one day, before heavy-day bumps and
/// special-day overrides.
fn baseline_staff(input: &NormalizedInput, day: u32, avg_staff: f64) -> u32 {
    if !input.config.auto_staffing {
        return input.config.default_staff_count;
    }

    if input.config.busy_weekends {
        // Friday through Sunday carry the weekend bump.
        if input.weekday(day) >= 4 {
            (avg_staff * 1.2).ceil() as u32
        } else {
            ((avg_staff * 0.9).floor() as u32).max(2)
        }
    } else {
        avg_staff.round() as u32
    }
}

/// Computes the staffing requirement for every open day of the month.
///
/// Demand that exceeds the available headcount is clamped, and the
/// deficit is recorded rather than raised: understaffing is a result,
/// not an error.
#[tracing::instrument(skip(input))]
pub fn estimate(input: &NormalizedInput) -> StaffingPlan {
    let total_fund: f64 = input
        .employees
        .iter()
        .map(|employee| employee.hours_fund)
        .sum();
    let avg_staff = total_fund / (AVG_SHIFT_HOURS * f64::from(input.num_days));

    let mut required = BTreeMap::new();
    let mut shortfalls = Vec::new();

    for day in input.open_days() {
        let mut staff = baseline_staff(input, day, avg_staff);

        if let Some(&extra) = input.heavy_days.get(&day) {
            staff += extra;
        }

        if let Some(override_staff) = input.day_class(day).staff_override() {
            staff = override_staff;
        }

        let available = input.available_count(day);
        if staff > available {
            let deficit = staff - available;
            tracing::warn!(day, needed = staff, available, deficit, "Understaffed day");
            shortfalls.push(Shortfall {
                day,
                needed: staff,
                available,
                deficit,
            });
            staff = available;
        }

        required.insert(day, staff);
    }

    StaffingPlan {
        required,
        shortfalls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::input::normalize;
    use shared::types::{
        EmployeeSpec, HeavyDay, PenaltyWeights, ScheduleRequest, SolverConfig, SpecialDay,
        SpecialDayType,
    };
    use std::collections::{BTreeMap, BTreeSet};

    fn employee(name: &str, hours_fund: f64) -> EmployeeSpec {
        EmployeeSpec {
            name: name.to_string(),
            role: String::new(),
            contract_type: 1.0,
            hours_fund: Some(hours_fund),
            unavailable_days: BTreeSet::new(),
            vacation_days: BTreeSet::new(),
        }
    }

    // December 2025: 31 days, the 1st is a Monday.
    fn request(employees: Vec<EmployeeSpec>) -> ScheduleRequest {
        ScheduleRequest {
            year: 2025,
            month: 12,
            full_time_hours: 184.0,
            employees,
            heavy_days: BTreeMap::new(),
            special_days: BTreeMap::new(),
            closed_holidays: BTreeSet::new(),
            open_holidays: BTreeSet::new(),
            config: SolverConfig::default(),
            weights: PenaltyWeights::default(),
        }
    }

    #[test]
    fn baseline_rounds_the_fund_average() {
        // 4 x 184h over 31 days at 9.5h/shift: avg ~2.50 -> 2 per day.
        let employees = (0..4).map(|i| employee(&format!("E{i}"), 184.0)).collect();
        let input = normalize(&request(employees)).unwrap();
        let plan = estimate(&input);

        assert!(plan.shortfalls.is_empty());
        assert!(plan.required.values().all(|&staff| staff == 2));
    }

    #[test]
    fn busy_weekends_split_the_week() {
        let employees = (0..4).map(|i| employee(&format!("E{i}"), 184.0)).collect();
        let mut req = request(employees);
        req.config.busy_weekends = true;
        let input = normalize(&req).unwrap();
        let plan = estimate(&input);

        // avg ~2.50: Fri-Sun ceil(avg * 1.2) = 3, Mon-Thu max(2, floor(avg * 0.9)) = 2.
        assert_eq!(plan.required_on(5), 3); // Friday
        assert_eq!(plan.required_on(7), 3); // Sunday
        assert_eq!(plan.required_on(1), 2); // Monday
        assert_eq!(plan.required_on(4), 2); // Thursday
    }

    #[test]
    fn busy_weekday_floor_is_at_least_two() {
        // Single employee: avg far below 2, weekday floor still 2 deep,
        // then clamped to the one available person.
        let input = normalize(&{
            let mut req = request(vec![employee("Solo", 184.0)]);
            req.config.busy_weekends = true;
            req
        })
        .unwrap();
        let plan = estimate(&input);

        assert_eq!(plan.required_on(1), 1);
        let monday = plan
            .shortfalls
            .iter()
            .find(|shortfall| shortfall.day == 1)
            .unwrap();
        assert_eq!(monday.needed, 2);
        assert_eq!(monday.available, 1);
        assert_eq!(monday.deficit, 1);
    }

    #[test]
    fn manual_staffing_uses_default_staff_count() {
        let employees = (0..4).map(|i| employee(&format!("E{i}"), 184.0)).collect();
        let mut req = request(employees);
        req.config.auto_staffing = false;
        req.config.default_staff_count = 2;
        let input = normalize(&req).unwrap();
        let plan = estimate(&input);

        assert!(plan.required.values().all(|&staff| staff == 2));
    }

    #[test]
    fn heavy_day_bump_applies() {
        let employees = (0..4).map(|i| employee(&format!("E{i}"), 184.0)).collect();
        let mut req = request(employees);
        req.heavy_days.insert(13, HeavyDay { extra_staff: 1 });
        let input = normalize(&req).unwrap();
        let plan = estimate(&input);

        assert_eq!(plan.required_on(13), 3);
        assert_eq!(plan.required_on(12), 2);
    }

    #[test]
    fn staff_override_wins_over_heavy_bump() {
        let employees = (0..4).map(|i| employee(&format!("E{i}"), 184.0)).collect();
        let mut req = request(employees);
        req.heavy_days.insert(13, HeavyDay { extra_staff: 2 });
        req.special_days.insert(
            13,
            SpecialDay {
                day_type: SpecialDayType::Normal,
                open: None,
                close: None,
                staff: Some(1),
            },
        );
        let input = normalize(&req).unwrap();
        let plan = estimate(&input);

        assert_eq!(plan.required_on(13), 1);
    }

    #[test]
    fn closed_days_have_no_requirement() {
        let employees = (0..4).map(|i| employee(&format!("E{i}"), 184.0)).collect();
        let mut req = request(employees);
        req.closed_holidays.insert(25);
        let input = normalize(&req).unwrap();
        let plan = estimate(&input);

        assert_eq!(plan.required_on(25), 0);
        assert!(!plan.required.contains_key(&25));
    }

    #[test]
    fn absences_cause_shortfall_records() {
        let mut employees: Vec<EmployeeSpec> =
            (0..3).map(|i| employee(&format!("E{i}"), 184.0)).collect();
        employees[0].vacation_days.insert(10);
        employees[1].unavailable_days.insert(10);

        let mut req = request(employees);
        req.config.auto_staffing = false;
        req.config.default_staff_count = 3;
        let input = normalize(&req).unwrap();
        let plan = estimate(&input);

        assert_eq!(plan.required_on(10), 1);
        assert_eq!(
            plan.shortfalls,
            vec![Shortfall {
                day: 10,
                needed: 3,
                available: 1,
                deficit: 2
            }]
        );
    }
}
