use std::collections::{BTreeMap, BTreeSet};

use rand::{Rng, SeedableRng, rngs::StdRng};

use shared::types::{
    EmployeeSpec, HeavyDay, PenaltyWeights, ScheduleRequest, SolverConfig, SpecialDay,
    SpecialDayType,
};

/// Builds a small boutique-style month for `--demo` runs: four staff,
/// a vacation block, one heavy Saturday, and a short-paid holiday.
///
/// The same seed always produces the same request.
pub fn demo_request(seed: u64) -> ScheduleRequest {
    let mut rng = StdRng::seed_from_u64(seed);

    let staff = [
        ("Mara", "manager", 1.0),
        ("Dani", "assistant", 1.0),
        ("Iva", "assistant", 0.75),
        ("Petr", "assistant", 0.5),
    ];

    let mut employees: Vec<EmployeeSpec> = staff
        .iter()
        .map(|&(name, role, contract_type)| EmployeeSpec {
            name: name.to_string(),
            role: role.to_string(),
            contract_type,
            hours_fund: None,
            unavailable_days: BTreeSet::new(),
            vacation_days: BTreeSet::new(),
        })
        .collect();

    // One assistant takes a week off somewhere mid-month.
    let vacationer = rng.gen_range(1..employees.len());
    let vacation_start = rng.gen_range(5..=20u32);
    employees[vacationer].vacation_days = (vacation_start..vacation_start + 7).collect();

    // Someone else is out for a scattered day or two.
    let absent = rng.gen_range(1..employees.len());
    employees[absent]
        .unavailable_days
        .insert(rng.gen_range(1..=28u32));

    // October 2025: the 4th is the first Saturday.
    let heavy_saturday = 4 + 7 * rng.gen_range(0..4u32);
    let heavy_days: BTreeMap<u32, HeavyDay> =
        [(heavy_saturday, HeavyDay { extra_staff: 1 })].into();

    let special_days: BTreeMap<u32, SpecialDay> = [(
        28u32,
        SpecialDay {
            day_type: SpecialDayType::HolidayShortPaid,
            open: Some("09:00".to_string()),
            close: Some("14:00".to_string()),
            staff: None,
        },
    )]
    .into();

    let mut config = SolverConfig::default();
    config.busy_weekends = true;
    config.default_open_time = "09:00".to_string();
    config.default_close_time = "17:00".to_string();

    ScheduleRequest {
        year: 2025,
        month: 10,
        full_time_hours: 184.0,
        employees,
        heavy_days,
        special_days,
        closed_holidays: BTreeSet::new(),
        open_holidays: BTreeSet::new(),
        config,
        weights: PenaltyWeights::default(),
    }
}
