use std::collections::{BTreeMap, BTreeSet};

use shared::time::parse_hhmm;
use shared::types::{PenaltyWeights, ScheduleRequest, SolverConfig, SpecialDayType};

use crate::domain::calendar::{self, DayClass};
use crate::error::SolverServiceError;

/// A special-day entry with its time strings parsed once, up front.
#[derive(Debug, Clone, Copy)]
pub struct ParsedSpecialDay {
    pub day_type: SpecialDayType,
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub staff: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct NormalizedEmployee {
    pub name: String,
    pub role: String,
    pub contract_type: f64,
    /// Monthly target hours, always filled after normalization.
    pub hours_fund: f64,
    pub unavailable_days: BTreeSet<u32>,
    pub vacation_days: BTreeSet<u32>,
}

impl NormalizedEmployee {
    /// Whether the employee can be rostered on the given day at all.
    pub fn is_available(&self, day: u32) -> bool {
        !self.unavailable_days.contains(&day) && !self.vacation_days.contains(&day)
    }
}

/// Validated, fully-resolved scheduling input. Everything downstream of
/// the normalizer consumes this instead of the raw request.
#[derive(Debug, Clone)]
pub struct NormalizedInput {
    pub year: i32,
    pub month: u32,
    pub num_days: u32,
    pub employees: Vec<NormalizedEmployee>,
    pub closed_holidays: BTreeSet<u32>,
    pub special_days: BTreeMap<u32, ParsedSpecialDay>,
    /// day -> extra staff required on top of the estimate.
    pub heavy_days: BTreeMap<u32, u32>,
    /// Day classes indexed by `day - 1`.
    pub day_classes: Vec<DayClass>,
    pub config: SolverConfig,
    pub weights: PenaltyWeights,
}

impl NormalizedInput {
    pub fn day_class(&self, day: u32) -> &DayClass {
        &self.day_classes[(day - 1) as usize]
    }

    /// Days the shop is open, in order.
    pub fn open_days(&self) -> impl Iterator<Item = u32> + '_ {
        (1..=self.num_days).filter(|&day| !self.day_class(day).is_closed())
    }

    /// Weekday of a day of this month, 0 = Monday.
    pub fn weekday(&self, day: u32) -> u32 {
        // Day indices were validated against the month in `normalize`.
        calendar::weekday(self.year, self.month, day).unwrap_or(0)
    }

    /// Headcount not unavailable and not on vacation on the given day.
    pub fn available_count(&self, day: u32) -> u32 {
        self.employees
            .iter()
            .filter(|employee| employee.is_available(day))
            .count() as u32
    }

    /// Indices of employees whose role satisfies the manager requirement.
    pub fn manager_indices(&self) -> Vec<usize> {
        self.employees
            .iter()
            .enumerate()
            .filter(|(_, employee)| self.config.manager_roles.contains(&employee.role))
            .map(|(index, _)| index)
            .collect()
    }
}

/// Validates the request and resolves every derived quantity the
/// pipeline needs: target hours, parsed times, day classes.
///
/// Fails fast with `InvalidInput`; nothing is built from a request that
/// does not validate.
#[tracing::instrument(skip(request), fields(year = request.year, month = request.month))]
pub fn normalize(request: &ScheduleRequest) -> Result<NormalizedInput, SolverServiceError> {
    let num_days = calendar::days_in_month(request.year, request.month).ok_or_else(|| {
        SolverServiceError::invalid(format!(
            "{}-{:02} is not a valid calendar month",
            request.year, request.month
        ))
    })?;

    let check_day = |day: u32, context: &str| {
        if day == 0 || day > num_days {
            Err(SolverServiceError::invalid(format!(
                "day {day} in {context} is outside 1..={num_days}"
            )))
        } else {
            Ok(())
        }
    };

    let default_open = parse_hhmm(&request.config.default_open_time)?;
    let default_close = parse_hhmm(&request.config.default_close_time)?;

    let mut employees = Vec::with_capacity(request.employees.len());
    for spec in &request.employees {
        if spec.contract_type <= 0.0 {
            return Err(SolverServiceError::invalid(format!(
                "employee {:?} has non-positive contract fraction {}",
                spec.name, spec.contract_type
            )));
        }
        for &day in &spec.unavailable_days {
            check_day(day, &format!("unavailable_days of {:?}", spec.name))?;
        }
        for &day in &spec.vacation_days {
            check_day(day, &format!("vacation_days of {:?}", spec.name))?;
        }

        let hours_fund = spec
            .hours_fund
            .unwrap_or(request.full_time_hours * spec.contract_type);

        employees.push(NormalizedEmployee {
            name: spec.name.clone(),
            role: spec.role.clone(),
            contract_type: spec.contract_type,
            hours_fund,
            unavailable_days: spec.unavailable_days.clone(),
            vacation_days: spec.vacation_days.clone(),
        });
    }

    for &day in &request.closed_holidays {
        check_day(day, "closed_holidays")?;
    }
    for &day in &request.open_holidays {
        check_day(day, "open_holidays")?;
    }

    let mut special_days = BTreeMap::new();
    for (&day, entry) in &request.special_days {
        check_day(day, "special_days")?;
        let open = entry.open.as_deref().map(parse_hhmm).transpose()?;
        let close = entry.close.as_deref().map(parse_hhmm).transpose()?;
        special_days.insert(
            day,
            ParsedSpecialDay {
                day_type: entry.day_type,
                open,
                close,
                staff: entry.staff,
            },
        );
    }

    let mut heavy_days = BTreeMap::new();
    for (&day, entry) in &request.heavy_days {
        check_day(day, "heavy_days")?;
        if entry.extra_staff < 0 {
            return Err(SolverServiceError::invalid(format!(
                "heavy day {day} has negative extra_staff {}",
                entry.extra_staff
            )));
        }
        heavy_days.insert(day, entry.extra_staff as u32);
    }

    let day_classes = (1..=num_days)
        .map(|day| {
            calendar::classify_day(
                day,
                &request.closed_holidays,
                special_days.get(&day),
                default_open,
                default_close,
            )
        })
        .collect();

    tracing::debug!(
        employees = employees.len(),
        num_days,
        "Normalized scheduling input"
    );

    Ok(NormalizedInput {
        year: request.year,
        month: request.month,
        num_days,
        employees,
        closed_holidays: request.closed_holidays.clone(),
        special_days,
        heavy_days,
        day_classes,
        config: request.config.clone(),
        weights: request.weights,
    })
}
