use std::collections::BTreeMap;

use good_lp::{Constraint, Expression, ProblemVariables, Variable, constraint, variable, variables};

use shared::types::{PenaltyWeights, ShiftKind, SolverConfig};

use crate::domain::demand::{AVG_SHIFT_HOURS, StaffingPlan};
use crate::domain::input::NormalizedInput;
use crate::domain::paid_hours::PaidHours;
use crate::domain::templates::ShiftTemplate;
use crate::error::SolverServiceError;

/// Identifies one assignment indicator: employee `employee` works
/// template `template` of day `day`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssignmentKey {
    pub employee: usize,
    pub day: u32,
    pub template: usize,
}

/// The assembled integer program plus the registries needed to read a
/// solution back without re-deriving model structure.
pub struct ScheduleModel {
    pub problem: ProblemVariables,
    pub objective: Expression,
    pub constraints: Vec<Constraint>,
    /// Assignment variables in creation order (employee-major, then
    /// day, then template index) so back-end tie-breaks are stable.
    pub assignments: Vec<(AssignmentKey, Variable)>,
    pub weights: PenaltyWeights,
    // Penalty registries, one entry per objective term.
    pub hour_deviations: Vec<Variable>,
    pub shape_deviations: Vec<Variable>,
    pub fairness_deviations: Vec<Variable>,
    pub clopen_indicators: Vec<Variable>,
    pub cost_terms: Vec<(Variable, i64)>,
}

/// Per-day opener/closer/middle soft targets.
///
/// Ratios can over-allocate on small crews; the overflow is taken back
/// from closers first, then openers, never dropping below the hard
/// minima, and the middle target is clamped at zero.
pub(crate) fn day_shape_targets(required: u32, config: &SolverConfig) -> (u32, u32, u32) {
    let required_i = i64::from(required);
    let mut target_open = i64::from(
        config
            .min_openers
            .max((f64::from(required) * config.open_ratio).round() as u32),
    );
    let mut target_close = i64::from(
        config
            .min_closers
            .max((f64::from(required) * config.close_ratio).round() as u32),
    );

    let mut target_middle = required_i - target_open - target_close;
    if target_middle < 0 {
        let mut overflow = -target_middle;

        let reducible_close = (target_close - i64::from(config.min_closers)).max(0);
        let reduce = overflow.min(reducible_close);
        target_close -= reduce;
        overflow -= reduce;

        if overflow > 0 {
            let reducible_open = (target_open - i64::from(config.min_openers)).max(0);
            let reduce = overflow.min(reducible_open);
            target_open -= reduce;
        }

        target_middle = (required_i - target_open - target_close).max(0);
    }

    (target_open as u32, target_close as u32, target_middle as u32)
}

/// Adds a non-negative deviation variable bounded by `upper` with
/// `deviation >= |amount - target|` as two linear inequalities.
fn absolute_deviation(
    problem: &mut ProblemVariables,
    constraints: &mut Vec<Constraint>,
    amount: Expression,
    target: f64,
    upper: f64,
) -> Variable {
    let deviation = problem.add(variable().integer().min(0.0).max(upper));
    constraints.push(constraint!(amount.clone() - deviation <= target));
    constraints.push(constraint!(amount + deviation >= target));
    deviation
}

fn linear_sum(vars: impl IntoIterator<Item = Variable>) -> Expression {
    let mut sum = Expression::default();
    for var in vars {
        sum += Expression::from(var);
    }
    sum
}

/// Builds the full integer program for one month.
///
/// Variables exist only for (available employee, open day, template)
/// triples; everything else is implicitly zero.
#[tracing::instrument(skip_all)]
pub fn build(
    input: &NormalizedInput,
    paid: &[PaidHours],
    templates: &BTreeMap<u32, Vec<ShiftTemplate>>,
    staffing: &StaffingPlan,
) -> Result<ScheduleModel, SolverServiceError> {
    if paid.len() != input.employees.len() {
        return Err(SolverServiceError::Internal(format!(
            "paid-hours entries ({}) do not match employees ({})",
            paid.len(),
            input.employees.len()
        )));
    }

    let config = &input.config;
    let weights = input.weights;
    let num_days = input.num_days;

    let mut problem = variables!();
    let mut constraints = Vec::new();

    // Assignment variables, employee-major for stable ordering.
    let mut assignments = Vec::new();
    for (employee, spec) in input.employees.iter().enumerate() {
        for (&day, day_templates) in templates {
            if !spec.is_available(day) {
                continue;
            }
            for template in 0..day_templates.len() {
                let key = AssignmentKey {
                    employee,
                    day,
                    template,
                };
                assignments.push((key, problem.add(variable().binary())));
            }
        }
    }

    // (employee, day) -> (template index, variable), in template order.
    let mut per_employee_day: Vec<BTreeMap<u32, Vec<(usize, Variable)>>> =
        vec![BTreeMap::new(); input.employees.len()];
    for &(key, var) in &assignments {
        per_employee_day[key.employee]
            .entry(key.day)
            .or_default()
            .push((key.template, var));
    }

    // At most one shift per employee per day, with a worked indicator
    // tied to the day's sum for the sliding-window constraint.
    let mut worked: Vec<BTreeMap<u32, Variable>> = vec![BTreeMap::new(); input.employees.len()];
    for (employee, days) in per_employee_day.iter().enumerate() {
        for (&day, day_vars) in days {
            let day_sum = linear_sum(day_vars.iter().map(|&(_, var)| var));
            constraints.push(constraint!(day_sum.clone() <= 1.0));

            let worked_var = problem.add(variable().binary());
            constraints.push(constraint!(day_sum == worked_var));
            worked[employee].insert(day, worked_var);
        }
    }

    let manager_indices = input.manager_indices();
    let mut shape_deviations = Vec::new();

    for (&day, day_templates) in templates {
        let required = staffing.required_on(day);

        let mut day_vars = Vec::new();
        let mut openers = Vec::new();
        let mut closers = Vec::new();
        let mut middles = Vec::new();
        for days in &per_employee_day {
            let Some(day_entries) = days.get(&day) else {
                continue;
            };
            for &(template, var) in day_entries {
                day_vars.push(var);
                let kind = day_templates[template].kind;
                if kind.is_opening() {
                    openers.push(var);
                }
                if kind.is_closing() {
                    closers.push(var);
                }
                if kind == ShiftKind::Flex {
                    middles.push(var);
                }
            }
        }

        // Exact coverage at the (possibly capped) requirement.
        constraints.push(constraint!(linear_sum(day_vars) == f64::from(required)));

        // Hard floor on opening and closing duty.
        let opener_sum = linear_sum(openers);
        let closer_sum = linear_sum(closers);
        constraints.push(constraint!(
            opener_sum.clone() >= f64::from(config.min_openers)
        ));
        constraints.push(constraint!(
            closer_sum.clone() >= f64::from(config.min_closers)
        ));

        // Soft day shape around the proportional targets.
        let (target_open, target_close, target_middle) = day_shape_targets(required, config);
        let upper = f64::from(required);
        shape_deviations.push(absolute_deviation(
            &mut problem,
            &mut constraints,
            opener_sum,
            f64::from(target_open),
            upper,
        ));
        shape_deviations.push(absolute_deviation(
            &mut problem,
            &mut constraints,
            closer_sum,
            f64::from(target_close),
            upper,
        ));
        shape_deviations.push(absolute_deviation(
            &mut problem,
            &mut constraints,
            linear_sum(middles),
            f64::from(target_middle),
            upper,
        ));

        // A manager must be in on Mondays, when any can be.
        if input.weekday(day) == 0 && !manager_indices.is_empty() {
            let manager_vars: Vec<Variable> = manager_indices
                .iter()
                .filter_map(|&employee| per_employee_day[employee].get(&day))
                .flatten()
                .map(|&(_, var)| var)
                .collect();
            if !manager_vars.is_empty() {
                constraints.push(constraint!(linear_sum(manager_vars) >= 1.0));
            }
        }
    }

    // At most four worked days in any five consecutive calendar days.
    // Windows touching a closed or absent day have fewer than five
    // terms and hold trivially, so only full windows are emitted.
    for days in &worked {
        for start in 1..=num_days.saturating_sub(4) {
            let window: Vec<Variable> = (start..start + 5)
                .filter_map(|day| days.get(&day).copied())
                .collect();
            if window.len() == 5 {
                constraints.push(constraint!(linear_sum(window) <= 4.0));
            }
        }
    }

    // Soft clopen ban: closing one day and opening the next.
    let mut clopen_indicators = Vec::new();
    if config.enable_clopen_ban {
        for days in &per_employee_day {
            for day in 1..num_days {
                let (Some(today), Some(tomorrow)) = (days.get(&day), days.get(&(day + 1))) else {
                    continue;
                };
                let close_vars: Vec<Variable> = today
                    .iter()
                    .filter(|&&(template, _)| templates[&day][template].kind.is_closing())
                    .map(|&(_, var)| var)
                    .collect();
                let open_vars: Vec<Variable> = tomorrow
                    .iter()
                    .filter(|&&(template, _)| templates[&(day + 1)][template].kind.is_opening())
                    .map(|&(_, var)| var)
                    .collect();
                if close_vars.is_empty() || open_vars.is_empty() {
                    continue;
                }

                // has_close = OR(close_vars), has_open = OR(open_vars).
                let has_close = problem.add(variable().binary());
                for &var in &close_vars {
                    constraints.push(constraint!(has_close >= var));
                }
                constraints.push(constraint!(has_close <= linear_sum(close_vars)));

                let has_open = problem.add(variable().binary());
                for &var in &open_vars {
                    constraints.push(constraint!(has_open >= var));
                }
                constraints.push(constraint!(has_open <= linear_sum(open_vars)));

                // clopen = has_close AND has_open, linearized.
                let clopen = problem.add(variable().binary());
                constraints.push(constraint!(clopen >= has_close + has_open - 1.0));
                constraints.push(constraint!(clopen <= has_close));
                constraints.push(constraint!(clopen <= has_open));
                clopen_indicators.push(clopen);
            }
        }
    }

    // Fairness: balance opening and closing duty per employee, around
    // a per-employee duty target derived from the hours fund.
    let mut fairness_deviations = Vec::new();
    for (employee, days) in per_employee_day.iter().enumerate() {
        let mut opens = Vec::new();
        let mut closes = Vec::new();
        for (&day, day_entries) in days {
            for &(template, var) in day_entries {
                let kind = templates[&day][template].kind;
                if kind.is_opening() {
                    opens.push(var);
                }
                if kind.is_closing() {
                    closes.push(var);
                }
            }
        }
        let open_sum = linear_sum(opens);
        let close_sum = linear_sum(closes);
        let upper = f64::from(num_days);

        let duty_target =
            ((input.employees[employee].hours_fund / AVG_SHIFT_HOURS) / 2.0).round();
        fairness_deviations.push(absolute_deviation(
            &mut problem,
            &mut constraints,
            open_sum.clone() - close_sum.clone(),
            0.0,
            upper,
        ));
        fairness_deviations.push(absolute_deviation(
            &mut problem,
            &mut constraints,
            open_sum,
            duty_target,
            upper,
        ));
        fairness_deviations.push(absolute_deviation(
            &mut problem,
            &mut constraints,
            close_sum,
            duty_target,
            upper,
        ));
    }

    // Hour-target deviation, in tenths of an hour to stay integral.
    let mut hour_deviations = Vec::new();
    for (employee, days) in per_employee_day.iter().enumerate() {
        let mut worked_tenths = Expression::default();
        for (&day, day_entries) in days {
            for &(template, var) in day_entries {
                worked_tenths += templates[&day][template].duration_tenths() as f64 * var;
            }
        }
        let target_hours = input.employees[employee].hours_fund - paid[employee].hours;
        let target_tenths = (target_hours * 10.0).round();
        hour_deviations.push(absolute_deviation(
            &mut problem,
            &mut constraints,
            worked_tenths,
            target_tenths,
            10_000.0,
        ));
    }

    // Shift-template costs enter the objective directly.
    let mut cost_terms = Vec::new();
    for &(key, var) in &assignments {
        let cost = templates[&key.day][key.template].cost;
        if cost > 0 {
            cost_terms.push((var, cost));
        }
    }

    let mut objective = Expression::default();
    for &var in &hour_deviations {
        objective += weights.work_hours as f64 * var;
    }
    for &(var, cost) in &cost_terms {
        objective += (weights.shift_cost * cost) as f64 * var;
    }
    for &var in &shape_deviations {
        objective += weights.day_shape as f64 * var;
    }
    for &var in &fairness_deviations {
        objective += weights.open_close_fairness as f64 * var;
    }
    for &var in &clopen_indicators {
        objective += weights.clopen as f64 * var;
    }

    tracing::info!(
        assignment_vars = assignments.len(),
        constraints = constraints.len(),
        clopen_pairs = clopen_indicators.len(),
        "Built scheduling model"
    );

    Ok(ScheduleModel {
        problem,
        objective,
        constraints,
        assignments,
        weights,
        hour_deviations,
        shape_deviations,
        fairness_deviations,
        clopen_indicators,
        cost_terms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{demand, input::normalize, paid_hours, templates as template_gen};
    use shared::types::{EmployeeSpec, ScheduleRequest};
    use std::collections::BTreeSet;

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

    fn built_model(mutate: impl FnOnce(&mut ScheduleRequest)) -> ScheduleModel {
        let mut request = ScheduleRequest {
            year: 2026,
            month: 2,
            full_time_hours: 184.0,
            employees: vec![employee("Ana", 92.0), employee("Bo", 92.0)],
            heavy_days: Default::default(),
            special_days: Default::default(),
            closed_holidays: Default::default(),
            open_holidays: Default::default(),
            config: Default::default(),
            weights: Default::default(),
        };
        // Short window: one FIXED template per day keeps models tiny.
        request.config.default_close_time = "14:30".to_string();
        mutate(&mut request);

        let input = normalize(&request).unwrap();
        let paid: Vec<_> = input
            .employees
            .iter()
            .map(|employee| {
                paid_hours::paid_hours(employee, &input.closed_holidays, &input.special_days)
            })
            .collect();
        let templates = template_gen::generate_for_month(&input);
        let staffing = demand::estimate(&input);
        build(&input, &paid, &templates, &staffing).unwrap()
    }

    #[test]
    fn shape_targets_follow_ratios() {
        let config = SolverConfig::default();
        // 5 staff at 0.4/0.4: open 2, close 2, middle 1.
        assert_eq!(day_shape_targets(5, &config), (2, 2, 1));
        // 10 staff: 4/4/2.
        assert_eq!(day_shape_targets(10, &config), (4, 4, 2));
    }

    #[test]
    fn shape_targets_respect_minima_on_small_crews() {
        let config = SolverConfig::default();
        // 1 staff: both minima stand, middle clamps to zero.
        assert_eq!(day_shape_targets(1, &config), (1, 1, 0));
        assert_eq!(day_shape_targets(0, &config), (1, 1, 0));
    }

    #[test]
    fn shape_overflow_reduces_closers_first() {
        let mut config = SolverConfig::default();
        config.open_ratio = 0.6;
        config.close_ratio = 0.6;
        // 4 staff: raw targets 2/2 fill the crew exactly, middle 0.
        assert_eq!(day_shape_targets(4, &config), (2, 2, 0));

        config.open_ratio = 0.8;
        config.close_ratio = 0.8;
        // 4 staff: raw 3/3, overflow 2 taken from closers first.
        assert_eq!(day_shape_targets(4, &config), (3, 1, 0));
    }

    #[test]
    fn one_variable_per_available_employee_day_template() {
        let model = built_model(|request| {
            request.employees[0].vacation_days.insert(1);
            request.closed_holidays.insert(2);
        });
        // 28 days, one closed; Ana misses one more day.
        // One FIXED template per open day.
        assert_eq!(model.assignments.len(), 26 + 27);
    }

    #[test]
    fn fixed_only_days_produce_no_cost_terms() {
        let model = built_model(|_| {});
        assert!(model.cost_terms.is_empty());
    }

    #[test]
    fn penalty_registries_are_populated() {
        let model = built_model(|_| {});
        // Three shape deviations per open day.
        assert_eq!(model.shape_deviations.len(), 28 * 3);
        // Three fairness terms and one hour deviation per employee.
        assert_eq!(model.fairness_deviations.len(), 2 * 3);
        assert_eq!(model.hour_deviations.len(), 2);
        // FIXED templates both open and close: every adjacent open pair
        // carries a clopen indicator per employee.
        assert_eq!(model.clopen_indicators.len(), 2 * 27);
    }

    #[test]
    fn clopen_ban_can_be_disabled() {
        let model = built_model(|request| {
            request.config.enable_clopen_ban = false;
        });
        assert!(model.clopen_indicators.is_empty());
    }
}
