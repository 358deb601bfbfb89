use std::collections::BTreeMap;

use shared::time::format_hhmm;
use shared::types::{EmployeeStats, ScheduleResponse, ShiftRecord};

use crate::domain::demand::StaffingPlan;
use crate::domain::input::NormalizedInput;
use crate::domain::paid_hours::PaidHours;
use crate::domain::templates::ShiftTemplate;
use crate::error::SolverServiceError;
use crate::solver::driver::SolveOutcome;

/// Maps a solver outcome back into the wire-level schedule.
///
/// Statuses without a solution still produce a response: the status,
/// the solver metrics, and the shortfall records survive; the schedule
/// and stats stay empty.
pub fn project(
    outcome: &SolveOutcome,
    input: &NormalizedInput,
    templates: &BTreeMap<u32, Vec<ShiftTemplate>>,
    paid: &[PaidHours],
    staffing: &StaffingPlan,
) -> Result<ScheduleResponse, SolverServiceError> {
    let mut response = ScheduleResponse {
        status: outcome.status,
        solve_time_seconds: outcome.wall_time.as_secs_f64(),
        best_bound: outcome.best_bound,
        objective_value: outcome.objective_value,
        schedule: BTreeMap::new(),
        employees: Vec::new(),
        understaffed: staffing.shortfalls.clone(),
    };

    if !outcome.status.has_solution() {
        return Ok(response);
    }

    // (employee index, day) -> chosen template.
    let mut chosen_by_employee: Vec<BTreeMap<u32, &ShiftTemplate>> =
        vec![BTreeMap::new(); input.employees.len()];

    for key in &outcome.chosen {
        let template = templates
            .get(&key.day)
            .and_then(|day_templates| day_templates.get(key.template))
            .ok_or_else(|| {
                SolverServiceError::Internal(format!(
                    "chosen variable references unknown template {} on day {}",
                    key.template, key.day
                ))
            })?;
        let employee = chosen_by_employee.get_mut(key.employee).ok_or_else(|| {
            SolverServiceError::Internal(format!(
                "chosen variable references unknown employee index {}",
                key.employee
            ))
        })?;
        if employee.insert(key.day, template).is_some() {
            return Err(SolverServiceError::Internal(format!(
                "employee {} was assigned two shifts on day {}",
                key.employee, key.day
            )));
        }

        let record = ShiftRecord {
            start: format_hhmm(template.start),
            end: format_hhmm(template.end),
            kind: template.kind,
            duration: template.duration,
        };
        response
            .schedule
            .entry(key.day)
            .or_default()
            .insert(input.employees[key.employee].name.clone(), record);
    }

    for (index, employee) in input.employees.iter().enumerate() {
        let mut worked = 0.0;
        let mut opens = 0;
        let mut closes = 0;
        let mut middle = 0;
        for template in chosen_by_employee[index].values() {
            worked += template.duration;
            if template.kind.is_opening() {
                opens += 1;
            }
            if template.kind.is_closing() {
                closes += 1;
            }
            if !template.kind.is_opening() && !template.kind.is_closing() {
                middle += 1;
            }
        }

        let paid_off = paid[index].hours;
        let total = worked + paid_off;
        let target = employee.hours_fund;
        response.employees.push(EmployeeStats {
            name: employee.name.clone(),
            worked,
            paid_off,
            total,
            target,
            diff: total - target,
            opens,
            closes,
            middle,
        });
    }

    Ok(response)
}
