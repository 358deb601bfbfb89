pub mod driver;
pub mod model;
pub mod projector;

use shared::types::{ScheduleRequest, ScheduleResponse};

use crate::domain::{demand, input, paid_hours, templates};
use crate::error::SolverServiceError;
use driver::SolverLimits;

/// Solves one month end to end: normalize, credit paid hours, generate
/// templates, estimate demand, build the model, drive the back-end,
/// and project the solution.
#[tracing::instrument(skip(request, limits), fields(year = request.year, month = request.month))]
pub fn solve_month(
    request: &ScheduleRequest,
    limits: &SolverLimits,
) -> Result<ScheduleResponse, SolverServiceError> {
    let input = input::normalize(request)?;

    let paid: Vec<_> = input
        .employees
        .iter()
        .map(|employee| paid_hours::paid_hours(employee, &input.closed_holidays, &input.special_days))
        .collect();

    let templates = templates::generate_for_month(&input);
    let staffing = demand::estimate(&input);

    let model = model::build(&input, &paid, &templates, &staffing)?;
    let outcome = driver::solve(model, limits)?;

    tracing::info!(status = ?outcome.status, "Solve finished");

    projector::project(&outcome, &input, &templates, &paid, &staffing)
}
