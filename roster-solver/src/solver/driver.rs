use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use good_lp::{ResolutionError, Solution, SolverModel, microlp};

use shared::types::SolverStatus;

use crate::error::SolverServiceError;
use crate::solver::model::{AssignmentKey, ScheduleModel};

/// Environment variable overriding the solver wall-clock limit.
pub const TIME_LIMIT_ENV: &str = "SCHEDULER_SOLVER_TIME_LIMIT_SECONDS";

const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(300);
const DEFAULT_RELATIVE_GAP: f64 = 0.05;

/// Stop conditions for one solve. Read from the environment once at
/// the edge and passed down explicitly.
#[derive(Debug, Clone, Copy)]
pub struct SolverLimits {
    pub time_limit: Duration,
    /// Relative optimality gap at which search may stop early. The
    /// bundled back-end proves optimality, so it stops at gap zero;
    /// the knob is kept for back-ends that can return early.
    pub relative_gap: f64,
}

impl Default for SolverLimits {
    fn default() -> Self {
        Self {
            time_limit: DEFAULT_TIME_LIMIT,
            relative_gap: DEFAULT_RELATIVE_GAP,
        }
    }
}

impl SolverLimits {
    /// Limits with the time limit taken from `SCHEDULER_SOLVER_TIME_LIMIT_SECONDS`.
    pub fn from_env() -> Self {
        let time_limit = std::env::var(TIME_LIMIT_ENV)
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or(DEFAULT_TIME_LIMIT, Duration::from_secs);
        Self {
            time_limit,
            ..Self::default()
        }
    }
}

/// What came back from the back-end.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolverStatus,
    pub wall_time: Duration,
    pub objective_value: f64,
    pub best_bound: f64,
    /// Assignment keys whose indicator was set, in creation order.
    pub chosen: Vec<AssignmentKey>,
}

impl SolveOutcome {
    fn without_solution(status: SolverStatus, wall_time: Duration) -> Self {
        Self {
            status,
            wall_time,
            objective_value: 0.0,
            best_bound: 0.0,
            chosen: Vec::new(),
        }
    }
}

enum WorkerReport {
    Solved {
        chosen: Vec<AssignmentKey>,
        objective_value: f64,
    },
    Infeasible,
    Invalid(String),
}

/// Runs the model through the MILP back-end under the configured
/// limits.
///
/// The solve happens on a dedicated worker thread and the driver
/// enforces the wall clock itself: if the deadline passes with no
/// result the status is `UNKNOWN` and the abandoned worker's result is
/// discarded when it eventually arrives.
#[tracing::instrument(skip(model), fields(time_limit = ?limits.time_limit))]
pub fn solve(model: ScheduleModel, limits: &SolverLimits) -> Result<SolveOutcome, SolverServiceError> {
    let started = Instant::now();
    let (sender, receiver) = mpsc::channel();

    thread::spawn(move || {
        let report = run_backend(model);
        // The receiver is gone if the driver already timed out.
        let _ = sender.send(report);
    });

    match receiver.recv_timeout(limits.time_limit) {
        Ok(report) => {
            let wall_time = started.elapsed();
            let outcome = match report {
                WorkerReport::Solved {
                    chosen,
                    objective_value,
                } => {
                    tracing::info!(
                        objective_value,
                        chosen = chosen.len(),
                        ?wall_time,
                        "Solver proved optimality"
                    );
                    SolveOutcome {
                        status: SolverStatus::Optimal,
                        wall_time,
                        objective_value,
                        // Proven optimum: the bound meets the objective.
                        best_bound: objective_value,
                        chosen,
                    }
                }
                WorkerReport::Infeasible => {
                    tracing::warn!(?wall_time, "Model is infeasible");
                    SolveOutcome::without_solution(SolverStatus::Infeasible, wall_time)
                }
                WorkerReport::Invalid(message) => {
                    tracing::error!(%message, "Back-end rejected the model");
                    SolveOutcome::without_solution(SolverStatus::ModelInvalid, wall_time)
                }
            };
            Ok(outcome)
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            tracing::warn!(?limits.time_limit, "Solver hit the wall-clock limit with no solution");
            Ok(SolveOutcome::without_solution(
                SolverStatus::Unknown,
                limits.time_limit,
            ))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(SolverServiceError::Internal(
            "solver worker terminated without reporting a result".to_string(),
        )),
    }
}

fn run_backend(model: ScheduleModel) -> WorkerReport {
    let ScheduleModel {
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
    } = model;

    let mut solver_model = problem.minimise(objective).using(microlp);
    for constraint in constraints {
        solver_model = solver_model.with(constraint);
    }

    match solver_model.solve() {
        Ok(solution) => {
            let chosen = assignments
                .iter()
                .filter(|&&(_, var)| solution.value(var) > 0.5)
                .map(|&(key, _)| key)
                .collect();

            // Reassemble the objective from the penalty registries; the
            // terms are integral, so read-back is exact.
            let integer_sum = |vars: &[good_lp::Variable]| -> f64 {
                vars.iter().map(|&var| solution.value(var).round()).sum()
            };
            let cost_sum: f64 = cost_terms
                .iter()
                .map(|&(var, cost)| solution.value(var).round() * cost as f64)
                .sum();
            let objective_value = weights.work_hours as f64 * integer_sum(&hour_deviations)
                + weights.shift_cost as f64 * cost_sum
                + weights.day_shape as f64 * integer_sum(&shape_deviations)
                + weights.open_close_fairness as f64 * integer_sum(&fairness_deviations)
                + weights.clopen as f64 * integer_sum(&clopen_indicators);

            WorkerReport::Solved {
                chosen,
                objective_value,
            }
        }
        Err(ResolutionError::Infeasible) => WorkerReport::Infeasible,
        Err(error) => WorkerReport::Invalid(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits() {
        let limits = SolverLimits::default();
        assert_eq!(limits.time_limit, Duration::from_secs(300));
        assert_eq!(limits.relative_gap, 0.05);
    }

    #[test]
    fn outcome_without_solution_is_empty() {
        let outcome =
            SolveOutcome::without_solution(SolverStatus::Infeasible, Duration::from_millis(10));
        assert_eq!(outcome.status, SolverStatus::Infeasible);
        assert!(outcome.chosen.is_empty());
        assert_eq!(outcome.objective_value, 0.0);
        assert_eq!(outcome.best_bound, 0.0);
    }
}
