use std::collections::BTreeMap;

use shared::time::to_tenths;
use shared::types::ShiftKind;

use crate::domain::input::NormalizedInput;

/// Shortest shift anyone is asked to work.
const MIN_SHIFT_HOURS: f64 = 6.0;

/// A candidate shift for one day: when it runs and how undesirable it
/// is relative to the preferred day shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftTemplate {
    pub kind: ShiftKind,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub cost: i64,
}

impl ShiftTemplate {
    /// Duration scaled by ten, the unit the model counts hours in.
    pub fn duration_tenths(&self) -> i64 {
        to_tenths(self.duration)
    }
}

/// Enumerates the legal shift templates for a day open from `open_time`
/// to `close_time`.
///
/// Very short days (6 hours or less) get a single whole-day FIXED
/// template. Otherwise three families are emitted: OPEN shifts pinned
/// to the opening, CLOSE shifts pinned to the closing, and FLEX shifts
/// strictly inside the day. Costs reward long "gold standard" shifts
/// (~9.5h) and mid-day FLEX placement.
pub fn generate(open_time: f64, close_time: f64) -> Vec<ShiftTemplate> {
    let day_length = close_time - open_time;

    if day_length <= 0.0 {
        return Vec::new();
    }

    if day_length <= MIN_SHIFT_HOURS {
        return vec![ShiftTemplate {
            kind: ShiftKind::Fixed,
            start: open_time,
            end: close_time,
            duration: day_length,
            cost: 0,
        }];
    }

    let mut templates = Vec::new();

    // Openers: 6.0 to 10.5 hours in half-hour steps.
    for half_hours in 12..=21 {
        let duration = f64::from(half_hours) * 0.5;
        let end = open_time + duration;
        if end <= close_time {
            let cost = if duration >= 9.5 {
                0
            } else if duration >= 8.0 {
                20
            } else {
                100
            };
            templates.push(ShiftTemplate {
                kind: ShiftKind::Open,
                start: open_time,
                end,
                duration,
                cost,
            });
        }
    }

    // Closers: 6.0 to 11.0 hours, never starting before the opening.
    for half_hours in 12..=22 {
        let duration = f64::from(half_hours) * 0.5;
        let start = close_time - duration;
        if start >= open_time {
            let mut cost = if duration >= 9.5 {
                0
            } else if duration >= 8.5 {
                10
            } else if duration >= 8.0 {
                50
            } else {
                100
            };
            // Half-hour starts are slightly harder to hand over.
            if start.fract() != 0.0 {
                cost += 2;
            }
            templates.push(ShiftTemplate {
                kind: ShiftKind::Close,
                start,
                end: close_time,
                duration,
                cost,
            });
        }
    }

    // Flex: whole-hour starts inside the day, ending strictly before
    // the closing so they never masquerade as closers.
    let start_min = (open_time + 1.0).ceil() as i64;
    let start_max = (close_time - MIN_SHIFT_HOURS).floor() as i64;
    for start in start_min..=start_max {
        for duration in 6..=11 {
            let start = start as f64;
            let duration = f64::from(duration);
            let end = start + duration;
            if end < close_time {
                let base_cost = if duration >= 8.0 { 0 } else { 20 };
                // Bias toward the 10:00-19:00 core of the day.
                let time_penalty = 5.0 * ((start - 10.0).abs() + (end - 19.0).abs());
                templates.push(ShiftTemplate {
                    kind: ShiftKind::Flex,
                    start,
                    end,
                    duration,
                    cost: base_cost + time_penalty as i64,
                });
            }
        }
    }

    templates
}

/// Generates templates for every open day of the month, keyed by day.
pub fn generate_for_month(input: &NormalizedInput) -> BTreeMap<u32, Vec<ShiftTemplate>> {
    let mut by_day = BTreeMap::new();
    for day in input.open_days() {
        // Open days always carry a window.
        let Some((open_time, close_time)) = input.day_class(day).window() else {
            continue;
        };
        by_day.insert(day, generate(open_time, close_time));
    }

    if let Some(max_templates) = by_day.values().map(Vec::len).max() {
        tracing::debug!(
            open_days = by_day.len(),
            max_templates,
            "Generated shift templates"
        );
    }

    by_day
}
