use chrono::{Datelike, NaiveDate};

use crate::domain::input::ParsedSpecialDay;
use shared::types::SpecialDayType;
use std::collections::BTreeSet;

/// Number of days in the given calendar month, or `None` for an
/// invalid year/month pair.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next_first.signed_duration_since(first).num_days() as u32)
}

/// Weekday of a day of month, 0 = Monday .. 6 = Sunday.
pub fn weekday(year: i32, month: u32, day: u32) -> Option<u32> {
    NaiveDate::from_ymd_opt(year, month, day).map(|date| date.weekday().num_days_from_monday())
}

/// Resolved classification of one day of the month.
///
/// Classes are mutually exclusive. Heavy-day staffing bumps are not a
/// class; they stack on top of whatever class the day has.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DayClass {
    /// Shop closed; no shifts, everyone credited.
    Closed,
    /// Open with reduced hours; everyone credited a full day.
    ShortPaid { open: f64, close: f64 },
    /// Open with reduced hours, no credit.
    ShortUnpaid { open: f64, close: f64 },
    /// Open with custom hours and/or a staffing override.
    OpenSpecial {
        open: f64,
        close: f64,
        staff: Option<u32>,
    },
    /// Default opening window.
    Normal { open: f64, close: f64 },
}

impl DayClass {
    /// The day's opening window, or `None` when closed.
    pub fn window(&self) -> Option<(f64, f64)> {
        match *self {
            Self::Closed => None,
            Self::ShortPaid { open, close }
            | Self::ShortUnpaid { open, close }
            | Self::OpenSpecial { open, close, .. }
            | Self::Normal { open, close } => Some((open, close)),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Staffing override attached to the day, if any.
    pub fn staff_override(&self) -> Option<u32> {
        match *self {
            Self::OpenSpecial { staff, .. } => staff,
            _ => None,
        }
    }
}

/// Classifies one day from the closed-holiday set and its parsed
/// special-day entry, falling back to the default opening window.
pub fn classify_day(
    day: u32,
    closed_holidays: &BTreeSet<u32>,
    special: Option<&ParsedSpecialDay>,
    default_open: f64,
    default_close: f64,
) -> DayClass {
    if closed_holidays.contains(&day) {
        return DayClass::Closed;
    }

    let Some(special) = special else {
        return DayClass::Normal {
            open: default_open,
            close: default_close,
        };
    };

    let open = special.open.unwrap_or(default_open);
    let close = special.close.unwrap_or(default_close);

    match special.day_type {
        SpecialDayType::HolidayClosed => DayClass::Closed,
        SpecialDayType::HolidayShortPaid => DayClass::ShortPaid { open, close },
        SpecialDayType::HolidayShortUnpaid => DayClass::ShortUnpaid { open, close },
        SpecialDayType::Normal => DayClass::OpenSpecial {
            open,
            close,
            staff: special.staff,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn special(
        day_type: SpecialDayType,
        open: Option<f64>,
        close: Option<f64>,
        staff: Option<u32>,
    ) -> ParsedSpecialDay {
        ParsedSpecialDay {
            day_type,
            open,
            close,
            staff,
        }
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2025, 1), Some(31));
        assert_eq!(days_in_month(2025, 2), Some(28));
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2025, 12), Some(31));
        assert_eq!(days_in_month(2025, 13), None);
    }

    #[test]
    fn weekday_is_monday_based() {
        // 2025-12-01 is a Monday
        assert_eq!(weekday(2025, 12, 1), Some(0));
        assert_eq!(weekday(2025, 12, 7), Some(6));
    }

    #[test]
    fn closed_holiday_wins_over_special_entry() {
        let closed: BTreeSet<u32> = [25].into_iter().collect();
        let entry = special(SpecialDayType::Normal, Some(9.0), None, Some(3));
        let class = classify_day(25, &closed, Some(&entry), 8.5, 21.0);
        assert_eq!(class, DayClass::Closed);
        assert_eq!(class.window(), None);
    }

    #[test]
    fn short_paid_day_uses_custom_hours() {
        let closed = BTreeSet::new();
        let entry = special(SpecialDayType::HolidayShortPaid, Some(8.5), Some(14.0), None);
        let class = classify_day(24, &closed, Some(&entry), 8.5, 21.0);
        assert_eq!(
            class,
            DayClass::ShortPaid {
                open: 8.5,
                close: 14.0
            }
        );
    }

    #[test]
    fn override_day_keeps_staff_and_defaults_missing_times() {
        let closed = BTreeSet::new();
        let entry = special(SpecialDayType::Normal, None, Some(18.0), Some(5));
        let class = classify_day(10, &closed, Some(&entry), 8.5, 21.0);
        assert_eq!(
            class,
            DayClass::OpenSpecial {
                open: 8.5,
                close: 18.0,
                staff: Some(5)
            }
        );
        assert_eq!(class.staff_override(), Some(5));
    }

    #[test]
    fn plain_day_is_normal() {
        let closed = BTreeSet::new();
        let class = classify_day(3, &closed, None, 8.5, 21.0);
        assert_eq!(
            class,
            DayClass::Normal {
                open: 8.5,
                close: 21.0
            }
        );
    }
}
