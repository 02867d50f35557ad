//! Dosing frequency normalisation.

use fhir::{PeriodUnit, TimingRepeat};

/// Number of administrations per day for `frequency` doses every `period` `unit`.
///
/// Hourly schedules scale to 24 hours. A daily schedule with period 1 is taken as is. Every
/// other schedule (every other day, weekly, per minute, ...) counts as once a day.
pub fn times_per_day(frequency: u32, period: f64, unit: PeriodUnit) -> f64 {
    match unit {
        PeriodUnit::Hour if period > 0.0 => 24.0 / period * f64::from(frequency),
        PeriodUnit::Day if period == 1.0 => f64::from(frequency),
        _ => 1.0,
    }
}

/// [`times_per_day`] for an optional `Timing.repeat`. Without a period and unit the dose is taken
/// once a day.
pub fn times_per_day_for(repeat: Option<&TimingRepeat>) -> f64 {
    match repeat {
        Some(TimingRepeat {
            frequency,
            period: Some(period),
            period_unit: Some(unit),
        }) => times_per_day(*frequency, *period, *unit),
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hourly_schedules_scale_to_a_day() {
        assert_eq!(times_per_day(1, 8.0, PeriodUnit::Hour), 3.0);
        assert_eq!(times_per_day(2, 12.0, PeriodUnit::Hour), 4.0);
        assert_eq!(times_per_day(1, 1.0, PeriodUnit::Hour), 24.0);
    }

    #[test]
    fn daily_schedule_uses_frequency() {
        assert_eq!(times_per_day(3, 1.0, PeriodUnit::Day), 3.0);
    }

    #[test]
    fn other_schedules_count_once() {
        assert_eq!(times_per_day(1, 2.0, PeriodUnit::Day), 1.0);
        assert_eq!(times_per_day(1, 1.0, PeriodUnit::Week), 1.0);
        assert_eq!(times_per_day(4, 1.0, PeriodUnit::Minute), 1.0);
        assert_eq!(times_per_day(1, 0.0, PeriodUnit::Hour), 1.0);
    }

    #[test]
    fn missing_timing_counts_once() {
        assert_eq!(times_per_day_for(None), 1.0);
        let no_unit = TimingRepeat {
            frequency: 2,
            period: Some(1.0),
            period_unit: None,
        };
        assert_eq!(times_per_day_for(Some(&no_unit)), 1.0);
        let every_8h = TimingRepeat {
            frequency: 1,
            period: Some(8.0),
            period_unit: Some(PeriodUnit::Hour),
        };
        assert_eq!(times_per_day_for(Some(&every_8h)), 3.0);
    }
}
