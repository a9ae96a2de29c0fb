use crate::types::BusStop;

/// Per-stop daily arrival totals plus the citywide maximum, computed once
/// after loading and used to normalize heatmap intensity.
#[derive(Debug, Clone)]
pub struct ArrivalStats {
    daily_totals: Vec<u32>,
    max_daily: u32,
}

impl ArrivalStats {
    pub fn compute(stops: &[BusStop]) -> Self {
        let daily_totals: Vec<u32> = stops
            .iter()
            .map(|stop| stop.arrivals_per_hour.iter().sum())
            .collect();
        let max_daily = daily_totals.iter().copied().max().unwrap_or(0);

        ArrivalStats {
            daily_totals,
            max_daily,
        }
    }

    pub fn max_daily(&self) -> u32 {
        self.max_daily
    }

    /// Daily arrival total for the stop at `stop_index` (payload order).
    pub fn daily_total(&self, stop_index: usize) -> u32 {
        self.daily_totals[stop_index]
    }

    /// Normalized arrival intensity in [0, 1]. When the citywide maximum is
    /// zero (no stops, or all-zero schedules) this is 0.0, never NaN.
    pub fn intensity(&self, stop_index: usize) -> f64 {
        if self.max_daily == 0 {
            return 0.0;
        }
        f64::from(self.daily_totals[stop_index]) / f64::from(self.max_daily)
    }
}
