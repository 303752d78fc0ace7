use crate::domain::HistoricalRecord;

/// Average units per calendar month, January first, rounded to whole kWh.
/// Months without data are 0.
pub fn seasonal_profile(history: &[HistoricalRecord]) -> [f64; 12] {
    let mut totals = [0.0_f64; 12];
    let mut counts = [0_u32; 12];
    for record in history {
        let idx = (record.period.month() - 1) as usize;
        totals[idx] += record.units_consumed;
        counts[idx] += 1;
    }

    let mut profile = [0.0; 12];
    for (slot, (total, count)) in profile.iter_mut().zip(totals.iter().zip(counts)) {
        if count > 0 {
            *slot = (total / f64::from(count)).round();
        }
    }
    profile
}
