//! Temporal series consumed by the chart collaborator

use crate::aggregate::Aggregate;
use crate::indices::Overlay;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Per-geometry aggregation result: `{date -> {overlay -> value}}`, kept in
/// date order.
pub type DateSeries = BTreeMap<NaiveDate, BTreeMap<Overlay, Aggregate>>;

/// Chart-ready points for one overlay: spectral means only, in date order.
///
/// Unavailable dates and the RGB diagnostic are skipped, mirroring what the
/// temporal plot actually draws.
pub fn chart_points(series: &DateSeries, overlay: Overlay) -> Vec<(NaiveDate, f64)> {
    series
        .iter()
        .filter_map(|(date, values)| {
            values
                .get(&overlay)
                .and_then(Aggregate::spectral)
                .map(|v| (*date, v))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::SpectralIndex;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 4, day).unwrap()
    }

    #[test]
    fn test_chart_points_filters_and_orders() {
        let ndvi = Overlay::Index(SpectralIndex::Ndvi);
        let mut series = DateSeries::new();
        series.insert(
            date(20),
            BTreeMap::from([(ndvi, Aggregate::Mean(0.5)), (Overlay::Rgb, Aggregate::RgbMean(120.0))]),
        );
        series.insert(date(5), BTreeMap::from([(ndvi, Aggregate::Mean(0.6))]));
        series.insert(date(12), BTreeMap::from([(ndvi, Aggregate::NotAvailable)]));

        assert_eq!(
            chart_points(&series, ndvi),
            vec![(date(5), 0.6), (date(20), 0.5)]
        );
        // the RGB diagnostic never reaches the index chart
        assert_eq!(chart_points(&series, Overlay::Rgb), vec![]);
    }
}
