//! Manually entered field measurements
//!
//! Physicochemical and metagenomic records typed in by the user, consumed as
//! extra chart series keyed by date and for the current-date readout. Plain
//! structured input; nothing here touches the rasters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Physicochemical record for the whole study area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaRecord {
    pub date: NaiveDate,
    pub temperature: Option<f64>,
    pub ph: Option<f64>,
    /// Field-reference NDVI, plotted against the satellite-derived series.
    pub ndvi: Option<f64>,
}

/// Probe readings at a monitoring point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitoringRecord {
    pub date: NaiveDate,
    pub temperature: Option<f64>,
    pub ph: Option<f64>,
}

/// Microbial community traits sampled at a metagenomic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetagenomicRecord {
    pub date: NaiveDate,
    pub drought_resistance: Option<f64>,
    pub fungal_protection: Option<f64>,
    pub root_growth: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaField {
    Temperature,
    Ph,
    Ndvi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitoringField {
    Temperature,
    Ph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetagenomicField {
    DroughtResistance,
    FungalProtection,
    RootGrowth,
}

/// Every manual measurement in the session, point records keyed by the
/// sample point's id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldMeasurements {
    pub areas: Vec<AreaRecord>,
    pub monitoring: BTreeMap<String, Vec<MonitoringRecord>>,
    pub metagenomic: BTreeMap<String, Vec<MetagenomicRecord>>,
}

impl FieldMeasurements {
    /// Area record for a date, for the current-date readout.
    pub fn area_at(&self, date: NaiveDate) -> Option<&AreaRecord> {
        self.areas.iter().find(|r| r.date == date)
    }

    /// Date-ordered chart series for one area field.
    pub fn area_series(&self, field: AreaField) -> Vec<(NaiveDate, f64)> {
        let mut points: Vec<_> = self
            .areas
            .iter()
            .filter_map(|r| {
                let value = match field {
                    AreaField::Temperature => r.temperature,
                    AreaField::Ph => r.ph,
                    AreaField::Ndvi => r.ndvi,
                };
                value.map(|v| (r.date, v))
            })
            .collect();
        points.sort_by_key(|(date, _)| *date);
        points
    }

    pub fn monitoring_series(
        &self,
        point_id: &str,
        field: MonitoringField,
    ) -> Vec<(NaiveDate, f64)> {
        let mut points: Vec<_> = self
            .monitoring
            .get(point_id)
            .into_iter()
            .flatten()
            .filter_map(|r| {
                let value = match field {
                    MonitoringField::Temperature => r.temperature,
                    MonitoringField::Ph => r.ph,
                };
                value.map(|v| (r.date, v))
            })
            .collect();
        points.sort_by_key(|(date, _)| *date);
        points
    }

    pub fn metagenomic_series(
        &self,
        point_id: &str,
        field: MetagenomicField,
    ) -> Vec<(NaiveDate, f64)> {
        let mut points: Vec<_> = self
            .metagenomic
            .get(point_id)
            .into_iter()
            .flatten()
            .filter_map(|r| {
                let value = match field {
                    MetagenomicField::DroughtResistance => r.drought_resistance,
                    MetagenomicField::FungalProtection => r.fungal_protection,
                    MetagenomicField::RootGrowth => r.root_growth,
                };
                value.map(|v| (r.date, v))
            })
            .collect();
        points.sort_by_key(|(date, _)| *date);
        points
    }

    /// Drop every record tied to a removed sample point.
    pub fn remove_point(&mut self, point_id: &str) {
        self.monitoring.remove(point_id);
        self.metagenomic.remove(point_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 4, day).unwrap()
    }

    #[test]
    fn test_area_series_sorted_and_filtered() {
        let measurements = FieldMeasurements {
            areas: vec![
                AreaRecord {
                    date: date(20),
                    temperature: Some(24.0),
                    ph: None,
                    ndvi: Some(0.5),
                },
                AreaRecord {
                    date: date(5),
                    temperature: Some(21.5),
                    ph: Some(6.8),
                    ndvi: None,
                },
            ],
            ..Default::default()
        };

        assert_eq!(
            measurements.area_series(AreaField::Temperature),
            vec![(date(5), 21.5), (date(20), 24.0)]
        );
        assert_eq!(measurements.area_series(AreaField::Ph), vec![(date(5), 6.8)]);
        assert_eq!(measurements.area_at(date(20)).unwrap().ndvi, Some(0.5));
        assert!(measurements.area_at(date(1)).is_none());
    }

    #[test]
    fn test_point_series_and_removal() {
        let mut measurements = FieldMeasurements::default();
        measurements.monitoring.insert(
            "point-1".to_string(),
            vec![MonitoringRecord {
                date: date(5),
                temperature: Some(19.0),
                ph: Some(7.1),
            }],
        );
        measurements.metagenomic.insert(
            "point-2".to_string(),
            vec![MetagenomicRecord {
                date: date(5),
                drought_resistance: Some(0.8),
                fungal_protection: None,
                root_growth: Some(0.3),
            }],
        );

        assert_eq!(
            measurements.monitoring_series("point-1", MonitoringField::Ph),
            vec![(date(5), 7.1)]
        );
        assert!(measurements
            .monitoring_series("missing", MonitoringField::Ph)
            .is_empty());
        assert_eq!(
            measurements.metagenomic_series("point-2", MetagenomicField::FungalProtection),
            vec![]
        );

        measurements.remove_point("point-2");
        assert!(measurements
            .metagenomic_series("point-2", MetagenomicField::RootGrowth)
            .is_empty());
    }
}
