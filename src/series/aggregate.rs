//! Per-disease seasonal aggregation.
//!
//! Raw rows are grouped by `(disease_id, year, season_order)` and their counts
//! summed. Grouping through a `BTreeMap` makes the output order the sort key
//! itself, so row order in the input file never leaks into the series.

use std::collections::BTreeMap;

use crate::domain::{IncidenceRecord, SeriesPoint};
use crate::error::AppError;
use crate::series::encoder::DiseaseEncoder;

/// Sum counts per (disease, year, season), sorted by that key.
///
/// Groups whose sum is zero are kept.
pub fn aggregate(records: &[IncidenceRecord], encoder: &DiseaseEncoder) -> Result<Vec<SeriesPoint>, AppError> {
    let mut groups: BTreeMap<(usize, i32, u8), u64> = BTreeMap::new();

    for r in records {
        let disease_id = encoder.encode(&r.disease).ok_or_else(|| {
            AppError::schema(format!("Unknown disease '{}' (not present in the label encoder).", r.disease))
        })?;
        *groups
            .entry((disease_id, r.year, r.season.order()))
            .or_insert(0) += u64::from(r.count);
    }

    Ok(groups
        .into_iter()
        .map(|((disease_id, year, season_order), summed_count)| SeriesPoint {
            disease_id,
            year,
            season_order,
            summed_count,
        })
        .collect())
}

/// Split sorted series points into one count sequence per disease.
///
/// Diseases appear in first-encountered order; within a disease the input
/// order (chronological, per `aggregate`) is preserved.
pub fn series_by_disease(points: &[SeriesPoint]) -> Vec<(usize, Vec<f64>)> {
    let mut out: Vec<(usize, Vec<f64>)> = Vec::new();
    for p in points {
        // Sorted input means the match is almost always the last entry.
        match out.iter_mut().rev().find(|(id, _)| *id == p.disease_id) {
            Some((_, vals)) => vals.push(p.summed_count as f64),
            None => out.push((p.disease_id, vec![p.summed_count as f64])),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Season;
    use chrono::NaiveDate;

    fn rec(disease: &str, year: i32, season: Season, count: u32) -> IncidenceRecord {
        IncidenceRecord {
            date: NaiveDate::from_ymd_opt(year, season.month(), 1).unwrap(),
            state: "Delhi".to_string(),
            disease: disease.to_string(),
            count,
            year,
            month: season.month(),
            season,
        }
    }

    #[test]
    fn sums_and_sorts_by_disease_year_season() {
        let records = vec![
            rec("Malaria", 2020, Season::Winter, 4),
            rec("Fever", 2021, Season::Spring, 1),
            rec("Fever", 2020, Season::Winter, 2),
            rec("Fever", 2020, Season::Spring, 3),
            rec("Fever", 2020, Season::Winter, 5),
        ];
        let encoder = DiseaseEncoder::from_records(&records);
        let points = aggregate(&records, &encoder).unwrap();

        let keys: Vec<(usize, i32, u8, u64)> = points
            .iter()
            .map(|p| (p.disease_id, p.year, p.season_order, p.summed_count))
            .collect();
        assert_eq!(
            keys,
            vec![
                (0, 2020, 0, 3), // Fever, Spring
                (0, 2020, 3, 7), // Fever, Winter sorts last within the year
                (0, 2021, 0, 1),
                (1, 2020, 3, 4), // Malaria
            ]
        );
    }

    #[test]
    fn row_order_does_not_matter_and_zero_sums_survive() {
        let mut records = vec![
            rec("Cold", 2020, Season::Summer, 0),
            rec("Cold", 2020, Season::Autumn, 6),
            rec("Cold", 2020, Season::Summer, 0),
        ];
        let encoder = DiseaseEncoder::from_records(&records);
        let forward = aggregate(&records, &encoder).unwrap();
        records.reverse();
        let backward = aggregate(&records, &encoder).unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 2);
        assert_eq!(forward[0].summed_count, 0);
    }

    #[test]
    fn unknown_disease_is_schema_error() {
        let records = vec![rec("Cold", 2020, Season::Summer, 1)];
        let encoder = DiseaseEncoder::fit(["Fever"]);
        let err = aggregate(&records, &encoder).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Schema);
    }

    #[test]
    fn series_grouping_keeps_encounter_order() {
        let points = vec![
            SeriesPoint { disease_id: 2, year: 2020, season_order: 0, summed_count: 1 },
            SeriesPoint { disease_id: 2, year: 2020, season_order: 1, summed_count: 2 },
            SeriesPoint { disease_id: 0, year: 2020, season_order: 0, summed_count: 9 },
        ];
        let series = series_by_disease(&points);
        assert_eq!(series, vec![(2, vec![1.0, 2.0]), (0, vec![9.0])]);
    }
}
