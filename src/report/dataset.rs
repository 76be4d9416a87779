//! Dataset sanity checks and descriptive analysis.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{IncidenceRecord, Season};
use crate::error::AppError;
use crate::math::{Summary, summarize};

/// Distinct years a (state, disease) pair needs to be usable for windowing.
pub const MIN_YEARS_PER_PAIR: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub rows: usize,
    pub year_min: i32,
    pub year_max: i32,
    pub rows_per_year: Vec<(i32, usize)>,
    pub total_pairs: usize,
    /// (state, disease) pairs observed in at least `MIN_YEARS_PER_PAIR` distinct years.
    pub qualified_pairs: Vec<(String, String)>,
    /// Distinct years observed per (state, disease) pair, sorted by state then disease.
    pub pair_coverage: Vec<(String, String, usize)>,
    pub count_summary: Summary,
}

pub fn check_dataset(records: &[IncidenceRecord]) -> Result<CheckReport, AppError> {
    let first = records
        .first()
        .ok_or_else(|| AppError::data("Dataset has no rows to check."))?;

    let mut rows_per_year: BTreeMap<i32, usize> = BTreeMap::new();
    let mut pair_years: BTreeMap<(&str, &str), BTreeSet<i32>> = BTreeMap::new();
    let (mut year_min, mut year_max) = (first.year, first.year);

    for r in records {
        *rows_per_year.entry(r.year).or_insert(0) += 1;
        pair_years
            .entry((r.state.as_str(), r.disease.as_str()))
            .or_default()
            .insert(r.year);
        year_min = year_min.min(r.year);
        year_max = year_max.max(r.year);
    }

    let counts: Vec<f64> = records.iter().map(|r| f64::from(r.count)).collect();
    let count_summary =
        summarize(&counts).ok_or_else(|| AppError::data("Dataset has no finite counts to summarize."))?;

    let qualified_pairs = pair_years
        .iter()
        .filter(|(_, years)| years.len() >= MIN_YEARS_PER_PAIR)
        .map(|((state, disease), _)| (state.to_string(), disease.to_string()))
        .collect();
    let pair_coverage = pair_years
        .iter()
        .map(|((state, disease), years)| (state.to_string(), disease.to_string(), years.len()))
        .collect();

    Ok(CheckReport {
        rows: records.len(),
        year_min,
        year_max,
        rows_per_year: rows_per_year.into_iter().collect(),
        total_pairs: pair_years.len(),
        qualified_pairs,
        pair_coverage,
        count_summary,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// Total count per disease, largest first (ties by name).
    pub disease_totals: Vec<(String, u64)>,
    /// Total count per (disease, year), sorted by disease then year.
    pub yearly_totals: Vec<(String, i32, u64)>,
    /// Distribution of row counts per season, in time-axis order.
    pub seasonal: Vec<(Season, Summary)>,
}

pub fn analyze_dataset(records: &[IncidenceRecord]) -> Result<AnalysisReport, AppError> {
    if records.is_empty() {
        return Err(AppError::data("Dataset has no rows to analyze."));
    }

    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    let mut yearly: BTreeMap<(&str, i32), u64> = BTreeMap::new();
    let mut by_season: BTreeMap<u8, (Season, Vec<f64>)> = BTreeMap::new();

    for r in records {
        *totals.entry(r.disease.as_str()).or_insert(0) += u64::from(r.count);
        *yearly.entry((r.disease.as_str(), r.year)).or_insert(0) += u64::from(r.count);
        by_season
            .entry(r.season.order())
            .or_insert_with(|| (r.season, Vec::new()))
            .1
            .push(f64::from(r.count));
    }

    let mut disease_totals: Vec<(String, u64)> =
        totals.into_iter().map(|(d, t)| (d.to_string(), t)).collect();
    disease_totals.sort_by(|a, b| b.1.cmp(&a.1));

    let yearly_totals = yearly
        .into_iter()
        .map(|((d, y), t)| (d.to_string(), y, t))
        .collect();

    let seasonal = by_season
        .into_values()
        .filter_map(|(season, counts)| summarize(&counts).map(|s| (season, s)))
        .collect();

    Ok(AnalysisReport {
        disease_totals,
        yearly_totals,
        seasonal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(state: &str, disease: &str, year: i32, season: Season, count: u32) -> IncidenceRecord {
        IncidenceRecord {
            date: NaiveDate::from_ymd_opt(year, season.month(), 3).unwrap(),
            state: state.to_string(),
            disease: disease.to_string(),
            count,
            year,
            month: season.month(),
            season,
        }
    }

    #[test]
    fn check_counts_years_and_qualified_pairs() {
        let mut records = Vec::new();
        for year in 2016..2020 {
            records.push(rec("Delhi", "Fever", year, Season::Winter, 10));
        }
        records.push(rec("Delhi", "Cold", 2016, Season::Spring, 2));
        records.push(rec("Delhi", "Cold", 2017, Season::Spring, 4));

        let report = check_dataset(&records).unwrap();
        assert_eq!(report.rows, 6);
        assert_eq!((report.year_min, report.year_max), (2016, 2019));
        assert_eq!(report.rows_per_year, vec![(2016, 2), (2017, 2), (2018, 1), (2019, 1)]);
        assert_eq!(report.total_pairs, 2);
        assert_eq!(report.qualified_pairs, vec![("Delhi".to_string(), "Fever".to_string())]);
        assert_eq!(
            report.pair_coverage,
            vec![
                ("Delhi".to_string(), "Cold".to_string(), 2),
                ("Delhi".to_string(), "Fever".to_string(), 4),
            ]
        );
        assert_eq!(report.count_summary.max, 10.0);
    }

    #[test]
    fn analysis_totals_and_seasons() {
        let records = vec![
            rec("Delhi", "Fever", 2020, Season::Winter, 10),
            rec("Goa", "Fever", 2021, Season::Spring, 5),
            rec("Delhi", "Cold", 2020, Season::Winter, 20),
            rec("Delhi", "Allergy", 2020, Season::Spring, 15),
        ];
        let report = analyze_dataset(&records).unwrap();

        assert_eq!(
            report.disease_totals,
            vec![("Cold".to_string(), 20), ("Allergy".to_string(), 15), ("Fever".to_string(), 15)]
        );
        assert_eq!(report.yearly_totals.len(), 4);
        assert_eq!(report.yearly_totals[2], ("Fever".to_string(), 2020, 10));

        let seasons: Vec<Season> = report.seasonal.iter().map(|(s, _)| *s).collect();
        assert_eq!(seasons, vec![Season::Spring, Season::Winter]);
        assert_eq!(report.seasonal[1].1.n, 2);
    }

    #[test]
    fn empty_dataset_is_data_error() {
        assert!(check_dataset(&[]).is_err());
        assert!(analyze_dataset(&[]).is_err());
    }
}
