//! Outer-joined data table and pairwise correlation

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::core::series::NamedSeriesSet;

/// The union of all present series, one column per label, one row per
/// date, most recent row first. Absent series contribute no column.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTable {
    pub labels: Vec<String>,
    pub rows: Vec<(NaiveDate, Vec<Option<f64>>)>,
}

impl MergedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finite cell values of one column paired with their row index.
    fn column(&self, index: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter_map(move |(row, (_, cells))| {
                cells[index].filter(|v| v.is_finite()).map(|v| (row, v))
            })
    }
}

/// Square Pearson correlation over the merged columns. `None` cells mean
/// the coefficient is undefined (fewer than two paired observations, or
/// zero variance).
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}

/// Merges all present series in the set (outer join on dates) and computes
/// the correlation matrix over the merged columns.
pub fn assemble(set: &NamedSeriesSet) -> (MergedTable, CorrelationMatrix) {
    let present: Vec<_> = set
        .iter()
        .filter_map(|(label, outcome)| outcome.series().map(|series| (label, series)))
        .collect();

    let mut dates = BTreeSet::new();
    for (_, series) in &present {
        dates.extend(series.dates());
    }

    let labels: Vec<String> = present.iter().map(|(label, _)| label.to_string()).collect();
    let rows: Vec<_> = dates
        .into_iter()
        .rev()
        .map(|date| {
            let cells = present
                .iter()
                .map(|(_, series)| series.value_at(date))
                .collect();
            (date, cells)
        })
        .collect();

    let table = MergedTable { labels, rows };
    let matrix = correlation_matrix(&table);
    (table, matrix)
}

/// Pearson coefficient over two equal-length samples. `None` when there
/// are fewer than two points or either side has zero variance.
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..x.len() {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Rows where both columns have a finite value, as two aligned samples.
fn paired_observations(table: &MergedTable, i: usize, j: usize) -> (Vec<f64>, Vec<f64>) {
    let mut x = Vec::new();
    let mut y = Vec::new();
    let right: std::collections::HashMap<usize, f64> = table.column(j).collect();
    for (row, value) in table.column(i) {
        if let Some(other) = right.get(&row) {
            x.push(value);
            y.push(*other);
        }
    }
    (x, y)
}

fn correlation_matrix(table: &MergedTable) -> CorrelationMatrix {
    let n = table.labels.len();
    let mut cells = vec![vec![None; n]; n];

    for i in 0..n {
        for j in i..n {
            let (x, y) = paired_observations(table, i, j);
            let value = if i == j {
                // Self-correlation is 1.0 by definition when defined at all
                pearson(&x, &y).map(|_| 1.0)
            } else {
                pearson(&x, &y)
            };
            cells[i][j] = value;
            cells[j][i] = value;
        }
    }

    CorrelationMatrix {
        labels: table.labels.clone(),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::series::{AbsenceReason, NamedSeriesSet, SeriesOutcome, TimeSeries};
    use chrono::Datelike;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn present(points: Vec<(NaiveDate, f64)>) -> SeriesOutcome {
        SeriesOutcome::Series(TimeSeries::from_points(points))
    }

    #[test]
    fn test_merge_outer_joins_and_reverses() {
        let mut set = NamedSeriesSet::new();
        set.insert("A", present(vec![(date(1), 1.0), (date(2), 2.0)]));
        set.insert("B", present(vec![(date(2), 20.0), (date(3), 30.0)]));

        let (table, _) = assemble(&set);

        assert_eq!(table.labels, vec!["A", "B"]);
        assert_eq!(
            table.rows,
            vec![
                (date(3), vec![None, Some(30.0)]),
                (date(2), vec![Some(2.0), Some(20.0)]),
                (date(1), vec![Some(1.0), None]),
            ]
        );
    }

    #[test]
    fn test_absent_series_excluded_from_columns() {
        let mut set = NamedSeriesSet::new();
        set.insert("A", present(vec![(date(1), 1.0)]));
        set.insert("B", SeriesOutcome::Absent(AbsenceReason::NoData));

        let (table, matrix) = assemble(&set);
        assert_eq!(table.labels, vec!["A"]);
        assert_eq!(matrix.labels, vec!["A"]);
    }

    #[test]
    fn test_full_overlap_has_no_missing_cells() {
        let days: Vec<_> = (2..=31)
            .map(|d| date(d))
            .filter(|d| {
                use chrono::Datelike;
                d.weekday().number_from_monday() <= 5
            })
            .collect();
        let mut set = NamedSeriesSet::new();
        set.insert(
            "DXY",
            present(days.iter().map(|d| (*d, 100.0 + d.day() as f64)).collect()),
        );
        set.insert(
            "EURUSD=X",
            present(days.iter().map(|d| (*d, 1.0 + d.day() as f64 / 100.0)).collect()),
        );

        let (table, _) = assemble(&set);

        assert_eq!(table.rows.len(), days.len());
        // Most recent first
        assert_eq!(table.rows.first().unwrap().0, *days.last().unwrap());
        assert!(
            table
                .rows
                .iter()
                .all(|(_, cells)| cells.iter().all(|c| c.is_some()))
        );
    }

    #[test]
    fn test_correlation_diagonal_and_symmetry() {
        let mut set = NamedSeriesSet::new();
        set.insert(
            "A",
            present(vec![(date(1), 1.0), (date(2), 2.0), (date(3), 3.0)]),
        );
        set.insert(
            "B",
            present(vec![(date(1), 6.0), (date(2), 4.0), (date(3), 2.0)]),
        );

        let (_, matrix) = assemble(&set);

        assert_eq!(matrix.cells[0][0], Some(1.0));
        assert_eq!(matrix.cells[1][1], Some(1.0));
        assert_eq!(matrix.cells[0][1], matrix.cells[1][0]);
        // Perfectly anti-correlated
        assert!((matrix.cells[0][1].unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_uses_only_paired_rows() {
        let mut set = NamedSeriesSet::new();
        set.insert(
            "A",
            present(vec![
                (date(1), 1.0),
                (date(2), 2.0),
                (date(3), 3.0),
                (date(4), 100.0),
            ]),
        );
        // B misses date 4, so A's outlier there cannot affect the pairing
        set.insert(
            "B",
            present(vec![(date(1), 2.0), (date(2), 4.0), (date(3), 6.0)]),
        );

        let (_, matrix) = assemble(&set);
        assert!((matrix.cells[0][1].unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_variance_column_is_undefined() {
        let mut set = NamedSeriesSet::new();
        set.insert(
            "FLAT",
            present(vec![(date(1), 5.0), (date(2), 5.0), (date(3), 5.0)]),
        );
        set.insert(
            "B",
            present(vec![(date(1), 1.0), (date(2), 2.0), (date(3), 3.0)]),
        );

        let (_, matrix) = assemble(&set);
        assert_eq!(matrix.cells[0][0], None);
        assert_eq!(matrix.cells[0][1], None);
        assert_eq!(matrix.cells[1][1], Some(1.0));
    }

    #[test]
    fn test_single_paired_observation_is_undefined() {
        let mut set = NamedSeriesSet::new();
        set.insert("A", present(vec![(date(1), 1.0)]));
        set.insert("B", present(vec![(date(1), 2.0)]));

        let (_, matrix) = assemble(&set);
        assert_eq!(matrix.cells[0][1], None);
    }

    #[test]
    fn test_non_finite_cells_skipped_in_pairing() {
        let mut set = NamedSeriesSet::new();
        set.insert(
            "A",
            present(vec![
                (date(1), 1.0),
                (date(2), 2.0),
                (date(3), 3.0),
                (date(4), f64::INFINITY),
            ]),
        );
        set.insert(
            "B",
            present(vec![
                (date(1), 2.0),
                (date(2), 4.0),
                (date(3), 6.0),
                (date(4), 1.0),
            ]),
        );

        let (table, matrix) = assemble(&set);
        // The non-finite cell still appears in the merged table
        assert!(table.rows[0].1[0].is_some());
        assert!((matrix.cells[0][1].unwrap() - 1.0).abs() < 1e-9);
    }
}
