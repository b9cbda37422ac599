#[cfg(test)]
use super::model::{Column, ColumnKind, Value};
use super::model::{LongRecord, Ratio, RatioTable, RowSlice, Table, Tabular, TOTAL_COLUMN};
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Row slice
// ---------------------------------------------------------------------------

/// The row of `table` whose year is `year`, as ordered column → value pairs.
pub fn slice(table: &Table, year: i32) -> Result<RowSlice> {
    let row = table
        .row(year)
        .ok_or_else(|| DataError::year_not_found(table.name(), year))?;
    let entries = table
        .columns()
        .iter()
        .zip(row)
        .map(|(col, val)| (col.name.clone(), val.clone()))
        .collect();
    Ok(RowSlice { year, entries })
}

// ---------------------------------------------------------------------------
// Wide ↔ long
// ---------------------------------------------------------------------------

/// Melt a table to long format keyed by its row key.
///
/// Records come out row by row in source order, and within a row in column
/// order.
pub fn melt<T: Tabular>(table: &T) -> Vec<LongRecord<T::Cell>> {
    let columns = table.column_names();
    table
        .years()
        .iter()
        .enumerate()
        .flat_map(|(r, &year)| {
            columns
                .iter()
                .enumerate()
                .map(move |(c, name)| LongRecord {
                    id: year,
                    variable: name.to_string(),
                    value: table.cell(r, c).clone(),
                })
        })
        .collect()
}

/// Re-pivot long records into a table: years and columns in order of first
/// appearance, column kinds from the first value seen.
#[cfg(test)]
pub fn pivot(name: &str, records: &[LongRecord<Value>]) -> Result<Table> {
    let mut years: Vec<i32> = Vec::new();
    let mut columns: Vec<Column> = Vec::new();
    for rec in records {
        if !years.contains(&rec.id) {
            years.push(rec.id);
        }
        if !columns.iter().any(|c| c.name == rec.variable) {
            columns.push(Column {
                name: rec.variable.clone(),
                kind: match rec.value {
                    Value::Number(_) => ColumnKind::Numeric,
                    _ => ColumnKind::Text,
                },
            });
        }
    }

    let mut grid: Vec<Vec<Option<Value>>> = vec![vec![None; columns.len()]; years.len()];
    for rec in records {
        let r = years.iter().position(|&y| y == rec.id);
        let c = columns.iter().position(|col| col.name == rec.variable);
        if let (Some(r), Some(c)) = (r, c) {
            grid[r][c] = Some(rec.value.clone());
        }
    }

    let rows = grid
        .into_iter()
        .zip(&years)
        .map(|(cells, &year)| {
            cells
                .into_iter()
                .zip(&columns)
                .map(|(cell, col)| {
                    cell.ok_or_else(|| DataError::MissingCell {
                        table: name.to_string(),
                        year,
                        column: col.name.clone(),
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Table::from_parts(name.to_string(), years, columns, rows))
}

// ---------------------------------------------------------------------------
// Column selection
// ---------------------------------------------------------------------------

/// Copy of `table` without the named columns; absent names are ignored.
pub fn drop_columns(table: &Table, drop: &[&str]) -> Table {
    let keep: Vec<&str> = table
        .column_names()
        .into_iter()
        .filter(|name| !drop.contains(name))
        .collect();
    pick(table, &keep)
}

/// Copy of `table` with exactly the named columns, in the given order.
pub fn select_columns(table: &Table, columns: &[&str]) -> Result<Table> {
    if let Some(missing) = columns.iter().find(|c| table.column_index(c).is_none()) {
        return Err(DataError::unknown_column(table.name(), *missing));
    }
    Ok(pick(table, columns))
}

fn pick(table: &Table, columns: &[&str]) -> Table {
    let indices: Vec<usize> = columns
        .iter()
        .filter_map(|name| table.column_index(name))
        .collect();
    let cols = indices.iter().map(|&c| table.columns()[c].clone()).collect();
    let rows = (0..table.len())
        .map(|r| indices.iter().map(|&c| table.cell(r, c).clone()).collect())
        .collect();
    Table::from_parts(table.name().to_string(), table.years().to_vec(), cols, rows)
}

// ---------------------------------------------------------------------------
// Top-N by variation
// ---------------------------------------------------------------------------

/// Sum of period-over-period percentage changes of every column, in column
/// order.
///
/// The first period has no prior value and contributes nothing. A change from
/// zero follows float division: `0 → 0` is skipped, `0 → x` is infinite. A
/// column whose infinite changes have both signs scores `-inf`.
pub fn variation_scores(table: &Table) -> Result<Vec<(String, f64)>> {
    table
        .column_names()
        .into_iter()
        .map(|name| {
            let series = table.numeric_column(name)?;
            let score: f64 = series
                .windows(2)
                .map(|w| (w[1] - w[0]) / w[0])
                .filter(|change| !change.is_nan())
                .sum();
            // `+inf` and `-inf` changes cancel out to NaN: rank such a column last.
            let score = if score.is_nan() { f64::NEG_INFINITY } else { score };
            Ok::<_, DataError>((name.to_string(), score))
        })
        .collect()
}

/// Keep the `n` columns with the largest summed variation, ranked
/// descending. Ties keep their original column order.
pub fn top_n_by_variation(table: &Table, n: usize) -> Result<Table> {
    let mut scores = variation_scores(table)?;
    // `sort_by` is stable, so equal scores stay in column order.
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    let kept: Vec<&str> = scores.iter().take(n).map(|(name, _)| name.as_str()).collect();
    log::debug!("Top {n} variations of {}: {kept:?}", table.name());
    select_columns(table, &kept)
}

// ---------------------------------------------------------------------------
// Ratio of two tables
// ---------------------------------------------------------------------------

/// Cell-wise `numerator / denominator` after dropping the shared `Total`
/// column.
///
/// Both tables must carry the same columns (in any order); the result has the
/// numerator's column order and the years present in both tables. A zero
/// denominator gives [`Ratio::Undefined`].
pub fn ratio(numerator: &Table, denominator: &Table) -> Result<RatioTable> {
    let num = drop_columns(numerator, &[TOTAL_COLUMN]);
    let den = drop_columns(denominator, &[TOTAL_COLUMN]);

    let num_cols = num.column_names();
    let den_cols = den.column_names();
    let only_num: Vec<&str> = num_cols.iter().filter(|c| !den_cols.contains(c)).copied().collect();
    let only_den: Vec<&str> = den_cols.iter().filter(|c| !num_cols.contains(c)).copied().collect();
    if !only_num.is_empty() || !only_den.is_empty() {
        return Err(DataError::ShapeMismatch {
            left: numerator.name().to_string(),
            right: denominator.name().to_string(),
            detail: format!("only left: {only_num:?}, only right: {only_den:?}"),
        });
    }

    let years: Vec<i32> = num
        .years()
        .iter()
        .copied()
        .filter(|y| den.row_index(*y).is_some())
        .collect();

    let cells = years
        .iter()
        .map(|&year| {
            num_cols
                .iter()
                .map(|col| Ok(Ratio::of(num.number(year, col)?, den.number(year, col)?)))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RatioTable::new(
        format!("{} / {}", numerator.name(), denominator.name()),
        years,
        num_cols.iter().map(|c| c.to_string()).collect(),
        cells,
    ))
}

// ---------------------------------------------------------------------------
// Percentage normalization
// ---------------------------------------------------------------------------

/// Each value of a row slice as a percentage of the row sum, `Total`
/// excluded. A zero sum gives undefined shares.
pub fn row_percentages(table: &str, row: &RowSlice) -> Result<Vec<(String, Ratio)>> {
    let values = row
        .entries
        .iter()
        .filter(|(name, _)| name != TOTAL_COLUMN)
        .map(|(name, val)| {
            val.as_f64()
                .map(|v| (name.as_str(), v))
                .ok_or_else(|| DataError::non_numeric(table, name.as_str()))
        })
        .collect::<Result<Vec<_>>>()?;
    let total: f64 = values.iter().map(|(_, v)| v).sum();
    Ok(values
        .into_iter()
        .map(|(name, v)| (name.to_string(), percent(v, total)))
        .collect())
}

/// Every row of `table` as percentages of its row sum, `Total` excluded.
pub fn normalize_to_percentage(table: &Table) -> Result<RatioTable> {
    let cells = table
        .years()
        .iter()
        .map(|&year| {
            let row = slice(table, year)?;
            Ok(row_percentages(table.name(), &row)?
                .into_iter()
                .map(|(_, share)| share)
                .collect())
        })
        .collect::<Result<Vec<Vec<Ratio>>>>()?;
    let columns = table
        .column_names()
        .into_iter()
        .filter(|name| *name != TOTAL_COLUMN)
        .map(str::to_string)
        .collect();
    Ok(RatioTable::new(
        format!("{} (%)", table.name()),
        table.years().to_vec(),
        columns,
        cells,
    ))
}

fn percent(value: f64, total: f64) -> Ratio {
    match Ratio::of(value, total) {
        Ratio::Defined(share) => Ratio::Defined(share * 100.0),
        Ratio::Undefined => Ratio::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value as JsonValue};

    use super::*;
    use crate::data::model::Record;

    const EPS: f64 = 1e-9;

    fn table(name: &str, rows: JsonValue) -> Table {
        let recs: Vec<Record> = serde_json::from_value(rows).unwrap();
        Table::from_records(name, &recs).unwrap()
    }

    fn platforms() -> Table {
        table(
            "ca_data_support",
            json!([
                {"Année": 2016, "PC": 10, "Console": 20, "Mobile": 5},
                {"Année": 2017, "PC": 12, "Console": 18, "Mobile": 7}
            ]),
        )
    }

    #[test]
    fn slice_returns_requested_row() {
        let row = slice(&platforms(), 2017).unwrap();
        assert_eq!(row.year, 2017);
        let names: Vec<&str> = row.entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["PC", "Console", "Mobile"]);
        assert_eq!(row.get("PC"), Some(&Value::Number(12.0)));
        assert_eq!(row.get("Console"), Some(&Value::Number(18.0)));
        assert_eq!(row.get("Mobile"), Some(&Value::Number(7.0)));
    }

    #[test]
    fn slice_every_year_of_range() {
        let t = platforms();
        for &year in t.years() {
            assert_eq!(slice(&t, year).unwrap().year, year);
        }
    }

    #[test]
    fn slice_unknown_year_fails() {
        match slice(&platforms(), 2099) {
            Err(DataError::YearNotFound { table, year }) => {
                assert_eq!(table, "ca_data_support");
                assert_eq!(year, 2099);
            }
            other => panic!("expected YearNotFound, got {other:?}"),
        }
    }

    #[test]
    fn melt_orders_by_row_then_column() {
        let long = melt(&platforms());
        let keys: Vec<(i32, &str)> = long.iter().map(|r| (r.id, r.variable.as_str())).collect();
        assert_eq!(
            keys,
            vec![
                (2016, "PC"),
                (2016, "Console"),
                (2016, "Mobile"),
                (2017, "PC"),
                (2017, "Console"),
                (2017, "Mobile"),
            ]
        );
        assert_eq!(long[4].value, Value::Number(18.0));
    }

    #[test]
    fn melt_then_pivot_round_trips() {
        let t = table(
            "mixed",
            json!([
                {"Année": 2019, "Label": "x", "A": 1.5, "B": 0},
                {"Année": 2018, "Label": "y", "A": 2, "B": -3}
            ]),
        );
        let back = pivot("mixed", &melt(&t)).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn pivot_reports_holes() {
        let mut long = melt(&platforms());
        long.remove(1);
        assert!(matches!(
            pivot("holes", &long),
            Err(DataError::MissingCell { year: 2016, .. })
        ));
    }

    #[test]
    fn drop_and_select_columns() {
        let t = platforms();
        assert_eq!(drop_columns(&t, &["Console", "Absent"]).column_names(), vec!["PC", "Mobile"]);
        let picked = select_columns(&t, &["Mobile", "PC"]).unwrap();
        assert_eq!(picked.column_names(), vec!["Mobile", "PC"]);
        assert_eq!(picked.number(2016, "Mobile").unwrap(), 5.0);
        assert!(matches!(
            select_columns(&t, &["Nope"]),
            Err(DataError::UnknownColumn { .. })
        ));
    }

    fn prices() -> Table {
        table(
            "data_avg_price_type",
            json!([
                {"Année": 2016, "Action": 40, "RPG": 50, "Sport": 30, "Course": 20, "Combat": 10, "Plateforme": 25},
                {"Année": 2017, "Action": 44, "RPG": 50, "Sport": 33, "Course": 30, "Combat": 10, "Plateforme": 20},
                {"Année": 2018, "Action": 44, "RPG": 55, "Sport": 33, "Course": 33, "Combat": 12, "Plateforme": 20}
            ]),
        )
    }

    #[test]
    fn variation_scores_sum_percentage_changes() {
        let scores = variation_scores(&prices()).unwrap();
        let get = |name: &str| scores.iter().find(|(n, _)| n == name).unwrap().1;
        assert!((get("Action") - 0.1).abs() < EPS);
        assert!((get("RPG") - 0.1).abs() < EPS);
        assert!((get("Course") - 0.6).abs() < EPS);
        assert!((get("Combat") - 0.2).abs() < EPS);
        assert!((get("Plateforme") + 0.2).abs() < EPS);
    }

    #[test]
    fn top_n_keeps_highest_variations_in_rank_order() {
        let top = top_n_by_variation(&prices(), 3).unwrap();
        // Action and RPG tie at 0.1; Action comes first in the source.
        assert_eq!(top.column_names(), vec!["Course", "Combat", "Action"]);
        assert_eq!(top.years(), prices().years());
    }

    #[test]
    fn top_n_dominates_excluded_columns() {
        let t = prices();
        let scores = variation_scores(&t).unwrap();
        for n in 0..=8 {
            let top = top_n_by_variation(&t, n).unwrap();
            let kept = top.column_names();
            assert_eq!(kept.len(), n.min(t.columns().len()));
            let score = |name: &str| scores.iter().find(|(c, _)| c == name).unwrap().1;
            for k in &kept {
                for (excluded, s) in scores.iter().filter(|(c, _)| !kept.contains(&c.as_str())) {
                    assert!(score(k) >= *s, "{k} ranked above {excluded}");
                }
            }
        }
    }

    #[test]
    fn change_from_zero_is_infinite_and_zero_to_zero_is_skipped() {
        let t = table(
            "z",
            json!([
                {"Année": 2016, "Up": 0, "Flat": 0},
                {"Année": 2017, "Up": 5, "Flat": 0}
            ]),
        );
        let scores = variation_scores(&t).unwrap();
        assert_eq!(scores[0].1, f64::INFINITY);
        assert_eq!(scores[1].1, 0.0);
    }

    #[test]
    fn opposite_infinite_changes_rank_last() {
        let t = table(
            "z",
            json!([
                {"Année": 2016, "Swing": 0, "Steady": 10},
                {"Année": 2017, "Swing": 5, "Steady": 9},
                {"Année": 2018, "Swing": 0, "Steady": 8},
                {"Année": 2019, "Swing": -5, "Steady": 7}
            ]),
        );
        let scores = variation_scores(&t).unwrap();
        assert_eq!(scores[0].1, f64::NEG_INFINITY);

        let top = top_n_by_variation(&t, 2).unwrap();
        assert_eq!(top.column_names(), vec!["Steady", "Swing"]);
    }

    #[test]
    fn top_n_rejects_text_columns() {
        let t = table("t", json!([{"Année": 2016, "Label": "a"}]));
        assert!(matches!(
            top_n_by_variation(&t, 1),
            Err(DataError::NonNumericColumn { .. })
        ));
    }

    fn pegi_sales() -> Table {
        table(
            "data_sales_pegi",
            json!([
                {"Année": 2016, "PEGI3": 100, "PEGI18": 90, "Total": 190},
                {"Année": 2017, "PEGI3": 120, "PEGI18": 80, "Total": 200},
                {"Année": 2018, "PEGI3": 130, "PEGI18": 70, "Total": 200}
            ]),
        )
    }

    fn pegi_units() -> Table {
        table(
            "data_units_pegi",
            json!([
                {"Année": 2016, "PEGI18": 0, "PEGI3": 4, "Total": 4},
                {"Année": 2017, "PEGI18": 2, "PEGI3": 3, "Total": 5}
            ]),
        )
    }

    #[test]
    fn ratio_divides_cell_by_cell() {
        let r = ratio(&pegi_sales(), &pegi_units()).unwrap();
        assert_eq!(r.column_names(), vec!["PEGI3", "PEGI18"]);
        assert_eq!(r.get(2016, "PEGI3"), Some(Ratio::Defined(25.0)));
        assert_eq!(r.get(2017, "PEGI3"), Some(Ratio::Defined(40.0)));
        assert_eq!(r.get(2017, "PEGI18"), Some(Ratio::Defined(40.0)));
    }

    #[test]
    fn ratio_zero_denominator_is_undefined() {
        let r = ratio(&pegi_sales(), &pegi_units()).unwrap();
        assert_eq!(r.get(2016, "PEGI18"), Some(Ratio::Undefined));
        let defined = r
            .years()
            .iter()
            .flat_map(|&y| r.row(y).unwrap().iter())
            .filter(|c| c.is_defined())
            .count();
        assert_eq!(defined, 3);
    }

    #[test]
    fn ratio_covers_year_intersection() {
        let r = ratio(&pegi_sales(), &pegi_units()).unwrap();
        assert_eq!(r.years(), &[2016, 2017]);
    }

    #[test]
    fn ratio_rejects_different_columns() {
        let other = table("o", json!([{"Année": 2016, "PEGI3": 1, "PEGI7": 1}]));
        assert!(matches!(
            ratio(&pegi_sales(), &other),
            Err(DataError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn normalized_rows_sum_to_hundred() {
        let pct = normalize_to_percentage(&pegi_sales()).unwrap();
        assert_eq!(pct.column_names(), vec!["PEGI3", "PEGI18"]);
        for &year in pct.years() {
            let sum: f64 = pct.row(year).unwrap().iter().filter_map(|c| c.value()).sum();
            assert!((sum - 100.0).abs() < 1e-9, "{year}: {sum}");
        }
        let share = pct.get(2017, "PEGI3").and_then(Ratio::value).unwrap();
        assert!((share - 60.0).abs() < EPS);
    }

    #[test]
    fn zero_row_normalizes_to_undefined() {
        let t = table("z", json!([{"Année": 2016, "A": 0, "B": 0}]));
        let pct = normalize_to_percentage(&t).unwrap();
        assert_eq!(pct.row(2016).unwrap(), &[Ratio::Undefined, Ratio::Undefined]);
    }
}
