use std::ops::RangeInclusive;

use super::model::{Table, Tabular};

// ---------------------------------------------------------------------------
// Year selector: the single user-chosen parameter
// ---------------------------------------------------------------------------

/// A year bounded by `[min, max]`. Out-of-range requests are clamped, so the
/// held value is always inside the range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSelector {
    min: i32,
    max: i32,
    current: i32,
}

impl YearSelector {
    pub fn new(range: RangeInclusive<i32>, default: i32) -> Self {
        let (min, max) = range.into_inner();
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min,
            max,
            current: default.clamp(min, max),
        }
    }

    /// Selector over years every table has a row for, starting at the
    /// first of them.
    ///
    /// The range is the longest run of consecutive years shared by all
    /// tables (the earliest one on ties), so a table that skips a year splits
    /// the range there. `None` if the tables share no year.
    pub fn covering<'a>(tables: impl IntoIterator<Item = &'a Table>) -> Option<Self> {
        let tables: Vec<&Table> = tables.into_iter().collect();
        let (first, rest) = tables.split_first()?;
        let mut shared: Vec<i32> = first
            .years()
            .iter()
            .copied()
            .filter(|y| rest.iter().all(|t| t.years().contains(y)))
            .collect();
        shared.sort_unstable();

        let run = longest_run(&shared)?;
        if let (Some(&lo), Some(&hi)) = (shared.first(), shared.last()) {
            if run != (lo..=hi) {
                log::warn!(
                    "Years {lo}..={hi} are not all shared by every table, keeping {}..={}",
                    run.start(),
                    run.end()
                );
            }
        }
        let default = *run.start();
        Some(Self::new(run, default))
    }

    /// Record a user choice and return the (clamped) selection.
    pub fn select(&mut self, year: i32) -> i32 {
        let clamped = year.clamp(self.min, self.max);
        if clamped != year {
            log::debug!(
                "Year {year} outside [{}, {}], clamped to {clamped}",
                self.min,
                self.max
            );
        }
        self.current = clamped;
        clamped
    }

    pub fn year(&self) -> i32 {
        self.current
    }

    pub fn range(&self) -> RangeInclusive<i32> {
        self.min..=self.max
    }
}

/// Longest run of consecutive values in a sorted slice.
fn longest_run(sorted: &[i32]) -> Option<RangeInclusive<i32>> {
    let mut best: Option<(i32, i32)> = None;
    let mut start = *sorted.first()?;
    for pair in sorted.windows(2) {
        if pair[1] != pair[0] + 1 {
            best = Some(wider(best, (start, pair[0])));
            start = pair[1];
        }
    }
    let last = *sorted.last()?;
    let (lo, hi) = wider(best, (start, last));
    Some(lo..=hi)
}

fn wider(best: Option<(i32, i32)>, run: (i32, i32)) -> (i32, i32) {
    match best {
        Some((lo, hi)) if hi - lo >= run.1 - run.0 => (lo, hi),
        _ => run,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data::model::Record;

    fn table(years: &[i32]) -> Table {
        let recs: Vec<Record> = years
            .iter()
            .map(|y| serde_json::from_value(json!({"Année": y, "A": 1})).unwrap())
            .collect();
        Table::from_records("t", &recs).unwrap()
    }

    #[test]
    fn select_clamps_into_range() {
        let mut sel = YearSelector::new(2016..=2021, 2016);
        assert_eq!(sel.select(2019), 2019);
        assert_eq!(sel.select(2099), 2021);
        assert_eq!(sel.select(1990), 2016);
        assert_eq!(sel.year(), 2016);
    }

    #[test]
    fn default_is_clamped_too() {
        let sel = YearSelector::new(2016..=2021, 2030);
        assert_eq!(sel.year(), 2021);
    }

    fn has_every_year(sel: &YearSelector, table: &Table) -> bool {
        sel.range().all(|y| table.years().contains(&y))
    }

    #[test]
    fn derives_range_from_table() {
        let sel = YearSelector::covering([&table(&[2018, 2016, 2017])]).unwrap();
        assert_eq!(sel.range(), 2016..=2018);
        assert_eq!(sel.year(), 2016);
        assert!(YearSelector::covering([&table(&[])]).is_none());
        assert!(YearSelector::covering(std::iter::empty()).is_none());
    }

    #[test]
    fn covering_intersects_ranges() {
        let a = table(&[2015, 2016, 2017, 2018]);
        let b = table(&[2016, 2017, 2018, 2019]);
        let sel = YearSelector::covering([&a, &b]).unwrap();
        assert_eq!(sel.range(), 2016..=2018);
        assert!(has_every_year(&sel, &a));
        assert!(has_every_year(&sel, &b));

        let c = table(&[2020]);
        assert!(YearSelector::covering([&a, &c]).is_none());
    }

    #[test]
    fn gap_in_a_table_splits_the_range() {
        let full = table(&[2016, 2017, 2018, 2019, 2020]);
        let gapped = table(&[2016, 2018, 2019, 2020]);
        let sel = YearSelector::covering([&full, &gapped]).unwrap();
        assert_eq!(sel.range(), 2018..=2020);
        assert_eq!(sel.year(), 2018);
        assert!(has_every_year(&sel, &full));
        assert!(has_every_year(&sel, &gapped));
    }

    #[test]
    fn equal_runs_keep_the_earliest() {
        let sel = YearSelector::covering([&table(&[2016, 2018])]).unwrap();
        assert_eq!(sel.range(), 2016..=2016);

        let sel = YearSelector::covering([&table(&[2016, 2017, 2019, 2020])]).unwrap();
        assert_eq!(sel.range(), 2016..=2017);
    }
}
