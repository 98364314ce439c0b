use indexmap::IndexMap;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, trace};

use crate::column::{Column, MatchMode};
use crate::value::Record;

/// Global query plus per-column filter values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub global: String,
    pub columns: IndexMap<String, String>,
}

impl FilterState {
    pub fn is_active(&self) -> bool {
        !self.global.trim().is_empty() || self.columns.values().any(|v| !v.trim().is_empty())
    }
}

// A column predicate resolved against the column list, with its needle lowercased.
struct ColumnPredicate<'a> {
    column: &'a Column,
    needle: String,
    mode: MatchMode,
}

/// Returns the indices of `records` matching both the global query and every
/// column filter, in their original order.
///
/// `mirror` names the column the global query is mirrored into. Its column
/// filter slot is an alias of the global query and is not applied a second time.
pub fn filter_rows(
    records: &[Record],
    columns: &[Column],
    state: &FilterState,
    mirror: Option<&str>,
) -> Vec<usize> {
    let start_time = Instant::now();

    let global = state.global.trim().to_lowercase();
    let searchable: Vec<&Column> = columns.iter().filter(|c| c.filterable).collect();
    let predicates = resolve_predicates(columns, state, mirror);

    if global.is_empty() && predicates.is_empty() {
        return (0..records.len()).collect();
    }

    let matches: Vec<usize> = records
        .par_iter()
        .enumerate()
        .filter(|(_, record)| {
            matches_global(record, &searchable, &global)
                && predicates
                    .iter()
                    .all(|p| p.mode.matches(&p.column.value(record), &p.needle))
        })
        .map(|(idx, _)| idx)
        .collect();

    trace!(
        "Filter kept {}/{} records in {}ms",
        matches.len(),
        records.len(),
        start_time.elapsed().as_millis()
    );
    matches
}

fn matches_global(record: &Record, searchable: &[&Column], needle: &str) -> bool {
    needle.is_empty()
        || searchable
            .iter()
            .any(|c| MatchMode::Contains.matches(&c.value(record), needle))
}

fn resolve_predicates<'a>(
    columns: &'a [Column],
    state: &FilterState,
    mirror: Option<&str>,
) -> Vec<ColumnPredicate<'a>> {
    let mut predicates = Vec::with_capacity(state.columns.len());
    for (id, value) in &state.columns {
        let needle = value.trim().to_lowercase();
        if needle.is_empty() || mirror == Some(id.as_str()) {
            continue;
        }
        match columns.iter().find(|c| &c.id == id) {
            Some(column) if column.filterable => predicates.push(ColumnPredicate {
                column,
                needle,
                mode: column.match_mode,
            }),
            Some(_) => debug!("Ignoring filter on non-filterable column {id}"),
            None => debug!("Ignoring filter on unknown column {id}"),
        }
    }
    predicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::CellFormat;
    use pretty_assertions::assert_eq;

    fn products() -> Vec<Record> {
        vec![
            Record::new().with("name", "Vitamin C").with("form", "Capsule").with("price", 12),
            Record::new().with("name", "Zinc").with("form", "Tablet").with("price", 8),
            Record::new().with("name", "Fish Oil").with("form", "capsule").with("price", 20),
            Record::new().with("name", "Whey").with("form", "Powder"),
        ]
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::key("name"),
            Column::key("form"),
            Column::key("price").format(CellFormat::Currency { symbol: "$".into() }),
        ]
    }

    fn global(q: &str) -> FilterState {
        FilterState {
            global: q.into(),
            ..Default::default()
        }
    }

    #[test]
    fn global_query_matches_any_filterable_column() {
        let rows = filter_rows(&products(), &columns(), &global("cap"), None);
        assert_eq!(rows, vec![0, 2]);
    }

    #[test]
    fn global_query_is_trimmed_and_numbers_are_searchable() {
        let rows = filter_rows(&products(), &columns(), &global("  20 "), None);
        assert_eq!(rows, vec![2]);
        let rows = filter_rows(&products(), &columns(), &global("   "), None);
        assert_eq!(rows, vec![0, 1, 2, 3]);
    }

    #[test]
    fn non_filterable_columns_are_not_searched() {
        let mut cols = columns();
        cols[1].filterable = false;
        let rows = filter_rows(&products(), &cols, &global("cap"), None);
        assert!(rows.is_empty());
    }

    #[test]
    fn column_filters_and_global_are_combined() {
        let mut state = global("i");
        state.columns.insert("form".into(), "CAPSULE".into());
        let rows = filter_rows(&products(), &columns(), &state, None);
        assert_eq!(rows, vec![0, 2]);

        state.columns.insert("name".into(), "zinc".into());
        let rows = filter_rows(&products(), &columns(), &state, None);
        assert!(rows.is_empty());
    }

    #[test]
    fn stale_column_references_are_ignored() {
        let mut cols = columns();
        cols[0].filterable = false;
        let mut state = FilterState::default();
        state.columns.insert("sku".into(), "nope".into());
        state.columns.insert("name".into(), "nope".into());
        state.columns.insert("form".into(), "".into());
        let rows = filter_rows(&products(), &cols, &state, None);
        assert_eq!(rows, vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_values_never_match_a_query() {
        let rows = filter_rows(&products(), &columns()[2..], &global("8"), None);
        assert_eq!(rows, vec![1]);
    }

    #[test]
    fn blank_values_do_not_make_filters_active() {
        let mut state = global("  ");
        state.columns.insert("form".into(), "".into());
        assert!(!state.is_active());
        state.columns.insert("name".into(), "zinc".into());
        assert!(state.is_active());
        assert!(global("cap").is_active());
    }

    #[test]
    fn mirrored_column_filter_is_not_applied_twice() {
        let mut state = global("cap");
        state.columns.insert("name".into(), "cap".into());
        let mirrored = filter_rows(&products(), &columns(), &state, Some("name"));
        let plain = filter_rows(&products(), &columns(), &global("cap"), None);
        assert_eq!(mirrored, plain);
    }

    #[test]
    fn match_mode_applies_to_column_filters() {
        let mut cols = columns();
        cols[0].match_mode = MatchMode::Prefix;
        let mut state = FilterState::default();
        state.columns.insert("name".into(), "oil".into());
        assert!(filter_rows(&products(), &cols, &state, None).is_empty());
        state.columns.insert("name".into(), "fish".into());
        assert_eq!(filter_rows(&products(), &cols, &state, None), vec![2]);
    }

    #[test]
    fn every_match_contains_the_query() {
        let records = products();
        let cols = columns();
        for q in ["a", "in", "caps", "1", "x"] {
            for idx in filter_rows(&records, &cols, &global(q), None) {
                assert!(cols.iter().any(|c| c
                    .value(&records[idx])
                    .as_text()
                    .to_lowercase()
                    .contains(q)));
            }
        }
    }

    #[test]
    fn empty_dataset_yields_nothing() {
        assert!(filter_rows(&[], &columns(), &global("cap"), None).is_empty());
    }
}
