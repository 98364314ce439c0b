//! The view controller: owns filter, sort and pagination state for one record
//! collection and recomputes the visible page after every change.

use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::column::{self, Column};
use crate::domain::TableError;
use crate::export::{self, ExportLayout, Persist};
use crate::filter::{self, FilterState};
use crate::pagination::Pagination;
use crate::sort::{self, Direction, SortState};
use crate::value::Record;

/// All mutable state of a table, replaced as a whole on every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableState {
    pub filters: FilterState,
    pub sort: SortState,
    pub pagination: Pagination,
}

/// The derived read model. Row entries index into the record collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    pub filtered_count: usize,
    pub page_count: usize,
    pub page_index: usize,
    pub page_range: Range<usize>,
    pub rows: Vec<usize>,
    pub can_prev: bool,
    pub can_next: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub filename: String,
    pub rows: usize,
}

/// Filter, sort and page `records` under `state`. Clamps the page index in
/// `state` onto the last valid page.
pub fn compute(
    records: &[Record],
    columns: &[Column],
    state: &mut TableState,
    mirror: Option<&str>,
) -> View {
    let ordered = ordered_rows(records, columns, state, mirror);
    let total = ordered.len();
    state.pagination.clamp(total);

    let page_range = state.pagination.range(total);
    View {
        filtered_count: total,
        page_count: state.pagination.page_count(total),
        page_index: state.pagination.page_index(),
        rows: ordered[page_range.clone()].to_vec(),
        page_range,
        can_prev: state.pagination.can_prev(),
        can_next: state.pagination.can_next(total),
    }
}

/// Filtered then sorted row indices, ignoring pagination.
pub fn ordered_rows(
    records: &[Record],
    columns: &[Column],
    state: &TableState,
    mirror: Option<&str>,
) -> Vec<usize> {
    let mut rows = filter::filter_rows(records, columns, &state.filters, mirror);
    sort::sort_rows(records, columns, &mut rows, &state.sort);
    rows
}

pub struct ViewController {
    records: Arc<Vec<Record>>,
    columns: Vec<Column>,
    mirror: Option<String>,
    state: TableState,
    view: View,
    export_layout: ExportLayout,
}

impl ViewController {
    pub fn new(records: impl Into<Arc<Vec<Record>>>, columns: Vec<Column>) -> Self {
        let mut controller = Self {
            records: records.into(),
            columns,
            mirror: None,
            state: TableState::default(),
            view: View::default(),
            export_layout: ExportLayout::default(),
        };
        controller.recompute();
        controller
    }

    /// Mirrors the global query into `column_id`'s filter slot. Ignored for
    /// unknown or non-filterable columns.
    pub fn with_mirror_column(mut self, column_id: &str) -> Self {
        match column::find(&self.columns, column_id) {
            Some(c) if c.filterable => {
                let mut next = self.state.clone();
                if let Some(previous) = self.mirror.take() {
                    next.filters.columns.shift_remove(&previous);
                }
                self.mirror = Some(column_id.to_string());
                let global = next.filters.global.clone();
                next.filters.columns.insert(column_id.to_string(), global);
                self.commit(next);
            }
            _ => warn!("Not mirroring global filter into {column_id}: no such filterable column"),
        }
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.set_page_size(page_size);
        self
    }

    pub fn with_export_layout(mut self, layout: ExportLayout) -> Self {
        self.export_layout = layout;
        self
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.visible)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn mirror_column(&self) -> Option<&str> {
        self.mirror.as_deref()
    }

    /// Records on the current page, in view order.
    pub fn current_page_rows(&self) -> Vec<&Record> {
        self.view.rows.iter().map(|&r| &self.records[r]).collect()
    }

    pub fn global_filter(&self) -> &str {
        &self.state.filters.global
    }

    /// Effective filter value of a column. The mirrored column reports the
    /// global query.
    pub fn column_filter(&self, column_id: &str) -> Option<&str> {
        self.state
            .filters
            .columns
            .get(column_id)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn sort_direction(&self, column_id: &str) -> Option<Direction> {
        self.state.sort.direction(column_id)
    }

    /// Replaces the underlying collection and recomputes from scratch.
    pub fn set_records(&mut self, records: impl Into<Arc<Vec<Record>>>) {
        self.records = records.into();
        debug!("Record collection replaced, {} records", self.records.len());
        self.recompute();
    }

    pub fn set_global_filter(&mut self, query: &str) {
        let mut next = self.state.clone();
        next.filters.global = query.to_string();
        if let Some(mirror) = &self.mirror {
            next.filters.columns.insert(mirror.clone(), query.to_string());
        }
        self.commit(next);
    }

    /// Sets or clears (empty value) one column filter. Unknown or
    /// non-filterable columns are ignored.
    pub fn set_column_filter(&mut self, column_id: &str, value: &str) {
        if self.mirror.as_deref() == Some(column_id) {
            self.set_global_filter(value);
            return;
        }
        if !column::find(&self.columns, column_id).is_some_and(|c| c.filterable) {
            debug!("Ignoring filter on {column_id}: no such filterable column");
            return;
        }
        let mut next = self.state.clone();
        if value.is_empty() {
            next.filters.columns.shift_remove(column_id);
        } else {
            next.filters.columns.insert(column_id.to_string(), value.to_string());
        }
        self.commit(next);
    }

    pub fn reset_filters(&mut self) {
        let mut next = self.state.clone();
        next.filters = FilterState::default();
        if let Some(mirror) = &self.mirror {
            next.filters.columns.insert(mirror.clone(), String::new());
        }
        self.commit(next);
    }

    /// Cycles the single-column sort on `column_id`.
    pub fn toggle_sort(&mut self, column_id: &str) {
        if !self.is_sortable(column_id) {
            return;
        }
        let mut next = self.state.clone();
        next.sort.toggle(column_id);
        self.commit(next);
    }

    /// Adds `column_id` as the lowest priority sort key.
    pub fn append_sort(&mut self, column_id: &str, direction: Direction) {
        if !self.is_sortable(column_id) {
            return;
        }
        let mut next = self.state.clone();
        next.sort.append(column_id, direction);
        self.commit(next);
    }

    pub fn clear_sort(&mut self) {
        let mut next = self.state.clone();
        next.sort.clear();
        self.commit(next);
    }

    pub fn set_page_index(&mut self, page_index: usize) {
        let total = self.view.filtered_count;
        let mut next = self.state.clone();
        next.pagination.go_to(page_index, total);
        self.commit(next);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        let total = self.view.filtered_count;
        let mut next = self.state.clone();
        next.pagination.set_page_size(page_size, total);
        self.commit(next);
    }

    pub fn first_page(&mut self) {
        self.set_page_index(0);
    }

    pub fn prev_page(&mut self) {
        self.set_page_index(self.state.pagination.page_index().saturating_sub(1));
    }

    pub fn next_page(&mut self) {
        self.set_page_index(self.state.pagination.page_index() + 1);
    }

    pub fn last_page(&mut self) {
        self.set_page_index(self.view.page_count - 1);
    }

    /// Visibility only changes rendering, the view itself is unaffected.
    pub fn set_column_visibility(&mut self, column_id: &str, visible: bool) {
        match self.columns.iter_mut().find(|c| c.id == column_id) {
            Some(column) => column.visible = visible,
            None => debug!("Ignoring visibility of unknown column {column_id}"),
        }
        self.recompute();
    }

    /// Builds the filtered and sorted rows, serializes them and hands the text
    /// to `sink` as `<base>.csv`. Nothing is dispatched for an empty result.
    pub fn export_current_view(
        &self,
        filename_base: &str,
        sink: &mut dyn Persist,
    ) -> Result<Option<ExportOutcome>, TableError> {
        let rows = ordered_rows(&self.records, &self.columns, &self.state, self.mirror.as_deref());
        let records = rows.iter().map(|&r| &self.records[r]);
        let Some(text) = export::to_csv(records, &self.columns, &self.export_layout) else {
            debug!("Nothing to export");
            return Ok(None);
        };
        let filename = export::export_filename(filename_base);
        info!("Exporting {} rows as {filename}", rows.len());
        sink.persist(text, &filename)?;
        Ok(Some(ExportOutcome {
            filename,
            rows: rows.len(),
        }))
    }

    fn is_sortable(&self, column_id: &str) -> bool {
        let sortable = column::find(&self.columns, column_id).is_some_and(|c| c.sortable);
        if !sortable {
            debug!("Ignoring sort on {column_id}: no such sortable column");
        }
        sortable
    }

    fn commit(&mut self, next: TableState) {
        self.state = next;
        self.recompute();
    }

    fn recompute(&mut self) {
        let start_time = Instant::now();
        let mut state = self.state.clone();
        self.view = compute(&self.records, &self.columns, &mut state, self.mirror.as_deref());
        self.state = state;
        trace!(
            "Recomputed view: {} rows, page {}/{} in {}ms",
            self.view.filtered_count,
            self.view.page_index + 1,
            self.view.page_count,
            start_time.elapsed().as_millis()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Collect(Vec<(String, String)>);

    impl Persist for Collect {
        fn persist(&mut self, text: String, filename: &str) -> Result<(), TableError> {
            self.0.push((filename.to_string(), text));
            Ok(())
        }
    }

    fn numbered(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record::new().with("id", i as i64).with("parity", if i % 2 == 0 { "even" } else { "odd" }))
            .collect()
    }

    fn controller(n: usize) -> ViewController {
        ViewController::new(numbered(n), vec![Column::key("id"), Column::key("parity")])
            .with_page_size(2)
    }

    fn page_ids(c: &ViewController) -> Vec<String> {
        c.current_page_rows().iter().map(|r| r.get("id").as_text()).collect()
    }

    #[test]
    fn initial_view_is_first_page_in_insertion_order() {
        let c = controller(5);
        let view = c.view();
        assert_eq!(view.filtered_count, 5);
        assert_eq!(view.page_count, 3);
        assert_eq!(page_ids(&c), vec!["0", "1"]);
        assert!(!view.can_prev);
        assert!(view.can_next);
    }

    #[test]
    fn navigation_walks_and_clamps() {
        let mut c = controller(5);
        c.next_page();
        assert_eq!(page_ids(&c), vec!["2", "3"]);
        c.last_page();
        assert_eq!(page_ids(&c), vec!["4"]);
        c.next_page();
        assert_eq!(c.view().page_index, 2);
        assert!(!c.view().can_next);
        c.set_page_index(100);
        assert_eq!(c.view().page_index, 2);
        c.first_page();
        c.prev_page();
        assert_eq!(c.view().page_index, 0);
    }

    #[test]
    fn filtering_clamps_a_dangling_page() {
        let mut c = controller(10);
        c.last_page();
        assert_eq!(c.view().page_index, 4);
        c.set_column_filter("parity", "odd");
        assert_eq!(c.view().filtered_count, 5);
        assert_eq!(c.view().page_index, 2);
        assert_eq!(page_ids(&c), vec!["9"]);
        c.set_global_filter("nothing matches");
        assert_eq!(c.view().page_index, 0);
        assert_eq!(c.view().page_count, 1);
        assert!(c.current_page_rows().is_empty());
    }

    #[test]
    fn replacing_records_recomputes_and_clamps() {
        let mut c = controller(10);
        c.last_page();
        c.set_records(numbered(3));
        assert_eq!(c.view().page_index, 1);
        assert_eq!(page_ids(&c), vec!["2"]);
    }

    #[test]
    fn toggle_sort_cycles() {
        let mut c = controller(4);
        c.toggle_sort("id");
        assert_eq!(page_ids(&c), vec!["0", "1"]);
        c.toggle_sort("id");
        assert_eq!(page_ids(&c), vec!["3", "2"]);
        assert_eq!(c.sort_direction("id"), Some(Direction::Descending));
        c.toggle_sort("id");
        assert_eq!(c.sort_direction("id"), None);
        assert_eq!(page_ids(&c), vec!["0", "1"]);
    }

    #[test]
    fn stale_references_leave_state_untouched() {
        let mut c = controller(4);
        let before = c.state().clone();
        c.toggle_sort("ghost");
        c.set_column_filter("ghost", "x");
        c.append_sort("ghost", Direction::Ascending);
        assert_eq!(c.state(), &before);
    }

    #[test]
    fn mirror_keeps_column_filter_in_lockstep() {
        let mut c = controller(6).with_mirror_column("parity");
        c.set_global_filter("odd");
        assert_eq!(c.column_filter("parity"), Some("odd"));
        assert_eq!(c.view().filtered_count, 3);
        c.set_column_filter("parity", "even");
        assert_eq!(c.global_filter(), "even");
        assert_eq!(c.view().filtered_count, 3);
        c.reset_filters();
        assert_eq!(c.column_filter("parity"), None);
        assert_eq!(c.view().filtered_count, 6);
    }

    #[test]
    fn switching_mirror_releases_the_old_column() {
        let mut c = controller(6).with_mirror_column("id");
        c.set_global_filter("even");
        assert_eq!(c.view().filtered_count, 3);
        let c = c.with_mirror_column("parity");
        assert_eq!(c.column_filter("id"), None);
        assert_eq!(c.column_filter("parity"), Some("even"));
        assert_eq!(c.view().filtered_count, 3);
    }

    #[test]
    fn mirror_into_non_filterable_column_is_refused() {
        let columns = vec![Column::key("id"), Column::key("parity").filterable(false)];
        let mut c = ViewController::new(numbered(4), columns).with_mirror_column("parity");
        assert_eq!(c.mirror_column(), None);
        c.set_global_filter("3");
        assert_eq!(c.column_filter("parity"), None);
        assert_eq!(c.view().filtered_count, 1);
    }

    #[test]
    fn visibility_does_not_change_the_view() {
        let mut c = controller(4);
        let before = c.view().clone();
        c.set_column_visibility("parity", false);
        assert_eq!(c.view(), &before);
        assert_eq!(c.visible_columns().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn export_ignores_pagination() {
        let mut c = controller(5);
        c.toggle_sort("id");
        c.toggle_sort("id");
        c.next_page();
        let mut sink = Collect(Vec::new());
        let outcome = c.export_current_view("Sample Data", &mut sink).unwrap().unwrap();
        assert_eq!(outcome, ExportOutcome { filename: "sample-data.csv".into(), rows: 5 });
        let (name, text) = &sink.0[0];
        assert_eq!(name, "sample-data.csv");
        assert_eq!(text.lines().count(), 6);
        assert_eq!(text.lines().nth(1), Some("\"4\",\"even\""));
    }

    #[test]
    fn empty_export_dispatches_nothing() {
        let mut c = controller(5);
        c.set_global_filter("zzz");
        let mut sink = Collect(Vec::new());
        assert_eq!(c.export_current_view("data", &mut sink).unwrap(), None);
        assert!(sink.0.is_empty());
    }
}
