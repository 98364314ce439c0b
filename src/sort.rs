use chrono::NaiveDateTime;
use std::cmp::Ordering;
use std::time::Instant;
use tracing::{debug, trace};

use crate::column::Column;
use crate::value::{Record, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn arrow(self) -> &'static str {
        match self {
            Direction::Ascending => "▲",
            Direction::Descending => "▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column_id: String,
    pub direction: Direction,
}

impl SortKey {
    pub fn new(column_id: impl Into<String>, direction: Direction) -> Self {
        Self {
            column_id: column_id.into(),
            direction,
        }
    }
}

/// Sort keys in priority order. Empty keeps insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortState {
    keys: Vec<SortKey>,
}

impl SortState {
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn direction(&self, column_id: &str) -> Option<Direction> {
        self.keys
            .iter()
            .find(|k| k.column_id == column_id)
            .map(|k| k.direction)
    }

    /// Cycles a single-column sort: none -> ascending -> descending -> none.
    /// Always replaces the whole state with at most one key.
    pub fn toggle(&mut self, column_id: &str) {
        let next = match self.direction(column_id) {
            None => Some(Direction::Ascending),
            Some(Direction::Ascending) => Some(Direction::Descending),
            Some(Direction::Descending) => None,
        };
        self.keys = next
            .map(|d| vec![SortKey::new(column_id, d)])
            .unwrap_or_default();
    }

    /// Adds a lower-priority key, or updates the direction of an existing one in place.
    pub fn append(&mut self, column_id: &str, direction: Direction) {
        match self.keys.iter_mut().find(|k| k.column_id == column_id) {
            Some(key) => key.direction = direction,
            None => self.keys.push(SortKey::new(column_id, direction)),
        }
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

impl FromIterator<SortKey> for SortState {
    fn from_iter<I: IntoIterator<Item = SortKey>>(iter: I) -> Self {
        let mut state = SortState::default();
        for key in iter {
            state.append(&key.column_id, key.direction);
        }
        state
    }
}

// A value prepared for comparison, parsed once per row and key. Variant
// order is the rank used when two cells hold different kinds of value.
enum SortCell {
    Number(f64),
    Instant(NaiveDateTime),
    Text(String),
    Empty,
}

impl SortCell {
    fn new(value: Value) -> Self {
        if value.is_empty() {
            return SortCell::Empty;
        }
        if let Some(n) = value.as_number() {
            return SortCell::Number(n);
        }
        match value.as_datetime() {
            Some(instant) => SortCell::Instant(instant),
            None => SortCell::Text(value.as_text()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortCell::Number(_) => 0,
            SortCell::Instant(_) => 1,
            SortCell::Text(_) => 2,
            SortCell::Empty => 3,
        }
    }
}

/// Natural order of two present values: numbers and ISO-8601 date strings
/// compare by magnitude, anything else as case-sensitive text. Mixed kinds
/// order numbers before dates before text.
fn compare_present(a: &SortCell, b: &SortCell) -> Ordering {
    match (a, b) {
        (SortCell::Number(x), SortCell::Number(y)) => x.total_cmp(y),
        (SortCell::Instant(x), SortCell::Instant(y)) => x.cmp(y),
        (SortCell::Text(x), SortCell::Text(y)) => x.cmp(y),
        _ => a.rank().cmp(&b.rank()),
    }
}

/// Compares one key. Empty values go last in either direction.
fn compare_cells(a: &SortCell, b: &SortCell, direction: Direction) -> Ordering {
    match (a, b) {
        (SortCell::Empty, SortCell::Empty) => Ordering::Equal,
        (SortCell::Empty, _) => Ordering::Greater,
        (_, SortCell::Empty) => Ordering::Less,
        _ => {
            let ord = compare_present(a, b);
            match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        }
    }
}

/// Keys whose column exists and is sortable, paired with that column.
fn resolve_keys<'a>(columns: &'a [Column], state: &SortState) -> Vec<(&'a Column, Direction)> {
    state
        .keys()
        .iter()
        .filter_map(|key| match columns.iter().find(|c| c.id == key.column_id) {
            Some(column) if column.sortable => Some((column, key.direction)),
            Some(_) => {
                debug!("Dropping sort on non-sortable column {}", key.column_id);
                None
            }
            None => {
                debug!("Dropping sort on unknown column {}", key.column_id);
                None
            }
        })
        .collect()
}

/// Stable multi-key sort of `rows`, a list of indices into `records`.
pub fn sort_rows(records: &[Record], columns: &[Column], rows: &mut Vec<usize>, state: &SortState) {
    let keys = resolve_keys(columns, state);
    if keys.is_empty() {
        return;
    }
    let start_time = Instant::now();

    let mut decorated: Vec<(usize, Vec<SortCell>)> = rows
        .iter()
        .map(|&ridx| {
            let cells = keys
                .iter()
                .map(|(column, _)| SortCell::new(column.value(&records[ridx])))
                .collect();
            (ridx, cells)
        })
        .collect();

    // sort_by is stable, equal rows keep their incoming order
    decorated.sort_by(|(_, a), (_, b)| {
        keys.iter()
            .zip(a.iter().zip(b.iter()))
            .map(|((_, direction), (x, y))| compare_cells(x, y, *direction))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    *rows = decorated.into_iter().map(|(ridx, _)| ridx).collect();
    trace!(
        "Sorted {} rows by {} key(s) in {}ms",
        rows.len(),
        keys.len(),
        start_time.elapsed().as_millis()
    );
}
