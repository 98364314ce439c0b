use chrono::NaiveDateTime;
use derive_setters::Setters;
use std::fmt;
use std::sync::Arc;

use crate::value::{Record, Value};

type DeriveFn = dyn Fn(&Record) -> Option<Value> + Send + Sync;

/// How a column reads its value out of a record.
#[derive(Clone)]
pub enum Accessor {
    /// Reads a named field.
    Key(String),
    /// Computes the value; `None` means the value could not be produced.
    Derived(Arc<DeriveFn>),
}

impl Accessor {
    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Option<Value> + Send + Sync + 'static,
    {
        Accessor::Derived(Arc::new(f))
    }

    pub fn read(&self, record: &Record) -> Value {
        match self {
            Accessor::Key(key) => record.get(key),
            Accessor::Derived(f) => f(record).unwrap_or_default(),
        }
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Accessor::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// Column filter predicate. All modes ignore case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Contains,
    Exact,
    Prefix,
}

impl MatchMode {
    /// `needle` is expected to be lowercased already.
    pub fn matches(self, value: &Value, needle: &str) -> bool {
        let hay = value.as_text().to_lowercase();
        match self {
            MatchMode::Contains => hay.contains(needle),
            MatchMode::Exact => hay == needle,
            MatchMode::Prefix => hay.starts_with(needle),
        }
    }
}

/// Display formatting. Only affects rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellFormat {
    #[default]
    Plain,
    Currency { symbol: String },
    Date,
    Percent,
}

impl CellFormat {
    pub fn render(&self, value: &Value) -> String {
        match (self, value) {
            (_, Value::Empty) => String::new(),
            (CellFormat::Currency { symbol }, Value::Number(n)) => {
                let sign = if *n < 0.0 { "-" } else { "" };
                format!("{sign}{symbol}{}", group_thousands(n.abs()))
            }
            (CellFormat::Percent, Value::Number(n)) => format!("{:.1}%", n * 100.0),
            (CellFormat::Date, v) => v
                .as_datetime()
                .map(|dt: NaiveDateTime| dt.format("%b %-d, %Y").to_string())
                .unwrap_or_else(|| v.as_text()),
            (_, v) => v.as_text(),
        }
    }
}

fn group_thousands(n: f64) -> String {
    let fixed = format!("{n:.2}");
    let (int, frac) = fixed.split_once('.').unwrap_or((&fixed, "00"));
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{grouped}.{frac}")
}

/// Describes how one column is read, filtered, sorted and rendered.
#[derive(Debug, Clone, Setters)]
#[setters(into)]
pub struct Column {
    pub id: String,
    pub header: String,
    pub accessor: Accessor,
    pub filterable: bool,
    pub sortable: bool,
    pub visible: bool,
    pub match_mode: MatchMode,
    pub format: CellFormat,
    pub align_right: bool,
}

impl Column {
    /// Column reading the record field of the same name.
    pub fn key(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone(), Accessor::Key(id))
    }

    pub fn derived<F>(id: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Record) -> Option<Value> + Send + Sync + 'static,
    {
        Self::new(id, Accessor::derived(f))
    }

    pub fn new(id: impl Into<String>, accessor: Accessor) -> Self {
        let id = id.into();
        Self {
            header: id.clone(),
            id,
            accessor,
            filterable: true,
            sortable: true,
            visible: true,
            match_mode: MatchMode::default(),
            format: CellFormat::default(),
            align_right: false,
        }
    }

    pub fn value(&self, record: &Record) -> Value {
        self.accessor.read(record)
    }

    pub fn render(&self, record: &Record) -> String {
        self.format.render(&self.value(record))
    }
}

/// Finds a column by id.
pub fn find<'a>(columns: &'a [Column], id: &str) -> Option<&'a Column> {
    columns.iter().find(|c| c.id == id)
}
