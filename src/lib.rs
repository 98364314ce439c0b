//! Tabular views over in-memory record collections.
//!
//! A [`ViewController`] owns the filter, sort and pagination state of one
//! table and recomputes its [`View`] (filter, then sort, then paginate) on
//! every change. Export serializes the filtered and sorted rows, ignoring
//! pagination, and hands the text to a [`Persist`] sink.

pub mod column;
pub mod domain;
pub mod export;
pub mod filter;
pub mod loader;
pub mod pagination;
pub mod sort;
pub mod value;
pub mod view;

pub use column::{Accessor, CellFormat, Column, MatchMode};
pub use domain::{TableError, ViewerConfig};
pub use export::{ClipboardSink, ExportLayout, FileSink, Persist};
pub use filter::FilterState;
pub use pagination::Pagination;
pub use sort::{Direction, SortKey, SortState};
pub use value::{Record, Value};
pub use view::{ExportOutcome, TableState, View, ViewController};
