use arboard::Clipboard;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::column::{self, Column};
use crate::domain::TableError;
use crate::value::{Record, Value};

/// Which fields an export emits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExportLayout {
    /// The keys of the first record, in that record's order.
    #[default]
    RecordKeys,
    /// The named columns, by header and accessor.
    Columns(Vec<String>),
}

/// Receives exported text. Implemented by whatever hosts the table.
pub trait Persist {
    fn persist(&mut self, text: String, filename: &str) -> Result<(), TableError>;
}

/// Writes exports into a directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Persist for FileSink {
    fn persist(&mut self, text: String, filename: &str) -> Result<(), TableError> {
        let path = self.dir.join(filename);
        fs::write(&path, text)?;
        info!("Wrote export to {}", path.display());
        Ok(())
    }
}

/// Places exports on the system clipboard.
pub struct ClipboardSink {
    clipboard: Clipboard,
}

impl ClipboardSink {
    pub fn new() -> Result<Self, TableError> {
        let clipboard = Clipboard::new().map_err(|e| TableError::Clipboard(e.to_string()))?;
        Ok(Self { clipboard })
    }
}

impl Persist for ClipboardSink {
    fn persist(&mut self, text: String, filename: &str) -> Result<(), TableError> {
        self.clipboard
            .set_text(text)
            .map_err(|e| TableError::Clipboard(e.to_string()))?;
        info!("Copied {filename} to clipboard");
        Ok(())
    }
}

/// `"Top Products"` becomes `"top-products.csv"`.
pub fn export_filename(base: &str) -> String {
    format!("{}.csv", base.to_lowercase().replace(' ', "-"))
}

// Header names go through the same quoting, so a name holding a comma or a
// quote still reads back as one field.
fn quote_field(value: &Value) -> String {
    match value {
        Value::Empty => String::new(),
        v => format!("\"{}\"", v.as_text().replace('"', "\"\"")),
    }
}

fn join_row(fields: impl Iterator<Item = String>) -> String {
    fields.collect::<Vec<_>>().join(",")
}

/// Serializes `rows` to comma-separated text. Returns `None` for no rows.
pub fn to_csv<'a, I>(rows: I, columns: &[Column], layout: &ExportLayout) -> Option<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut rows = rows.into_iter().peekable();
    let first = rows.peek()?;

    let lines = match layout {
        ExportLayout::RecordKeys => {
            let keys: Vec<String> = first.keys().map(str::to_string).collect();
            let header = join_row(keys.iter().map(|k| quote_field(&Value::from(k.as_str()))));
            std::iter::once(header)
                .chain(rows.map(|r| join_row(keys.iter().map(|k| quote_field(&r.get(k))))))
                .collect::<Vec<_>>()
        }
        ExportLayout::Columns(ids) => {
            let selected: Vec<&Column> = ids
                .iter()
                .filter_map(|id| column::find(columns, id))
                .collect();
            if selected.is_empty() {
                debug!("No export column resolved from {ids:?}");
                return None;
            }
            let header = join_row(
                selected
                    .iter()
                    .map(|c| quote_field(&Value::from(c.header.as_str()))),
            );
            std::iter::once(header)
                .chain(rows.map(|r| join_row(selected.iter().map(|c| quote_field(&c.value(r))))))
                .collect::<Vec<_>>()
        }
    };
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Vec<Vec<String>> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(text.as_bytes())
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let rows = vec![
            Record::new().with("name", "X").with("price", 10),
            Record::new().with("name", "Y \"Z\"").with("price", 5),
        ];
        let text = to_csv(&rows, &[], &ExportLayout::RecordKeys).unwrap();
        assert_eq!(text, "\"name\",\"price\"\n\"X\",\"10\"\n\"Y \"\"Z\"\"\",\"5\"");
    }

    #[test]
    fn no_rows_no_output() {
        assert_eq!(to_csv(&Vec::<Record>::new(), &[], &ExportLayout::RecordKeys), None);
    }

    #[test]
    fn later_rows_follow_the_first_rows_keys() {
        let rows = vec![
            Record::new().with("id", "1").with("city", "Pune"),
            Record::new().with("city", "Goa").with("id", "2").with("extra", "x"),
            Record::new().with("id", "3"),
        ];
        let text = to_csv(&rows, &[], &ExportLayout::RecordKeys).unwrap();
        assert_eq!(text, "\"id\",\"city\"\n\"1\",\"Pune\"\n\"2\",\"Goa\"\n\"3\",");
    }

    #[test]
    fn empty_values_become_empty_fields() {
        let rows = vec![Record::new().with("a", Value::Empty).with("b", false).with("c", 0)];
        let text = to_csv(&rows, &[], &ExportLayout::RecordKeys).unwrap();
        assert_eq!(text, "\"a\",\"b\",\"c\"\n,\"false\",\"0\"");
    }

    #[test]
    fn round_trip_recovers_rows_and_quotes() {
        let rows = vec![
            Record::new().with("sku", "A-1").with("note", "say \"hi\", twice"),
            Record::new().with("sku", "B-2").with("note", "line\nbreak"),
            Record::new().with("sku", "C-3"),
        ];
        let parsed = parse(&to_csv(&rows, &[], &ExportLayout::RecordKeys).unwrap());
        assert_eq!(parsed.len(), rows.len() + 1);
        assert_eq!(parsed[1][1], "say \"hi\", twice");
        assert_eq!(parsed[2][1], "line\nbreak");
        assert_eq!(parsed[3][1], "");
    }

    #[test]
    fn column_layout_uses_headers_and_accessors() {
        let columns = vec![
            Column::key("price").header("Price"),
            Column::derived("label", |r| Some(format!("{}!", r.field("name")?).into()))
                .header("Label"),
        ];
        let rows = vec![Record::new().with("name", "Zinc").with("price", 8)];
        let layout = ExportLayout::Columns(vec!["label".into(), "missing".into(), "price".into()]);
        let text = to_csv(&rows, &columns, &layout).unwrap();
        assert_eq!(text, "\"Label\",\"Price\"\n\"Zinc!\",\"8\"");
    }

    #[test]
    fn header_names_with_commas_and_quotes_round_trip() {
        let rows = vec![
            Record::new().with("Price, USD", 10).with("say \"when\"", "a"),
            Record::new().with("Price, USD", 12).with("say \"when\"", "b"),
        ];
        let parsed = parse(&to_csv(&rows, &[], &ExportLayout::RecordKeys).unwrap());
        assert_eq!(parsed[0], vec!["Price, USD", "say \"when\""]);
        assert_eq!(parsed[1], vec!["10", "a"]);
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn column_layout_without_known_columns_exports_nothing() {
        let rows = vec![Record::new().with("name", "Zinc")];
        let layout = ExportLayout::Columns(vec!["missing".into()]);
        assert_eq!(to_csv(&rows, &[Column::key("name")], &layout), None);
    }

    #[test]
    fn filename_is_lowercased_and_hyphenated() {
        assert_eq!(export_filename("Top Products"), "top-products.csv");
        assert_eq!(export_filename("orders"), "orders.csv");
    }

    #[test]
    fn file_sink_writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path());
        sink.persist("a,b".into(), "out.csv").unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("out.csv")).unwrap(), "a,b");
    }
}
