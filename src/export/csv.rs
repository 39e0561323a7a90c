//! CSV rendering of serialized records

use indexmap::IndexSet;
use serde::Serialize;
use serde_json::Value;

/// A named column reading one top-level field of each row
#[derive(Debug, Clone, Copy)]
pub struct CsvColumn {
    pub header: &'static str,
    pub field: &'static str,
}

impl CsvColumn {
    pub const fn new(header: &'static str, field: &'static str) -> Self {
        Self { header, field }
    }
}

/// Render rows with every serialized field as a column.
///
/// Columns are the union of the rows' top-level keys in first-seen order,
/// so rows with optional fields never drop a column. One line per row
/// follows the header line.
pub fn to_csv<T: Serialize>(rows: &[T]) -> anyhow::Result<String> {
    let values = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(values_to_csv(&values))
}

/// Same as [`to_csv`] for rows already in JSON form
pub fn values_to_csv(rows: &[Value]) -> String {
    let mut columns: IndexSet<String> = IndexSet::new();
    for row in rows {
        match row {
            Value::Object(map) => columns.extend(map.keys().cloned()),
            _ => {
                columns.insert("value".to_string());
            }
        }
    }

    let mut out = String::new();
    push_line(&mut out, columns.iter().map(|c| escape(c)));
    for row in rows {
        push_line(
            &mut out,
            columns.iter().map(|column| {
                let cell = match row {
                    Value::Object(map) => map.get(column).map(cell_text).unwrap_or_default(),
                    other if column == "value" => cell_text(other),
                    _ => String::new(),
                };
                escape(&cell)
            }),
        );
    }
    out
}

/// Render rows with a fixed header row and field selection
pub fn to_csv_with_columns<T: Serialize>(
    rows: &[T],
    columns: &[CsvColumn],
) -> anyhow::Result<String> {
    let mut out = String::new();
    push_line(&mut out, columns.iter().map(|c| escape(c.header)));
    for row in rows {
        let value = serde_json::to_value(row)?;
        push_line(
            &mut out,
            columns.iter().map(|c| {
                let cell = value.get(c.field).map(cell_text).unwrap_or_default();
                escape(&cell)
            }),
        );
    }
    Ok(out)
}

fn push_line(out: &mut String, cells: impl Iterator<Item = String>) {
    let line: Vec<String> = cells.collect();
    out.push_str(&line.join(","));
    out.push('\n');
}

/// Plain text of one cell; nested values keep their JSON text
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// RFC 4180 quoting
fn escape(cell: &str) -> String {
    let needs_quotes = cell.contains([',', '"', '\n', '\r'])
        || cell.starts_with(' ')
        || cell.ends_with(' ');
    if needs_quotes {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Number of CSV records in `body`, header included
///
/// Line breaks inside quoted cells belong to their record.
pub fn count_records(body: &str) -> usize {
    let mut records = 0;
    let mut in_quotes = false;
    let mut pending = false;
    for c in body.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                pending = true;
            }
            '\n' if !in_quotes => {
                records += 1;
                pending = false;
            }
            '\r' if !in_quotes => {}
            _ => pending = true,
        }
    }
    records + usize::from(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_union_of_columns_in_first_seen_order() {
        let rows = vec![
            json!({"id": 1, "name": "Acme"}),
            json!({"id": 2, "name": "Globex", "competitor": "Initech"}),
        ];
        let csv = values_to_csv(&rows);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "id,name,competitor");
        assert_eq!(lines[1], "1,Acme,");
        assert_eq!(lines[2], "2,Globex,Initech");
    }

    #[test]
    fn test_quoting() {
        let rows = vec![json!({"note": "said \"hi\", left", "tags": ["a", "b"]})];
        let csv = values_to_csv(&rows);
        let body = csv.lines().nth(1).unwrap();
        assert_eq!(body, r#""said ""hi"", left","[""a"",""b""]""#);
    }

    #[test]
    fn test_fixed_columns() {
        let rows = vec![json!({"name": "Deal", "value": 5000.0, "extra": true})];
        let csv = to_csv_with_columns(
            &rows,
            &[CsvColumn::new("Title", "name"), CsvColumn::new("Value", "value")],
        )
        .unwrap();
        assert_eq!(csv, "Title,Value\nDeal,5000.0\n");
    }

    #[test]
    fn test_empty_rows_give_empty_header() {
        let rows: Vec<Value> = vec![];
        assert_eq!(values_to_csv(&rows), "\n");
    }

    #[test]
    fn test_count_records_ignores_breaks_inside_quotes() {
        let rows = vec![
            json!({"name": "Acme", "notes": "line one\nline two"}),
            json!({"name": "Globex", "notes": "said \"hi\",\r\nthen left"}),
            json!({"name": "Initech", "notes": ""}),
        ];
        let csv = values_to_csv(&rows);
        assert_eq!(count_records(&csv), 4);
        assert_eq!(count_records("a,b\n1,2"), 2);
        assert_eq!(count_records(""), 0);
    }
}
