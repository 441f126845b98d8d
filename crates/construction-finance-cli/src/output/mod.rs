pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Row-shaped collections a result may carry, in the order they are rendered.
pub(crate) const ROW_COLLECTIONS: [&str; 6] = [
    "schedule",
    "yearly_summary",
    "periods",
    "options",
    "sensitivity",
    "lines",
];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Flatten one level of nested objects into dotted keys
/// (`inflows.equity`, `outflows.total`).
pub(crate) fn flatten_row(row: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut out = Vec::with_capacity(row.len());
    for (key, val) in row {
        match val {
            Value::Object(inner) => {
                for (k, v) in inner {
                    out.push((format!("{key}.{k}"), v.clone()));
                }
            }
            _ => out.push((key.clone(), val.clone())),
        }
    }
    out
}
