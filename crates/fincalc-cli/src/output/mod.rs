pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use fincalc_core::periods::round_money;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::OutputFormat;

/// Result fields holding period-by-period rows, in lookup order.
const ROW_FIELDS: [&str; 8] = [
    "schedule",
    "cashflows",
    "segments",
    "installments",
    "projection",
    "yearly",
    "yearly_summary",
    "breakdown",
];

/// Presentation switches shared by every formatter.
pub struct OutputOptions {
    pub decimals: Option<u32>,
    pub schedule: bool,
}

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value, options: &OutputOptions) {
    let mut shaped = if options.schedule {
        match schedule_rows(value) {
            Some(rows) => rows,
            None => {
                tracing::warn!("result has no period rows; printing the summary");
                summary_only(value)
            }
        }
    } else if matches!(format, OutputFormat::Json) {
        value.clone()
    } else {
        summary_only(value)
    };

    if let Some(dp) = options.decimals {
        round_decimals(&mut shaped, dp);
    }

    match format {
        OutputFormat::Json => json::print_json(&shaped),
        OutputFormat::Table => table::print_table(&shaped),
        OutputFormat::Csv => csv_out::print_csv(&shaped),
        OutputFormat::Minimal => minimal::print_minimal(&shaped),
    }
}

/// First row array found in the result envelope (nested mortgage schedules included).
fn schedule_rows(value: &Value) -> Option<Value> {
    let result = value.get("result").unwrap_or(value);
    let nested = result.get("amortization");
    ROW_FIELDS.iter().find_map(|key| {
        result
            .get(*key)
            .or_else(|| nested.and_then(|n| n.get(*key)))
            .filter(|rows| rows.as_array().is_some_and(|a| !a.is_empty()))
            .cloned()
    })
}

/// Drop row arrays and nested objects from the result so it fits a two-column layout.
fn summary_only(value: &Value) -> Value {
    let mut trimmed = value.clone();
    if let Some(Value::Object(result)) = trimmed.get_mut("result") {
        result.retain(|_, v| !matches!(v, Value::Array(_) | Value::Object(_)));
    }
    trimmed
}

/// Round every decimal string in place. Dates and labels do not parse and are left alone.
fn round_decimals(value: &mut Value, dp: u32) {
    match value {
        Value::String(s) => {
            if let Ok(d) = Decimal::from_str(s) {
                *s = round_money(d, dp).to_string();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| round_decimals(v, dp)),
        Value::Object(map) => map.values_mut().for_each(|v| round_decimals(v, dp)),
        _ => {}
    }
}
