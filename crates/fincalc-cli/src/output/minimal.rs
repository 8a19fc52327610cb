use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "monthly_payment",
        "total_monthly_payment",
        "apr",
        "price",
        "required_monthly_investment",
        "future_value",
        "maturity_value",
        "back_end_ratio",
        "break_even_months",
        "irr",
        "total_tax",
        "interest",
        "net_gain",
    ];

    if let Value::Object(map) = result_obj {
        // TVM results carry every variable; print the solved one
        if let Some(solved) = map.get("solve_for").and_then(Value::as_str) {
            let key = if solved == "rate" { "annual_rate" } else { solved };
            if let Some(val) = map.get(key) {
                println!("{}", format_minimal(val));
                return;
            }
        }

        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    // Row arrays print one line per row
    if let Value::Array(rows) = result_obj {
        for row in rows {
            println!("{}", format_minimal(row));
        }
        return;
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
