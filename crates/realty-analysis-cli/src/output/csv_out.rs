use serde_json::Value;
use std::io;

/// Write output as `field,value` CSV. Nested objects are flattened to
/// dotted paths and rows of arrays to indexed paths, e.g.
/// `loan.amortization[0].ending_balance`. Not-applicable values are empty.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let body = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let mut rows = Vec::new();
    flatten("", body, &mut rows);

    let _ = wtr.write_record(["field", "value"]);
    for (field, val) in rows {
        let _ = wtr.write_record([field, val]);
    }
    let _ = wtr.flush();
}

fn flatten(path: &str, value: &Value, rows: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                flatten(&child, val, rows);
            }
        }
        Value::Array(arr) if arr.iter().all(|v| !v.is_object() && !v.is_array()) => {
            let joined: Vec<String> = arr.iter().map(format_csv_value).collect();
            rows.push((path.to_string(), joined.join("; ")));
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                flatten(&format!("{path}[{i}]"), item, rows);
            }
        }
        _ => rows.push((path.to_string(), format_csv_value(value))),
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
