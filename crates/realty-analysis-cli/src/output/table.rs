use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Render output as tables: scalar fields in a summary table, each nested
/// object in its own section, arrays of rows (schedules, stress scenarios)
/// as multi-column tables and string lists as bullets.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                print_sections("Result", result);
                print_envelope_footer(map);
            }
            _ => print_sections("Result", map),
        },
        Value::Array(arr) => print_rows(None, arr),
        _ => println!("{}", value),
    }
}

fn print_sections(title: &str, map: &Map<String, Value>) {
    let scalars: Vec<(&String, &Value)> = map.iter().filter(|(_, v)| is_scalar(v)).collect();
    if !scalars.is_empty() {
        println!("{}", title);
        print_key_values(scalars.into_iter().map(|(k, v)| (k.clone(), v)));
    }

    for (key, val) in map {
        match val {
            Value::Object(inner) => {
                println!("\n{}", heading(key));
                let mut flat = Vec::new();
                flatten(None, inner, &mut flat);
                print_key_values(flat.into_iter());
                for (child, rows) in inner.iter().filter_map(|(k, v)| v.as_array().map(|a| (k, a))) {
                    if rows.iter().any(Value::is_object) {
                        print_rows(Some(format!("{} / {}", heading(key), heading(child)).as_str()), rows);
                    }
                }
            }
            Value::Array(arr) if arr.iter().any(Value::is_object) => {
                print_rows(Some(heading(key).as_str()), arr);
            }
            Value::Array(arr) if key != "warnings" => print_bullets(&heading(key), arr),
            _ => {}
        }
    }
}

fn print_envelope_footer(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        print_bullets("Warnings", warnings);
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Nested objects become dotted keys; arrays of rows are printed separately.
fn flatten<'a>(prefix: Option<&str>, map: &'a Map<String, Value>, out: &mut Vec<(String, &'a Value)>) {
    for (key, val) in map {
        let name = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        match val {
            Value::Object(inner) => flatten(Some(&name), inner, out),
            Value::Array(arr) if arr.iter().any(Value::is_object) => {}
            _ => out.push((name, val)),
        }
    }
}

fn print_key_values<'a>(pairs: impl Iterator<Item = (String, &'a Value)>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in pairs {
        builder.push_record([key, format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(title: Option<&str>, arr: &[Value]) {
    if let Some(t) = title {
        println!("\n{}", t);
    }
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            println!("{}", format_value(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_bullets(title: &str, items: &[Value]) {
    if items.is_empty() {
        return;
    }
    println!("\n{}:", title);
    for item in items {
        println!("  - {}", format_value(item));
    }
}

fn heading(key: &str) -> String {
    key.split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::Null => "N/A".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
