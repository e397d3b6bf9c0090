use serde_json::Value;

/// Print just the headline answer.
///
/// An analysis prints `score grade recommendation`; otherwise the first present
/// key from a priority list, falling back to the first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result_obj else {
        println!("{}", format_minimal(result_obj));
        return;
    };

    if let (Some(score), Some(rec)) = (map.get("score"), map.get("recommendation")) {
        match map.get("grade") {
            Some(grade) => println!("{} {} {}", format_minimal(score), format_minimal(grade), format_minimal(rec)),
            None => println!("{} {}", format_minimal(score), format_minimal(rec)),
        }
        return;
    }

    let priority_keys = [
        "monthly_payment",
        "total_monthly_payment",
        "monthly_cash_flow",
        "net_operating_income",
    ];
    for key in &priority_keys {
        if let Some(val) = map.get(*key).filter(|v| !v.is_null()) {
            println!("{}", format_minimal(val));
            return;
        }
    }

    if let Some((key, val)) = map.iter().next() {
        println!("{}: {}", key, format_minimal(val));
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "N/A".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
