use serde_json::Value;

/// Amounts a caller most likely wants when asking for a single value, in
/// order of preference.
const PRIORITY_KEYS: [&str; 10] = [
    "payment",
    "payoff_amount",
    "due_amount",
    "principal_paid",
    "origination_fee",
    "late_fee",
    "effective_apr",
    "total_cost",
    "entries",
    "final_state",
];

/// Print just the headline value of the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in &PRIORITY_KEYS {
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

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => arr.len().to_string(),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
