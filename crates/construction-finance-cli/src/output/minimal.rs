use serde_json::Value;

/// Print just the headline figure of a calculation.
///
/// Looks for well-known result fields in priority order, then falls back
/// to the first scalar field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "monthly_payment",
        "cheapest",
        "npv",
        "roi",
        "total_taxes",
        "overall_status",
        "total_variance",
        "status",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Cash-flow projections keep their headline figure in the summary
        if let Some(Value::Object(summary)) = map.get("summary") {
            if let Some(peak) = summary.get("peak_funding_requirement") {
                println!("{}", format_minimal(peak));
                return;
            }
        }

        if let Some((key, val)) = map.iter().find(|(_, v)| !v.is_array() && !v.is_object()) {
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
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
