use docwalk_core::DocumentData;
use jiff::Timestamp;
use serde_json::Value;

const SECONDS_KEY: &str = "_seconds";
const NANOSECONDS_KEY: &str = "_nanoseconds";

/// Makes document data easier to read when exported to JSON.
///
/// Timestamps, stored as `{ "_seconds": .., "_nanoseconds": .. }` objects,
/// become `"(timestamp) <RFC 3339>"` strings, and object keys are sorted
/// recursively, including objects nested in arrays.
pub fn make_document_human_readable(data: &DocumentData) -> DocumentData {
    readable_object(data)
}

fn readable_object(data: &DocumentData) -> DocumentData {
    let mut entries: Vec<(&String, &Value)> = data.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));

    entries
        .into_iter()
        .map(|(key, value)| (key.clone(), readable_value(value)))
        .collect()
}

fn readable_value(value: &Value) -> Value {
    match value {
        Value::Object(object) => match timestamp_string(object) {
            Some(formatted) => Value::String(formatted),
            None => Value::Object(readable_object(object)),
        },
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::Object(object) => Value::Object(readable_object(object)),
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

fn timestamp_string(object: &DocumentData) -> Option<String> {
    if object.len() != 2 {
        return None;
    }
    let seconds = object.get(SECONDS_KEY)?.as_i64()?;
    let nanoseconds = i32::try_from(object.get(NANOSECONDS_KEY)?.as_i64()?).ok()?;
    let timestamp = Timestamp::new(seconds, nanoseconds).ok()?;
    Some(format!(
        "(timestamp) {}",
        timestamp.strftime("%Y-%m-%dT%H:%M:%S%.3fZ")
    ))
}
