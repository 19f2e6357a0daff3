//! Accessors for the dynamic data bag of process items.
//!
//! Field values are filled in by forms designed in the platform, so the same
//! field can arrive as a JSON number or as a numeric string depending on the
//! form widget. These helpers coerce both shapes.

use crate::error::TaskDataError;
use crate::models::{JsonValue, ProcessItem};
use serde_json::Value;

pub fn value_as_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

pub fn value_as_f64(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Task data of a retrieved process item, or an error naming the item.
pub fn task_data(item: &ProcessItem) -> Result<&JsonValue, TaskDataError> {
    item.task_data()
        .ok_or_else(|| TaskDataError::NoData(item.id.clone()))
}

pub fn require_string(data: &JsonValue, key: &str) -> Result<String, TaskDataError> {
    value_as_string(data.get(key)).ok_or_else(|| TaskDataError::MissingField(key.to_string()))
}

pub fn require_f64(data: &JsonValue, key: &str) -> Result<f64, TaskDataError> {
    let value = data
        .get(key)
        .ok_or_else(|| TaskDataError::MissingField(key.to_string()))?;
    value_as_f64(Some(value)).ok_or_else(|| TaskDataError::NotANumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProcessItemTask;
    use serde_json::json;

    #[test]
    fn value_as_string_covers_scalars() {
        assert_eq!(value_as_string(Some(&json!("EUR"))), Some("EUR".to_string()));
        assert_eq!(value_as_string(Some(&json!(12.5))), Some("12.5".to_string()));
        assert_eq!(value_as_string(Some(&json!(true))), Some("true".to_string()));
        assert_eq!(value_as_string(Some(&json!(null))), None);
        assert_eq!(value_as_string(Some(&json!(["a"]))), None);
        assert_eq!(value_as_string(None), None);
    }

    #[test]
    fn value_as_f64_accepts_numbers_and_numeric_strings() {
        assert_eq!(value_as_f64(Some(&json!(1000))), Some(1000.0));
        assert_eq!(value_as_f64(Some(&json!(" 1000.5 "))), Some(1000.5));
        assert_eq!(value_as_f64(Some(&json!("abc"))), None);
        assert_eq!(value_as_f64(Some(&json!(false))), None);
    }

    #[test]
    fn require_helpers_report_field_problems() {
        let data: JsonValue = [("AMOUNT", json!("lots")), ("NAME", json!("Ada"))]
            .into_iter()
            .collect();

        assert_eq!(require_string(&data, "NAME").unwrap(), "Ada");
        assert_eq!(
            require_string(&data, "DECISION").unwrap_err(),
            TaskDataError::MissingField("DECISION".to_string())
        );
        assert_eq!(
            require_f64(&data, "AMOUNT").unwrap_err(),
            TaskDataError::NotANumber {
                key: "AMOUNT".to_string(),
                value: "\"lots\"".to_string(),
            }
        );
    }

    #[test]
    fn task_data_requires_a_task_with_data() {
        let mut item = ProcessItem {
            id: "item-1".to_string(),
            process_id: "p-1".to_string(),
            ..Default::default()
        };
        assert_eq!(
            task_data(&item).unwrap_err(),
            TaskDataError::NoData("item-1".to_string())
        );

        item.task = Some(ProcessItemTask {
            status: None,
            data: Some([("AMOUNT", 5)].into_iter().collect()),
        });
        assert_eq!(require_f64(task_data(&item).unwrap(), "AMOUNT").unwrap(), 5.0);
    }
}
