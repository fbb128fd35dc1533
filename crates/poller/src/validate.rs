//! Shape checks for the homework status API response.

use serde_json::Value;

use homework_common::error::BotError;
use homework_common::types::HomeworkBatch;

/// Check a raw API response and extract its homework records and timestamp.
///
/// The response is accepted only in full: both `homeworks` (a list) and
/// `current_date` (an integer) must be present. JSON `null` counts as absent.
/// Individual records are returned untouched.
pub fn check_response(response: &Value) -> Result<HomeworkBatch, BotError> {
    let object = response
        .as_object()
        .ok_or_else(|| BotError::Shape(format!("expected a JSON object, got {}", type_name(response))))?;

    let homeworks = object
        .get("homeworks")
        .filter(|v| !v.is_null())
        .ok_or(BotError::MissingField { field: "homeworks" })?;

    let current_date = object
        .get("current_date")
        .filter(|v| !v.is_null())
        .ok_or(BotError::MissingField {
            field: "current_date",
        })?;

    let homeworks = homeworks.as_array().ok_or_else(|| {
        BotError::Shape(format!("`homeworks` is {}, not a list", type_name(homeworks)))
    })?;

    let current_date = current_date.as_i64().ok_or_else(|| {
        BotError::Shape(format!(
            "`current_date` is {}, not an integer timestamp",
            type_name(current_date)
        ))
    })?;

    Ok(HomeworkBatch {
        homeworks: homeworks.clone(),
        current_date,
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
