use serde_json::Value;

use homework_common::error::BotError;
use homework_common::types::HomeworkStatus;

/// Build the notification text for one homework record.
///
/// `homework_name` and `status` must be non-empty strings and the status must
/// be one of the documented codes.
pub fn parse_status(homework: &Value) -> Result<String, BotError> {
    let record = homework
        .as_object()
        .ok_or_else(|| BotError::Shape("homework record is not a JSON object".to_string()))?;

    let name = non_empty_str(record.get("homework_name")).ok_or(BotError::MissingField {
        field: "homework_name",
    })?;
    let code =
        non_empty_str(record.get("status")).ok_or(BotError::MissingField { field: "status" })?;

    let status = HomeworkStatus::from_code(code).ok_or_else(|| BotError::UnknownStatus {
        code: code.to_string(),
    })?;

    Ok(format!("Status changed for \"{name}\": {}", status.verdict()))
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}
