//! Structural validation of raw provider text.
//!
//! Providers are untrusted: a reply is either `Valid` (usable, possibly after
//! dropping malformed items) or `Invalid` with a reason, which moves the
//! fallback chain on to the next candidate.

use serde_json::{Map, Value};

use snapbill_core::domain::bill::WALK_IN_CUSTOMER;
use snapbill_core::domain::billing::{BillingLine, BillingUpdate, ReplyKind};

#[derive(Clone, Debug, PartialEq)]
pub enum Verdict<T> {
    Valid(T),
    Invalid(String),
}

#[cfg(test)]
impl<T> Verdict<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Removes a surrounding ```` ```json ```` (or bare ```` ``` ````) fence.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").or_else(|| rest.strip_prefix("JSON")).unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Parses fence-stripped text into a JSON object.
pub fn parse_object(raw: &str) -> Result<Map<String, Value>, String> {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(format!("expected a JSON object, got {}", json_kind(&other))),
        Err(error) => Err(format!("not valid JSON: {error}")),
    }
}

/// Accepts JSON numbers and numeric strings; rejects negatives and non-finite values.
pub fn non_negative_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (number.is_finite() && number >= 0.0).then_some(number)
}

pub fn validate_billing_reply(raw: &str) -> Verdict<BillingUpdate> {
    let object = match parse_object(raw) {
        Ok(object) => object,
        Err(reason) => return Verdict::Invalid(reason),
    };

    let Some(kind) = object.get("type").and_then(Value::as_str) else {
        return Verdict::Invalid("missing string field `type`".to_string());
    };
    let Some(message) = object.get("msg").and_then(Value::as_str) else {
        return Verdict::Invalid("missing string field `msg`".to_string());
    };

    let items = match object.get("items") {
        Some(Value::Array(entries)) => entries.iter().filter_map(billing_line).collect::<Vec<_>>(),
        _ => Vec::new(),
    };

    // Only an explicit ERROR carrying resolvable items is a partial bill;
    // an unrecognised type stays an error.
    let explicit_error = kind.trim().eq_ignore_ascii_case("ERROR");
    let mut kind = ReplyKind::parse(kind);
    if explicit_error && !items.is_empty() {
        kind = ReplyKind::Bill;
    }
    let items = if kind == ReplyKind::Bill { items } else { Vec::new() };

    let customer_name = object
        .get("customer_name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(WALK_IN_CUSTOMER)
        .to_string();
    let should_stop = match object.get("should_stop") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
        _ => false,
    };

    Verdict::Valid(BillingUpdate {
        kind,
        customer_name,
        items,
        message: message.to_string(),
        should_stop,
        continuation: !should_stop,
    })
}

fn billing_line(entry: &Value) -> Option<BillingLine> {
    let object = entry.as_object()?;
    let name = object.get("name").and_then(Value::as_str)?.trim();
    if name.is_empty() {
        return None;
    }
    let rate = non_negative_number(object.get("rate"))?;
    let total = non_negative_number(object.get("total"))?;
    let unit = object.get("unit").and_then(Value::as_str).unwrap_or_default().trim().to_string();
    let qty_display = match object.get("qty_display") {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    };

    Some(BillingLine { name: name.to_string(), qty_display, rate, total, unit })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
