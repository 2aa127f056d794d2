use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};
use thiserror::Error;

/// Lenient runtime coercion rules, used only by the lenient insert shape.
///
/// Each rule exists twice: [`CoercionRule::apply`] implements the acceptance
/// semantics natively over JSON values (so the rules are testable without a
/// JavaScript runtime), and [`CoercionRule::helper_source`] is the validator
/// helper emitted into the document prelude for the target runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CoercionRule {
    Boolean,
    Integer,
    Float,
    Temporal,
}

/// Structured issue raised when a lenient coercion is impossible.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot coerce {received} ({category}) to {target}")]
pub struct CoercionIssue {
    /// Target scalar category (e.g. `boolean`).
    pub target: &'static str,
    /// The received value, rendered for the message.
    pub received: String,
    /// Runtime category of the received value.
    pub category: &'static str,
}

impl CoercionRule {
    /// Name of the emitted helper in the document prelude.
    pub fn helper_name(&self) -> &'static str {
        match self {
            CoercionRule::Boolean => "lenientBoolean",
            CoercionRule::Integer => "lenientInteger",
            CoercionRule::Float => "lenientFloat",
            CoercionRule::Temporal => "lenientTimestamp",
        }
    }

    fn target(&self) -> &'static str {
        match self {
            CoercionRule::Boolean => "boolean",
            CoercionRule::Integer => "integer",
            CoercionRule::Float => "float",
            CoercionRule::Temporal => "timestamp",
        }
    }

    /// Apply the rule to a JSON value, producing the coerced value.
    pub fn apply(&self, value: &Value) -> Result<Value, CoercionIssue> {
        match self {
            CoercionRule::Boolean => apply_boolean(value),
            CoercionRule::Integer => apply_integer(value),
            CoercionRule::Float => apply_float(value),
            CoercionRule::Temporal => apply_temporal(value),
        }
        .ok_or_else(|| CoercionIssue {
            target: self.target(),
            received: render_value(value),
            category: value_category(value),
        })
    }

    /// Emitted helper body for the target validator runtime.
    ///
    /// The helpers additionally pass through native values (`Date` instances)
    /// that cannot occur in JSON input but can at the storage boundary.
    pub fn helper_source(&self) -> &'static str {
        match self {
            CoercionRule::Boolean => BOOLEAN_HELPER,
            CoercionRule::Integer => INTEGER_HELPER,
            CoercionRule::Float => FLOAT_HELPER,
            CoercionRule::Temporal => TEMPORAL_HELPER,
        }
    }
}

fn apply_boolean(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(flag) => Some(Value::Bool(*flag)),
        Value::String(text) => {
            if text.eq_ignore_ascii_case("true") {
                Some(Value::Bool(true))
            } else if text.eq_ignore_ascii_case("false") {
                Some(Value::Bool(false))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn apply_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Number(number) => {
            if number.is_i64() || number.is_u64() {
                return Some(Value::Number(number.clone()));
            }
            let float = number.as_f64()?;
            if float.is_finite() && float.fract() == 0.0 && in_i64_range(float) {
                return Some(Value::Number(Number::from(float as i64)));
            }
            None
        }
        // Only canonical base-10 strings: the round trip must reproduce the
        // input exactly, rejecting leading zeros, whitespace, and partial
        // parses.
        Value::String(text) => {
            let parsed: i64 = text.parse().ok()?;
            if parsed.to_string() == *text {
                Some(Value::Number(Number::from(parsed)))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn in_i64_range(float: f64) -> bool {
    float >= i64::MIN as f64 && float <= i64::MAX as f64
}

fn apply_float(value: &Value) -> Option<Value> {
    match value {
        Value::Number(number) => Some(Value::Number(number.clone())),
        Value::String(text) => {
            let parsed: f64 = text.parse().ok()?;
            if parsed.is_finite() {
                Number::from_f64(parsed).map(Value::Number)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn apply_temporal(value: &Value) -> Option<Value> {
    let Value::String(text) = value else {
        return None;
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(Value::String(parsed.to_rfc3339()));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Value::String(parsed.format("%Y-%m-%dT%H:%M:%S%.f").to_string()));
        }
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(Value::String(parsed.format("%Y-%m-%d").to_string()));
    }
    None
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => format!("\"{text}\""),
        other => other.to_string(),
    }
}

fn value_category(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

const BOOLEAN_HELPER: &str = r#"const lenientBoolean = z.unknown().transform((value, ctx) => {
  if (typeof value === "boolean") return value;
  if (typeof value === "string") {
    const lowered = value.toLowerCase();
    if (lowered === "true") return true;
    if (lowered === "false") return false;
  }
  ctx.addIssue({
    code: z.ZodIssueCode.custom,
    message: `cannot coerce ${JSON.stringify(value)} (${typeof value}) to boolean`,
  });
  return z.NEVER;
});"#;

const INTEGER_HELPER: &str = r#"const lenientInteger = z.unknown().transform((value, ctx) => {
  if (typeof value === "number" && Number.isInteger(value)) return value;
  if (typeof value === "string") {
    const parsed = Number.parseInt(value, 10);
    if (Number.isSafeInteger(parsed) && String(parsed) === value) return parsed;
  }
  ctx.addIssue({
    code: z.ZodIssueCode.custom,
    message: `cannot coerce ${JSON.stringify(value)} (${typeof value}) to integer`,
  });
  return z.NEVER;
});"#;

const FLOAT_HELPER: &str = r#"const lenientFloat = z.unknown().transform((value, ctx) => {
  if (typeof value === "number") return value;
  if (typeof value === "string" && value.trim() !== "") {
    const parsed = Number(value);
    if (Number.isFinite(parsed)) return parsed;
  }
  ctx.addIssue({
    code: z.ZodIssueCode.custom,
    message: `cannot coerce ${JSON.stringify(value)} (${typeof value}) to float`,
  });
  return z.NEVER;
});"#;

const TEMPORAL_HELPER: &str = r#"const lenientTimestamp = z.unknown().transform((value, ctx) => {
  if (value instanceof Date && !Number.isNaN(value.getTime())) return value;
  if (typeof value === "string") {
    const parsed = new Date(value);
    if (!Number.isNaN(parsed.getTime())) return parsed;
  }
  ctx.addIssue({
    code: z.ZodIssueCode.custom,
    message: `cannot coerce ${JSON.stringify(value)} (${typeof value}) to timestamp`,
  });
  return z.NEVER;
});"#;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn boolean_accepts_native_and_case_insensitive_strings() {
        assert_eq!(
            CoercionRule::Boolean.apply(&json!(true)).unwrap(),
            json!(true)
        );
        assert_eq!(
            CoercionRule::Boolean.apply(&json!("TRUE")).unwrap(),
            json!(true)
        );
        assert_eq!(
            CoercionRule::Boolean.apply(&json!("False")).unwrap(),
            json!(false)
        );
    }

    #[test]
    fn boolean_issue_names_value_and_category() {
        let issue = CoercionRule::Boolean.apply(&json!("yes")).unwrap_err();
        assert_eq!(issue.received, "\"yes\"");
        assert_eq!(issue.category, "string");
        let message = issue.to_string();
        assert!(message.contains("\"yes\""));
        assert!(message.contains("string"));
    }

    #[test]
    fn integer_requires_canonical_strings() {
        assert_eq!(
            CoercionRule::Integer.apply(&json!("42")).unwrap(),
            json!(42)
        );
        assert!(CoercionRule::Integer.apply(&json!("042")).is_err());
        assert!(CoercionRule::Integer.apply(&json!(" 42")).is_err());
        assert!(CoercionRule::Integer.apply(&json!("42abc")).is_err());
    }

    #[test]
    fn integer_rejects_fractional_numbers() {
        assert_eq!(CoercionRule::Integer.apply(&json!(42)).unwrap(), json!(42));
        assert!(CoercionRule::Integer.apply(&json!(42.5)).is_err());
    }

    #[test]
    fn float_parses_numeric_strings_only() {
        assert_eq!(
            CoercionRule::Float.apply(&json!("1.25")).unwrap(),
            json!(1.25)
        );
        assert_eq!(CoercionRule::Float.apply(&json!(3.5)).unwrap(), json!(3.5));
        assert!(CoercionRule::Float.apply(&json!("abc")).is_err());
        assert!(CoercionRule::Float.apply(&json!(null)).is_err());
    }

    #[test]
    fn temporal_accepts_calendar_strings() {
        assert!(CoercionRule::Temporal.apply(&json!("2024-01-02")).is_ok());
        assert!(
            CoercionRule::Temporal
                .apply(&json!("2024-01-02T10:20:30Z"))
                .is_ok()
        );
        assert!(CoercionRule::Temporal.apply(&json!("not a date")).is_err());
        assert!(CoercionRule::Temporal.apply(&json!(1234)).is_err());
    }
}
