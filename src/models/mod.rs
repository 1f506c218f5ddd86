//! Records exchanged with the OPD backend: staff users, patients and
//! their prescriptions.

pub mod enums;
pub mod patient;
pub mod prescription;
pub mod user;

pub use enums::*;
pub use patient::*;
pub use prescription::*;
pub use user::*;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}

/// Numbers arrive as JSON numbers or as form strings ("500", "").
fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Optional money amount. Blank, null and non-numeric values become `None`.
pub(crate) fn de_opt_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

/// Non-negative whole number (age, token number). Missing or garbage becomes 0.
pub(crate) fn de_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_from_value)
        .filter(|n| *n >= 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n.trunc() as u32)
        .unwrap_or(0))
}

/// A fee counts only when it is present and non-zero.
pub(crate) fn truthy_fee(fee: Option<f64>) -> Option<f64> {
    fee.filter(|f| *f != 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "de_opt_amount")]
        fee: Option<f64>,
        #[serde(default, deserialize_with = "de_count")]
        count: u32,
    }

    fn sample(value: Value) -> Sample {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn amounts_accept_numbers_and_numeric_strings() {
        assert_eq!(sample(json!({"fee": 500})).fee, Some(500.0));
        assert_eq!(sample(json!({"fee": "350.5"})).fee, Some(350.5));
        assert_eq!(sample(json!({"fee": " 200 "})).fee, Some(200.0));
    }

    #[test]
    fn blank_amounts_become_none() {
        assert_eq!(sample(json!({"fee": ""})).fee, None);
        assert_eq!(sample(json!({"fee": null})).fee, None);
        assert_eq!(sample(json!({})).fee, None);
        assert_eq!(sample(json!({"fee": "n/a"})).fee, None);
    }

    #[test]
    fn counts_are_lenient() {
        assert_eq!(sample(json!({"count": 42})).count, 42);
        assert_eq!(sample(json!({"count": "7"})).count, 7);
        assert_eq!(sample(json!({"count": -3})).count, 0);
        assert_eq!(sample(json!({})).count, 0);
    }

    #[test]
    fn zero_fee_is_not_truthy() {
        assert_eq!(truthy_fee(Some(0.0)), None);
        assert_eq!(truthy_fee(None), None);
        assert_eq!(truthy_fee(Some(300.0)), Some(300.0));
    }
}
