use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer};
use uuid::Uuid;
use validator::ValidationError;

use crate::error::ApiError;

/// Distinguish an absent key (`None`) from an explicit `null` (`Some(None)`).
/// Use together with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Accept the boolean spellings form-style clients send: `true`, `1`,
/// `"true"`, `"1"`, `"yes"`, `"on"`, `"t"`, `"y"` and their false
/// counterparts. Anything else, `null` included, is rejected.
pub fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    let parsed = match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => Some(b),
        Raw::Int(1) => Some(true),
        Raw::Int(0) => Some(false),
        Raw::Int(_) => None,
        Raw::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" | "t" | "y" => Some(true),
            "false" | "0" | "no" | "off" | "f" | "n" => Some(false),
            _ => None,
        },
    };
    parsed.ok_or_else(|| de::Error::custom("Must be a valid boolean."))
}

/// `flexible_bool` for optional keys. Use together with `#[serde(default)]`.
pub fn optional_flexible_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    flexible_bool(deserializer).map(Some)
}

/// Usernames: letters, digits and @/./+/-/_ only
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if username.chars().all(allowed) {
        Ok(())
    } else {
        let mut err = ValidationError::new("username_chars");
        err.message = Some("Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.".into());
        Err(err)
    }
}

/// Titles and names must contain something other than whitespace
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("This field may not be blank.".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Parse a path id. Malformed ids are reported exactly like missing records so
/// that nothing about other users' data can be inferred.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("{} not found", what)))
}

/// Parse a `YYYY-MM-DD` date, reporting failures against `field`
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError::field_error(field, "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.")
    })
}

/// Length check for nullable fields the derive cannot reach
pub fn check_max_length(field: &str, value: Option<&str>, max: usize) -> Result<(), ApiError> {
    match value {
        Some(v) if v.chars().count() > max => Err(ApiError::field_error(
            field,
            format!("Ensure this field has no more than {} characters.", max),
        )),
        _ => Ok(()),
    }
}
