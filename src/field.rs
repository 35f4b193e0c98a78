//! Self-validating request fields.
//!
//! A [`Field`] is a schema-level descriptor: it says whether a value must be
//! present (`required`), whether an empty value is acceptable (`nullable`),
//! and which [`Rule`] checks the value's shape. It never holds a request's
//! value itself; [`Field::check`] takes the tainted input and returns a
//! verified [`FieldValue`] or a [`FieldError`].
//!
//! The two error kinds are kept apart on purpose: [`FieldErrorKind::Missing`]
//! feeds the record's required-fields error and [`FieldErrorKind::Invalid`]
//! feeds its bad-fields error.

use std::fmt;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Tainted, Verified};

/// Wire format of every date field.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Oldest accepted age, in whole years of 365 days.
pub const MAX_AGE_YEARS: i64 = 70;

/// Error returned when a field rejects its input.
///
/// # Examples
///
/// ```
/// use scoring_api::field::{FieldError, FieldErrorKind};
///
/// let error = FieldError::invalid("must contain '@'");
/// assert_eq!(error.kind(), FieldErrorKind::Invalid);
/// assert_eq!(error.message(), "must contain '@'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FieldError {
    kind: FieldErrorKind,
    message: String,
}

impl FieldError {
    /// A required value was absent, null, or empty on a non-nullable field.
    pub fn missing() -> Self {
        Self {
            kind: FieldErrorKind::Missing,
            message: "value is required".to_string(),
        }
    }

    /// A value was supplied but failed the field's rule.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            kind: FieldErrorKind::Invalid,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> FieldErrorKind {
        self.kind
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Kind of field failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// No usable value where one is required.
    Missing,
    /// A value of the wrong type or format.
    Invalid,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// Closed gender enumeration carried by `GenderField`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum Gender {
    /// Code 0.
    Unknown,
    /// Code 1.
    Male,
    /// Code 2.
    Female,
}

impl Gender {
    /// Maps a wire code to a gender.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::Male),
            2 => Some(Self::Female),
            _ => None,
        }
    }

    /// Returns the wire code.
    pub fn code(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Male => 1,
            Self::Female => 2,
        }
    }
}

impl From<Gender> for u8 {
    fn from(gender: Gender) -> Self {
        gender.code()
    }
}

/// A validated field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Text: char, email and phone fields.
    Text(String),
    /// A parsed `DD.MM.YYYY` date.
    Date(NaiveDate),
    /// A gender code.
    Gender(Gender),
    /// An arbitrary JSON list.
    List(Vec<Value>),
    /// A list of integer client ids.
    ClientIds(Vec<i64>),
    /// A JSON object (the envelope's `arguments`).
    Arguments(Map<String, Value>),
}

impl FieldValue {
    /// Returns the text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the date, if this is a date value.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the gender, if this is a gender value.
    pub fn as_gender(&self) -> Option<Gender> {
        match self {
            Self::Gender(g) => Some(*g),
            _ => None,
        }
    }

    /// Consumes the value, returning client ids if present.
    pub fn into_client_ids(self) -> Option<Vec<i64>> {
        match self {
            Self::ClientIds(ids) => Some(ids),
            _ => None,
        }
    }

    /// Consumes the value, returning the object if present.
    pub fn into_arguments(self) -> Option<Map<String, Value>> {
        match self {
            Self::Arguments(map) => Some(map),
            _ => None,
        }
    }

    /// Consumes the value, returning the text if present.
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Type-specific validation contract of a field.
///
/// A rule only ever sees a present, non-null value; the required/nullable
/// checks happen in [`Field::check`] before the rule runs. Rules report shape
/// failures with [`FieldError::invalid`].
pub trait Rule: fmt::Debug + Send + Sync {
    /// Validates `raw`, returning the typed value on success.
    ///
    /// # Errors
    ///
    /// Returns an `Invalid` [`FieldError`] describing the violation.
    fn validate(&self, raw: &Value) -> Result<FieldValue, FieldError>;
}

/// Any JSON string.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharField;

impl CharField {
    fn text(raw: &Value) -> Result<&str, FieldError> {
        raw.as_str()
            .ok_or_else(|| FieldError::invalid("must be a string"))
    }
}

impl Rule for CharField {
    fn validate(&self, raw: &Value) -> Result<FieldValue, FieldError> {
        Self::text(raw).map(|s| FieldValue::Text(s.to_string()))
    }
}

/// Any JSON array.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListField;

impl ListField {
    fn items(raw: &Value) -> Result<&Vec<Value>, FieldError> {
        raw.as_array()
            .ok_or_else(|| FieldError::invalid("must be a list"))
    }
}

impl Rule for ListField {
    fn validate(&self, raw: &Value) -> Result<FieldValue, FieldError> {
        Self::items(raw).map(|items| FieldValue::List(items.clone()))
    }
}

/// Any JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct DictField;

impl Rule for DictField {
    fn validate(&self, raw: &Value) -> Result<FieldValue, FieldError> {
        raw.as_object()
            .map(|map| FieldValue::Arguments(map.clone()))
            .ok_or_else(|| FieldError::invalid("must be an object"))
    }
}

/// A string containing `@`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailField;

impl Rule for EmailField {
    fn validate(&self, raw: &Value) -> Result<FieldValue, FieldError> {
        let text = CharField::text(raw)?;
        if !text.contains('@') {
            return Err(FieldError::invalid("must contain '@'"));
        }
        Ok(FieldValue::Text(text.to_string()))
    }
}

/// Eleven digits starting with `7`, given as a string or an integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneField;

impl PhoneField {
    const LEN: usize = 11;
}

impl Rule for PhoneField {
    fn validate(&self, raw: &Value) -> Result<FieldValue, FieldError> {
        let phone = match raw {
            Value::String(s) => s.clone(),
            Value::Number(n) if n.is_u64() || n.is_i64() => n.to_string(),
            _ => return Err(FieldError::invalid("must be a string or an integer")),
        };

        if phone.chars().count() != Self::LEN {
            return Err(FieldError::invalid("must contain 11 digits"));
        }
        if !phone.chars().all(|c| c.is_ascii_digit()) {
            return Err(FieldError::invalid("must contain only digits"));
        }
        if !phone.starts_with('7') {
            return Err(FieldError::invalid("must start with '7'"));
        }
        Ok(FieldValue::Text(phone))
    }
}

/// A `DD.MM.YYYY` string.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateField;

impl DateField {
    fn parse(raw: &Value) -> Result<NaiveDate, FieldError> {
        let text = CharField::text(raw)?;
        NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map_err(|e| FieldError::invalid(format!("must be a DD.MM.YYYY date: {e}")))
    }
}

impl Rule for DateField {
    fn validate(&self, raw: &Value) -> Result<FieldValue, FieldError> {
        Self::parse(raw).map(FieldValue::Date)
    }
}

/// A date less than [`MAX_AGE_YEARS`] years before today.
///
/// Age is `days_since / 365` with floor division, so dates in the future are
/// accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct BirthDayField {
    today: Option<NaiveDate>,
}

impl BirthDayField {
    /// Checks ages against a fixed reference date instead of the local clock.
    pub fn as_of(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

impl Rule for BirthDayField {
    fn validate(&self, raw: &Value) -> Result<FieldValue, FieldError> {
        let date = DateField::parse(raw)?;
        let age = (self.today() - date).num_days().div_euclid(365);
        if age >= MAX_AGE_YEARS {
            return Err(FieldError::invalid(format!(
                "must be less than {MAX_AGE_YEARS} years ago"
            )));
        }
        Ok(FieldValue::Date(date))
    }
}

/// An integer gender code: 0, 1 or 2.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenderField;

impl Rule for GenderField {
    fn validate(&self, raw: &Value) -> Result<FieldValue, FieldError> {
        raw.as_i64()
            .and_then(Gender::from_code)
            .map(FieldValue::Gender)
            .ok_or_else(|| FieldError::invalid("must be one of 0, 1, 2"))
    }
}

/// A list of integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientIdsField;

impl Rule for ClientIdsField {
    fn validate(&self, raw: &Value) -> Result<FieldValue, FieldError> {
        ListField::items(raw)?
            .iter()
            .map(Value::as_i64)
            .collect::<Option<Vec<_>>>()
            .map(FieldValue::ClientIds)
            .ok_or_else(|| FieldError::invalid("must contain only integers"))
    }
}

/// Schema-level description of one field.
///
/// # Examples
///
/// ```
/// use scoring_api::Tainted;
/// use scoring_api::field::{ClientIdsField, Field, FieldErrorKind};
/// use serde_json::json;
///
/// let client_ids = Field::required(ClientIdsField).non_nullable();
///
/// // Absent → missing
/// assert_eq!(client_ids.check(None).unwrap_err().kind(), FieldErrorKind::Missing);
///
/// // Present but empty on a non-nullable field → still missing
/// let empty = Tainted::new(json!([]));
/// assert_eq!(client_ids.check(Some(empty)).unwrap_err().kind(), FieldErrorKind::Missing);
///
/// // Wrong element type → invalid
/// let strings = Tainted::new(json!(["1", "2"]));
/// assert_eq!(client_ids.check(Some(strings)).unwrap_err().kind(), FieldErrorKind::Invalid);
/// ```
#[derive(Debug)]
pub struct Field {
    required: bool,
    nullable: bool,
    rule: Box<dyn Rule>,
}

impl Field {
    /// Creates a field with explicit flags.
    pub fn new(rule: impl Rule + 'static, required: bool, nullable: bool) -> Self {
        Self {
            required,
            nullable,
            rule: Box::new(rule),
        }
    }

    /// A field that must be present (and non-null). Empty values are accepted.
    pub fn required(rule: impl Rule + 'static) -> Self {
        Self::new(rule, true, true)
    }

    /// A field that may be absent or null.
    pub fn optional(rule: impl Rule + 'static) -> Self {
        Self::new(rule, false, true)
    }

    /// Rejects null and empty values as missing.
    pub fn non_nullable(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Whether absence is a failure.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether null/empty values are acceptable.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Checks one input against this field.
    ///
    /// `None` means the key was absent from the source object. Returns
    /// `Ok(None)` when the field is optional and no value was given.
    ///
    /// # Errors
    ///
    /// - `Missing` when a required field is absent or null, or when a
    ///   non-nullable field is null or empty (`""`, `[]`, `{}`)
    /// - `Invalid` when the rule rejects the value
    pub fn check(
        &self,
        input: Option<Tainted<Value>>,
    ) -> Result<Option<Verified<FieldValue>>, FieldError> {
        let value = match input.map(Tainted::into_inner) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        };

        match value {
            None if self.required || !self.nullable => Err(FieldError::missing()),
            None => Ok(None),
            Some(value) if !self.nullable && is_empty(&value) => Err(FieldError::missing()),
            Some(value) => self
                .rule
                .validate(&value)
                .map(|v| Some(Verified::new_unchecked(v))),
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invalid(rule: &dyn Rule, raw: Value) -> bool {
        matches!(rule.validate(&raw), Err(e) if e.kind() == FieldErrorKind::Invalid)
    }

    #[test]
    fn char_field_rejects_non_strings() {
        for raw in [json!(5), json!({}), json!([]), json!(true)] {
            assert!(invalid(&CharField, raw));
        }
        assert_eq!(
            CharField.validate(&json!("5")).unwrap(),
            FieldValue::Text("5".to_string())
        );
    }

    #[test]
    fn list_field_rejects_non_lists() {
        for raw in [json!(5), json!({}), json!("ab"), json!(true)] {
            assert!(invalid(&ListField, raw));
        }
        assert!(ListField.validate(&json!([1, 2, 3])).is_ok());
    }

    #[test]
    fn dict_field_rejects_non_objects() {
        for raw in [json!(5), json!([]), json!("ab"), json!(true)] {
            assert!(invalid(&DictField, raw));
        }
        let value = DictField
            .validate(&json!({"phone": "79175002040", "gender": 1}))
            .unwrap();
        assert_eq!(value.into_arguments().unwrap().len(), 2);
    }

    #[test]
    fn email_field_requires_at_sign() {
        for raw in [
            json!(5),
            json!([]),
            json!("ab"),
            json!(true),
            json!("ab.com"),
            json!("ab at ab.com"),
        ] {
            assert!(invalid(&EmailField, raw));
        }
        assert!(EmailField.validate(&json!("petros@gmail.com")).is_ok());
    }

    #[test]
    fn phone_field_rejects_bad_numbers() {
        for raw in [
            json!(5),
            json!([]),
            json!("ab"),
            json!(true),
            json!(89632223344_u64),
            json!(7963222334_u64),
            json!(789632223344_u64),
            json!("89175002040"),
            json!("7917500204"),
            json!("791750020400"),
            json!("7917500204a"),
            json!(79175002040.0),
        ] {
            assert!(invalid(&PhoneField, raw.clone()), "{raw} should be rejected");
        }
    }

    #[test]
    fn phone_field_accepts_string_and_integer() {
        assert_eq!(
            PhoneField.validate(&json!("79637222999")).unwrap(),
            FieldValue::Text("79637222999".to_string())
        );
        assert_eq!(
            PhoneField.validate(&json!(79637222999_u64)).unwrap(),
            FieldValue::Text("79637222999".to_string())
        );
    }

    #[test]
    fn date_field_parses_dd_mm_yyyy() {
        for raw in ["08.05..2003", "08.052003", "08/05/2003", "08:05:2003", "08052003"] {
            assert!(invalid(&DateField, json!(raw)), "{raw} should be rejected");
        }
        assert_eq!(
            DateField.validate(&json!("08.05.2003")).unwrap().as_date(),
            NaiveDate::from_ymd_opt(2003, 5, 8)
        );
        assert!(DateField.validate(&json!("08.05.1920")).is_ok());
    }

    #[test]
    fn birthday_field_enforces_age_window() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let rule = BirthDayField::as_of(today);

        assert!(invalid(&rule, json!("09.05.1945")));
        assert!(invalid(&rule, json!("01.01.1890")));
        assert!(invalid(&rule, json!("XXX")));
        assert!(rule.validate(&json!("09.05.1997")).is_ok());
        assert!(rule.validate(&json!("01.01.2000")).is_ok());
    }

    #[test]
    fn birthday_field_boundary_uses_365_day_years() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let rule = BirthDayField::as_of(today);

        let just_inside = today - chrono::Duration::days(70 * 365 - 1);
        let at_limit = today - chrono::Duration::days(70 * 365);

        let fmt = |d: NaiveDate| json!(d.format(DATE_FORMAT).to_string());
        assert!(rule.validate(&fmt(just_inside)).is_ok());
        assert!(invalid(&rule, fmt(at_limit)));
    }

    #[test]
    fn gender_field_accepts_closed_enum() {
        assert!(invalid(&GenderField, json!(-1)));
        assert!(invalid(&GenderField, json!(100)));
        assert!(invalid(&GenderField, json!("1")));
        for (code, gender) in [(0, Gender::Unknown), (1, Gender::Male), (2, Gender::Female)] {
            assert_eq!(
                GenderField.validate(&json!(code)).unwrap().as_gender(),
                Some(gender)
            );
        }
    }

    #[test]
    fn client_ids_field_requires_integers() {
        assert!(invalid(&ClientIdsField, json!({"1": 2})));
        assert!(invalid(&ClientIdsField, json!([1, 2, 3, 4, "5"])));
        assert!(invalid(&ClientIdsField, json!([1.5])));
        assert_eq!(
            ClientIdsField
                .validate(&json!([1, 2, 3]))
                .unwrap()
                .into_client_ids(),
            Some(vec![1, 2, 3])
        );
    }

    #[test]
    fn required_field_absent_is_missing_not_invalid() {
        let field = Field::required(PhoneField);
        assert_eq!(field.check(None).unwrap_err().kind(), FieldErrorKind::Missing);

        let null = Tainted::new(Value::Null);
        assert_eq!(
            field.check(Some(null)).unwrap_err().kind(),
            FieldErrorKind::Missing
        );
    }

    #[test]
    fn optional_field_absent_or_null_is_none() {
        let field = Field::optional(EmailField);
        assert!(field.check(None).unwrap().is_none());
        assert!(field.check(Some(Tainted::new(Value::Null))).unwrap().is_none());
    }

    #[test]
    fn required_nullable_field_accepts_empty_string() {
        let field = Field::required(CharField);
        let verified = field.check(Some(Tainted::new(json!("")))).unwrap().unwrap();
        assert_eq!(verified.into_inner(), FieldValue::Text(String::new()));
    }

    #[test]
    fn non_nullable_field_rejects_empty_values_as_missing() {
        for raw in [json!(""), json!([]), json!({})] {
            let field = Field::optional(CharField).non_nullable();
            assert_eq!(
                field.check(Some(Tainted::new(raw))).unwrap_err().kind(),
                FieldErrorKind::Missing
            );
        }
    }

    #[test]
    fn field_flags_are_reported() {
        let field = Field::required(ClientIdsField).non_nullable();
        assert!(field.is_required());
        assert!(!field.is_nullable());
    }

    #[test]
    fn gender_serializes_as_code() {
        assert_eq!(serde_json::to_value(Gender::Female).unwrap(), json!(2));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Every 11-digit string starting with 7 is a valid phone.
            #[test]
            fn proptest_phone_accepts_russian_mobile(rest in "[0-9]{10}") {
                let phone = format!("7{rest}");
                prop_assert!(PhoneField.validate(&json!(phone)).is_ok());
            }

            /// Any other leading digit is rejected.
            #[test]
            fn proptest_phone_rejects_other_prefix(first in "[0-689]", rest in "[0-9]{10}") {
                let phone = format!("{first}{rest}");
                prop_assert!(PhoneField.validate(&json!(phone)).is_err());
            }

            /// Required fields never report an absent value as invalid.
            #[test]
            fn proptest_required_absent_is_missing(nullable in any::<bool>()) {
                let field = Field::new(CharField, true, nullable);
                prop_assert_eq!(field.check(None).unwrap_err().kind(), FieldErrorKind::Missing);
            }
        }
    }
}
