//! Record schemas and the [`Validated`] request contract.

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::field::{Field, FieldErrorKind, FieldValue};
use crate::{Tainted, Verified};

/// Ordered set of named fields making up a record type.
///
/// A `Schema` is built once per record type and shared by every request
/// of that type; it holds only descriptors, never values. Fields are
/// checked in declaration order.
///
/// # Examples
///
/// ```
/// use scoring_api::Tainted;
/// use scoring_api::field::{CharField, EmailField, Field};
/// use scoring_api::record::Schema;
/// use serde_json::json;
///
/// let schema = Schema::new()
///     .field("login", Field::required(CharField))
///     .field("email", Field::optional(EmailField));
///
/// let input = json!({"login": "h&f", "email": "a@b.com"});
/// let record = schema
///     .validate(Tainted::new(input.as_object().unwrap().clone()))
///     .expect("valid record");
///
/// assert!(record.has("email"));
/// assert_eq!(record.present(), &["login", "email"]);
/// ```
#[derive(Debug, Default)]
pub struct Schema {
    fields: Vec<(&'static str, Field)>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Declares a field. Declaring the same name twice replaces the earlier
    /// descriptor in place, keeping its position.
    pub fn field(mut self, name: &'static str, field: Field) -> Self {
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = field;
        } else {
            self.fields.push((name, field));
        }
        self
    }

    /// Declared field names, in order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    /// Validates a source object against every declared field.
    ///
    /// Keys not declared in the schema are ignored.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::MissingFields`] if any field was missing; this
    ///   wins even when other fields were also malformed
    /// - [`ValidationError::BadFields`] otherwise, if any value failed its rule
    pub fn validate(&self, input: Tainted<Map<String, Value>>) -> Result<Record, ValidationError> {
        let mut source = input.into_inner();
        let mut missing = Vec::new();
        let mut bad = Vec::new();
        let mut has = Vec::new();
        let mut values = Vec::with_capacity(self.fields.len());

        for (name, field) in &self.fields {
            let raw = source.remove(*name);
            if raw.is_some() {
                has.push(*name);
            }

            match field.check(raw.map(Tainted::new)) {
                Ok(value) => values.push((*name, value)),
                Err(err) => match err.kind() {
                    FieldErrorKind::Missing => missing.push(*name),
                    FieldErrorKind::Invalid => bad.push((*name, err.message().to_string())),
                },
            }
        }

        if !missing.is_empty() {
            tracing::debug!(fields = ?missing, "record rejected: missing fields");
            return Err(ValidationError::MissingFields(missing));
        }
        if !bad.is_empty() {
            tracing::debug!(fields = ?bad, "record rejected: bad fields");
            return Err(ValidationError::BadFields(bad));
        }

        Ok(Record { values, has })
    }
}

/// Field values of one validated request, plus the names actually supplied.
///
/// `has` lists the declared fields whose key appeared in the source object,
/// including keys given as explicit `null`.
#[derive(Debug, Clone)]
pub struct Record {
    values: Vec<(&'static str, Option<Verified<FieldValue>>)>,
    has: Vec<&'static str>,
}

impl Record {
    /// Whether `name` was supplied in the source object.
    pub fn has(&self, name: &str) -> bool {
        self.has.contains(&name)
    }

    /// Whether every name in `names` was supplied.
    pub fn has_all(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.has(name))
    }

    /// Supplied field names, in declaration order.
    pub fn present(&self) -> &[&'static str] {
        &self.has
    }

    /// Borrows a field's value, if one was set.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| v.as_ref())
            .map(AsRef::as_ref)
    }

    /// Removes and returns a field's value, if one was set.
    pub fn take(&mut self, name: &str) -> Option<FieldValue> {
        self.values
            .iter_mut()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| v.take())
            .map(Verified::into_inner)
    }
}

/// A request type backed by a [`Schema`] and an optional cross-field rule.
///
/// Validation is all-or-nothing: every field must pass, then
/// [`rules`](Self::rules) must pass, and only then is the typed value built.
pub trait Validated: Sized {
    /// The record type's schema.
    fn schema() -> &'static Schema;

    /// Cross-field rule, run only after every field passed.
    ///
    /// # Errors
    ///
    /// Returns the rule's [`ValidationError`].
    fn rules(_record: &Record) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Builds the typed value from a fully validated record.
    fn from_record(record: Record) -> Self;

    /// Runs the schema, then the cross-field rule.
    ///
    /// # Errors
    ///
    /// Returns the first failing stage's aggregate [`ValidationError`].
    fn validate(input: Tainted<Map<String, Value>>) -> Result<Verified<Self>, ValidationError> {
        let record = Self::schema().validate(input)?;
        Self::rules(&record)?;
        Ok(Verified::new_unchecked(Self::from_record(record)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{CharField, ClientIdsField, EmailField, PhoneField};
    use serde_json::json;

    fn tainted(value: Value) -> Tainted<Map<String, Value>> {
        Tainted::new(value.as_object().cloned().unwrap_or_default())
    }

    fn schema() -> Schema {
        Schema::new()
            .field("login", Field::required(CharField))
            .field("email", Field::optional(EmailField))
            .field("phone", Field::optional(PhoneField))
    }

    #[test]
    fn valid_record_tracks_present_fields() {
        let record = schema()
            .validate(tainted(json!({"login": "h&f", "phone": "79175002040"})))
            .unwrap();

        assert_eq!(record.present(), &["login", "phone"]);
        assert!(!record.has("email"));
        assert_eq!(record.get("phone").and_then(FieldValue::as_text), Some("79175002040"));
        assert!(record.get("email").is_none());
    }

    #[test]
    fn explicit_null_counts_as_present() {
        let record = schema()
            .validate(tainted(json!({"login": "x", "email": null})))
            .unwrap();

        assert!(record.has("email"));
        assert!(record.get("email").is_none());
    }

    #[test]
    fn undeclared_keys_are_ignored() {
        let record = schema()
            .validate(tainted(json!({"login": "x", "extra": 1})))
            .unwrap();

        assert_eq!(record.present(), &["login"]);
    }

    #[test]
    fn missing_fields_take_priority_over_bad_fields() {
        let err = schema()
            .validate(tainted(json!({"email": "nope"})))
            .unwrap_err();

        assert_eq!(err, ValidationError::MissingFields(vec!["login"]));
    }

    #[test]
    fn bad_fields_are_all_reported() {
        let err = schema()
            .validate(tainted(json!({"login": 1, "email": "nope", "phone": "89175002040"})))
            .unwrap_err();

        match err {
            ValidationError::BadFields(fields) => {
                let names: Vec<_> = fields.iter().map(|(n, _)| *n).collect();
                assert_eq!(names, vec!["login", "email", "phone"]);
            }
            other => panic!("expected bad fields, got {other:?}"),
        }
    }

    #[test]
    fn redeclaring_a_field_replaces_it_in_place() {
        let schema = Schema::new()
            .field("ids", Field::optional(ClientIdsField))
            .field("name", Field::optional(CharField))
            .field("ids", Field::required(ClientIdsField).non_nullable());

        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["ids", "name"]);
        assert_eq!(
            schema.validate(tainted(json!({}))).unwrap_err(),
            ValidationError::MissingFields(vec!["ids"])
        );
    }

    #[test]
    fn take_moves_value_out() {
        let mut record = schema()
            .validate(tainted(json!({"login": "admin"})))
            .unwrap();

        assert_eq!(record.take("login"), Some(FieldValue::Text("admin".into())));
        assert_eq!(record.take("login"), None);
    }

    struct Pair {
        has: Vec<&'static str>,
    }

    impl Validated for Pair {
        fn schema() -> &'static Schema {
            static SCHEMA: once_cell::sync::Lazy<Schema> = once_cell::sync::Lazy::new(|| {
                Schema::new()
                    .field("email", Field::optional(EmailField))
                    .field("phone", Field::optional(PhoneField))
            });
            &SCHEMA
        }

        fn rules(record: &Record) -> Result<(), ValidationError> {
            if record.has_all(&["email", "phone"]) {
                Ok(())
            } else {
                Err(ValidationError::MissingFieldPairs(vec![("email", "phone")]))
            }
        }

        fn from_record(record: Record) -> Self {
            Pair {
                has: record.present().to_vec(),
            }
        }
    }

    #[test]
    fn cross_field_rule_runs_after_fields() {
        let ok = Pair::validate(tainted(json!({"email": "a@b", "phone": 79175002040_u64})))
            .unwrap()
            .into_inner();
        assert_eq!(ok.has, vec!["email", "phone"]);

        let err = Pair::validate(tainted(json!({"email": "a@b"}))).err().unwrap();
        assert_eq!(err, ValidationError::MissingFieldPairs(vec![("email", "phone")]));

        // Field errors come first: the pair rule never sees a bad phone.
        let err = Pair::validate(tainted(json!({"email": "a@b", "phone": "1"})))
            .err()
            .unwrap();
        assert!(matches!(err, ValidationError::BadFields(_)));
    }
}
