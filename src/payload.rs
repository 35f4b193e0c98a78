//! Method-specific argument records.
//!
//! Each payload is a [`Validated`] record built from the envelope's
//! `arguments` after authentication. Payloads know nothing about the
//! envelope; the dispatcher joins the two.

use chrono::NaiveDate;
use once_cell::sync::Lazy;

use crate::error::ValidationError;
use crate::field::{
    BirthDayField, CharField, ClientIdsField, DateField, EmailField, Field, FieldValue, Gender,
    GenderField, PhoneField,
};
use crate::record::{Record, Schema, Validated};

/// A validated argument record for one method.
pub trait Payload: Validated {
    /// Method name routed to this payload.
    const METHOD: &'static str;

    /// Declared fields that were present in `arguments`, in declaration order.
    fn has(&self) -> &[&'static str];
}

/// Alternative field pairs of which `online_score` needs at least one.
pub const SCORE_PAIRS: [(&str, &str); 3] = [
    ("first_name", "last_name"),
    ("email", "phone"),
    ("birthday", "gender"),
];

static ONLINE_SCORE: Lazy<Schema> = Lazy::new(|| {
    Schema::new()
        .field("first_name", Field::optional(CharField))
        .field("last_name", Field::optional(CharField))
        .field("email", Field::optional(EmailField))
        .field("phone", Field::optional(PhoneField))
        .field("birthday", Field::optional(BirthDayField::default()))
        .field("gender", Field::optional(GenderField))
});

static CLIENTS_INTERESTS: Lazy<Schema> = Lazy::new(|| {
    Schema::new()
        .field("client_ids", Field::required(ClientIdsField).non_nullable())
        .field("date", Field::optional(DateField))
});

/// Arguments of `online_score`.
///
/// Every field is optional, but at least one pair in [`SCORE_PAIRS`] must be
/// fully present. Presence is key presence: `{"email": null, "phone": null}`
/// satisfies the rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OnlineScoreRequest {
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Phone number, normalised to its 11-digit string form.
    pub phone: Option<String>,
    /// Date of birth.
    pub birthday: Option<NaiveDate>,
    /// Gender code.
    pub gender: Option<Gender>,
    has: Vec<&'static str>,
}

impl Validated for OnlineScoreRequest {
    fn schema() -> &'static Schema {
        &ONLINE_SCORE
    }

    fn rules(record: &Record) -> Result<(), ValidationError> {
        if SCORE_PAIRS.iter().any(|&(a, b)| record.has_all(&[a, b])) {
            Ok(())
        } else {
            Err(ValidationError::MissingFieldPairs(SCORE_PAIRS.to_vec()))
        }
    }

    fn from_record(mut record: Record) -> Self {
        let mut text = |name: &str| record.take(name).and_then(FieldValue::into_text);
        let first_name = text("first_name");
        let last_name = text("last_name");
        let email = text("email");
        let phone = text("phone");

        Self {
            first_name,
            last_name,
            email,
            phone,
            birthday: record.get("birthday").and_then(FieldValue::as_date),
            gender: record.get("gender").and_then(FieldValue::as_gender),
            has: record.present().to_vec(),
        }
    }
}

impl Payload for OnlineScoreRequest {
    const METHOD: &'static str = "online_score";

    fn has(&self) -> &[&'static str] {
        &self.has
    }
}

/// Arguments of `clients_interests`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientsInterestsRequest {
    /// Requested client ids, in request order, duplicates kept.
    pub client_ids: Vec<i64>,
    /// Optional reference date. Accepted and validated, not used by the lookup.
    pub date: Option<NaiveDate>,
    has: Vec<&'static str>,
}

impl ClientsInterestsRequest {
    /// Number of client ids requested.
    pub fn nclients(&self) -> usize {
        self.client_ids.len()
    }
}

impl Validated for ClientsInterestsRequest {
    fn schema() -> &'static Schema {
        &CLIENTS_INTERESTS
    }

    fn from_record(mut record: Record) -> Self {
        Self {
            client_ids: record
                .take("client_ids")
                .and_then(FieldValue::into_client_ids)
                .unwrap_or_default(),
            date: record.get("date").and_then(FieldValue::as_date),
            has: record.present().to_vec(),
        }
    }
}

impl Payload for ClientsInterestsRequest {
    const METHOD: &'static str = "clients_interests";

    fn has(&self) -> &[&'static str] {
        &self.has
    }
}
