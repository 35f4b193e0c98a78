//! Business rules behind the two methods.
//!
//! Score = 1.5 phone + 1.5 email + 1.5 (birthday and gender)
//!       + 0.5 (first and last name).
//!
//! Scores are cached under a key derived from the name and birthday. The
//! cache is best effort: read and write failures only cost a recompute.
//! Interest lists live in the durable namespace and their failures propagate.

use std::time::Duration;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::field::Gender;
use crate::payload::{ClientsInterestsRequest, OnlineScoreRequest};
use crate::store::{Store, StoreError};

/// Score returned to the privileged login without touching the store.
pub const ADMIN_SCORE: u32 = 42;

const CACHE_KEY_DATE_FORMAT: &str = "%Y%m%d";

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.is_empty())
}

/// Cache key for a score request: `uid:` + hex SHA-256 of
/// first name + last name + birthday as `YYYYMMDD`.
pub fn score_key(request: &OnlineScoreRequest) -> String {
    let birthday = request
        .birthday
        .map(|d| d.format(CACHE_KEY_DATE_FORMAT).to_string())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(request.first_name.as_deref().unwrap_or("").as_bytes());
    hasher.update(request.last_name.as_deref().unwrap_or("").as_bytes());
    hasher.update(birthday.as_bytes());
    format!("uid:{}", hex::encode(hasher.finalize()))
}

/// Weighted sum over the supplied fields, between 0.0 and 5.0.
///
/// Unknown gender does not count as a supplied gender.
pub fn compute_score(request: &OnlineScoreRequest) -> f64 {
    let mut score = 0.0;
    if present(&request.phone) {
        score += 1.5;
    }
    if present(&request.email) {
        score += 1.5;
    }
    if request.birthday.is_some() && request.gender.is_some_and(|g| g != Gender::Unknown) {
        score += 1.5;
    }
    if present(&request.first_name) && present(&request.last_name) {
        score += 0.5;
    }
    score
}

fn cached_score(store: &dyn Store, key: &str) -> Option<f64> {
    match store.cache_get(key) {
        Ok(Some(raw)) => raw
            .parse::<f64>()
            .ok()
            .filter(|score| score.is_finite() && *score != 0.0),
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(key, error = %err, "score cache read failed");
            None
        }
    }
}

/// Returns the cached score when there is a non-zero one, otherwise computes
/// it and caches non-zero results for `ttl`.
pub fn get_score(store: &dyn Store, request: &OnlineScoreRequest, ttl: Duration) -> f64 {
    let key = score_key(request);
    if let Some(score) = cached_score(store, &key) {
        tracing::debug!(key = %key, score, "score cache hit");
        return score;
    }

    let score = compute_score(request);
    if score != 0.0 {
        if let Err(err) = store.cache_set(&key, &score.to_string(), ttl) {
            tracing::warn!(key = %key, error = %err, "score cache write failed");
        }
    }
    score
}

/// Interest list for one client; absent reads as empty.
///
/// # Errors
///
/// Returns the store's error, or [`StoreError::Corrupt`] when the stored value
/// is not a JSON list of strings.
pub fn get_interests(store: &dyn Store, client_id: i64) -> Result<Vec<String>, StoreError> {
    let key = format!("i:{client_id}");
    match store.get(&key)? {
        None => Ok(Vec::new()),
        Some(raw) if raw.is_empty() => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| StoreError::Corrupt(format!("{key}: {e}"))),
    }
}

/// Interest lists keyed by client id, in request order, duplicates collapsed.
///
/// # Errors
///
/// Fails on the first client whose lookup fails.
pub fn clients_interests(
    store: &dyn Store,
    request: &ClientsInterestsRequest,
) -> Result<Map<String, Value>, StoreError> {
    let mut result = Map::new();
    for &cid in &request.client_ids {
        let key = cid.to_string();
        if result.contains_key(&key) {
            continue;
        }
        let interests = get_interests(store, cid)?;
        result.insert(key, Value::from(interests));
    }
    Ok(result)
}
