//! Partial updates of the `userprofiles/{uid}` mirror document.
//!
//! Each auth event writes only the fields it knows about, with merge
//! semantics. A `ProfileMirror` carries those fields and the matching field
//! mask.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Fields to merge into a profile mirror document.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileMirror {
    fields: Map<String, Value>,
}

fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl ProfileMirror {
    fn with(pairs: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        Self {
            fields: pairs
                .into_iter()
                .map(|(key, value)| (key.to_owned(), value))
                .collect(),
        }
    }

    /// Account created: `{email, createdAt, updatedAt}`.
    #[must_use]
    pub fn signed_up(email: &str, at: DateTime<Utc>) -> Self {
        Self::with([
            ("email", Value::from(email)),
            ("createdAt", timestamp(at)),
            ("updatedAt", timestamp(at)),
        ])
    }

    /// Password sign-in: `{email, updatedAt}`.
    #[must_use]
    pub fn signed_in(email: &str, at: DateTime<Utc>) -> Self {
        Self::with([("email", Value::from(email)), ("updatedAt", timestamp(at))])
    }

    /// Google sign-in: `{email, name, updatedAt}`. The name is empty when the
    /// Google account has none.
    #[must_use]
    pub fn google(email: &str, name: Option<&str>, at: DateTime<Utc>) -> Self {
        Self::with([
            ("email", Value::from(email)),
            ("name", Value::from(name.unwrap_or_default())),
            ("updatedAt", timestamp(at)),
        ])
    }

    /// Display name changed: `{name, updatedAt}`.
    #[must_use]
    pub fn renamed(name: &str, at: DateTime<Utc>) -> Self {
        Self::with([("name", Value::from(name)), ("updatedAt", timestamp(at))])
    }

    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The field mask for a merge write.
    #[must_use]
    pub fn field_paths(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().unwrap_or_default()
    }

    fn sorted(mut paths: Vec<String>) -> Vec<String> {
        paths.sort();
        paths
    }

    #[test]
    fn test_signed_up_fields() {
        let mirror = ProfileMirror::signed_up("ona@elida.lt", at());
        assert_eq!(
            sorted(mirror.field_paths()),
            ["createdAt", "email", "updatedAt"]
        );
        assert_eq!(mirror.fields()["createdAt"], "2024-03-01T12:00:00.000Z");
    }

    #[test]
    fn test_signed_in_does_not_touch_created_at() {
        let mirror = ProfileMirror::signed_in("ona@elida.lt", at());
        assert_eq!(sorted(mirror.field_paths()), ["email", "updatedAt"]);
    }

    #[test]
    fn test_google_and_renamed() {
        let google = ProfileMirror::google("ona@gmail.com", None, at());
        assert_eq!(sorted(google.field_paths()), ["email", "name", "updatedAt"]);
        assert_eq!(google.fields()["name"], "");

        let renamed = ProfileMirror::renamed("Ona", at());
        assert_eq!(sorted(renamed.into_fields().keys().cloned().collect()), ["name", "updatedAt"]);
    }
}
