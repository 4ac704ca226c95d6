//! Registered JWT claims, RFC 7519 §4.
//!
//! [`RegisteredClaims`] models the registered claim names with optional
//! fields; the date claims serialize as NumericDate (seconds since the
//! epoch). [`Claims`] pairs the registered set with an arbitrary
//! serializable custom-claims struct, flattened into the same JSON
//! object so unknown claims survive a decode/encode round trip.

use serde::{Deserialize, Serialize};

/// The registered claim set. Fields which are `None` are left out of
/// the serialized object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredClaims {
    /// The principal that issued the token (`iss`).
    #[serde(rename = "iss", default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// The principal the token makes statements about (`sub`).
    #[serde(rename = "sub", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// The intended recipient (`aud`).
    #[serde(rename = "aud", default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,

    /// Time on or after which the token must be rejected (`exp`).
    #[serde(
        rename = "exp",
        default,
        skip_serializing_if = "Option::is_none",
        with = "numeric_date"
    )]
    pub expiration: Option<chrono::DateTime<chrono::Utc>>,

    /// Time before which the token must be rejected (`nbf`).
    #[serde(
        rename = "nbf",
        default,
        skip_serializing_if = "Option::is_none",
        with = "numeric_date"
    )]
    pub not_before: Option<chrono::DateTime<chrono::Utc>>,

    /// When the token was issued (`iat`).
    #[serde(
        rename = "iat",
        default,
        skip_serializing_if = "Option::is_none",
        with = "numeric_date"
    )]
    pub issued_at: Option<chrono::DateTime<chrono::Utc>>,

    /// A unique identifier for the token (`jti`).
    #[serde(rename = "jti", default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
}

/// Registered claims plus custom claims, flattened into one object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims<C> {
    /// The enumerated registered claims.
    #[serde(flatten)]
    pub registered: RegisteredClaims,

    /// Custom claims. Any serializable struct producing a JSON object.
    #[serde(flatten)]
    pub claims: C,
}

impl<C> Claims<C> {
    /// Combine a registered claim set with custom claims.
    pub fn new(registered: RegisteredClaims, claims: C) -> Self {
        Self { registered, claims }
    }
}

impl<C> From<C> for Claims<C> {
    fn from(claims: C) -> Self {
        Claims {
            registered: Default::default(),
            claims,
        }
    }
}

/// `chrono::DateTime` as a JSON NumericDate.
mod numeric_date {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{de, de::Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(dt) => serializer.serialize_some(&dt.timestamp()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt = Option::<i64>::deserialize(deserializer)?;
        match opt {
            Some(timestamp) => Ok(Some(
                Utc.timestamp_opt(timestamp, 0).earliest().ok_or_else(|| {
                    de::Error::custom(format!("invalid timestamp: {timestamp:?}"))
                })?,
            )),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
    struct CustomClaims {
        foo: String,
    }

    #[test]
    fn custom_claims_flatten_alongside_registered() {
        let claims = Claims::new(
            RegisteredClaims {
                issuer: Some("issuer".into()),
                ..Default::default()
            },
            CustomClaims { foo: "bar".into() },
        );

        let json = serde_json::to_value(claims).unwrap();
        assert_eq!(json, json!({"iss":"issuer","foo":"bar"}));
    }

    #[test]
    fn dates_serialize_as_numeric() {
        let claims = Claims::new(
            RegisteredClaims {
                not_before: chrono::Utc
                    .with_ymd_and_hms(2023, 4, 18, 21, 54, 39)
                    .single(),
                ..Default::default()
            },
            CustomClaims { foo: "bar".into() },
        );

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["nbf"].as_u64(), Some(1681854879));

        let parsed: Claims<CustomClaims> = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, claims);
    }
}
