//! JOSE protected headers.
//!
//! [`JoseHeader`] is a view over the parsed header object. It keeps the
//! full [`serde_json::Map`] so parameters this crate does not interpret
//! (`epk`, `apu`, `apv`, vendor extensions) survive a parse/serialize
//! round trip, and layers typed accessors for the parameters the codec
//! does interpret.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TokenError;

/// A JOSE protected header, retaining every parameter as parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoseHeader {
    parameters: Map<String, Value>,
}

impl JoseHeader {
    /// An empty header.
    pub fn new() -> Self {
        JoseHeader::default()
    }

    /// Parse a header from its JSON text.
    pub fn from_json(json: &[u8]) -> Result<Self, TokenError> {
        Ok(serde_json::from_slice(json)?)
    }

    /// Serialize the header back to JSON text.
    pub fn to_json(&self) -> Result<Vec<u8>, TokenError> {
        Ok(serde_json::to_vec(&self.parameters)?)
    }

    fn str_parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name)?.as_str()
    }

    fn set_str_parameter(&mut self, name: &str, value: impl Into<String>) {
        self.parameters
            .insert(name.to_owned(), Value::String(value.into()));
    }

    /// The signature or key-management algorithm code (`alg`).
    pub fn algorithm(&self) -> Option<&str> {
        self.str_parameter("alg")
    }

    /// Set the algorithm code (`alg`).
    pub fn set_algorithm(&mut self, code: impl Into<String>) {
        self.set_str_parameter("alg", code);
    }

    /// The content-encryption algorithm code (`enc`).
    pub fn encryption(&self) -> Option<&str> {
        self.str_parameter("enc")
    }

    /// Set the content-encryption algorithm code (`enc`).
    pub fn set_encryption(&mut self, code: impl Into<String>) {
        self.set_str_parameter("enc", code);
    }

    /// The key id (`kid`).
    pub fn key_id(&self) -> Option<&str> {
        self.str_parameter("kid")
    }

    /// Set the key id (`kid`).
    pub fn set_key_id(&mut self, key_id: impl Into<String>) {
        self.set_str_parameter("kid", key_id);
    }

    /// Whether the payload is base64url-encoded (`b64`, RFC 7797).
    ///
    /// Absent means `true`.
    pub fn base64_payload(&self) -> bool {
        match self.parameters.get("b64") {
            Some(Value::Bool(b)) => *b,
            _ => true,
        }
    }

    /// Set the `b64` payload-encoding flag.
    pub fn set_base64_payload(&mut self, b64: bool) {
        self.parameters.insert("b64".to_owned(), Value::Bool(b64));
    }

    /// The compression algorithm code (`zip`).
    pub fn compression(&self) -> Option<&str> {
        self.str_parameter("zip")
    }

    /// Set the compression algorithm code (`zip`).
    pub fn set_compression(&mut self, code: impl Into<String>) {
        self.set_str_parameter("zip", code);
    }

    /// The token media type (`typ`).
    pub fn token_type(&self) -> Option<&str> {
        self.str_parameter("typ")
    }

    /// Set the token media type (`typ`).
    pub fn set_token_type(&mut self, typ: impl Into<String>) {
        self.set_str_parameter("typ", typ);
    }

    /// The payload media type (`cty`).
    pub fn content_type(&self) -> Option<&str> {
        self.str_parameter("cty")
    }

    /// Set the payload media type (`cty`).
    pub fn set_content_type(&mut self, cty: impl Into<String>) {
        self.set_str_parameter("cty", cty);
    }

    /// Any header parameter by name, including ones this crate does not
    /// interpret, such as `epk`, `apu` and `apv`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Set an arbitrary header parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.parameters.insert(name.into(), value);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_accessors() {
        let header = JoseHeader::from_json(
            br#"{"alg":"RS256","kid":"k1","typ":"JWT","cty":"json"}"#,
        )
        .unwrap();
        assert_eq!(header.algorithm(), Some("RS256"));
        assert_eq!(header.key_id(), Some("k1"));
        assert_eq!(header.token_type(), Some("JWT"));
        assert_eq!(header.content_type(), Some("json"));
        assert_eq!(header.encryption(), None);
    }

    #[test]
    fn b64_defaults_to_true() {
        let header = JoseHeader::from_json(br#"{"alg":"HS256"}"#).unwrap();
        assert!(header.base64_payload());

        let header = JoseHeader::from_json(br#"{"alg":"HS256","b64":false}"#).unwrap();
        assert!(!header.base64_payload());
    }

    #[test]
    fn unknown_parameters_round_trip() {
        let raw = br#"{"alg":"A128KW","enc":"A128CBC-HS256","epk":{"kty":"EC"},"apu":"QWxpY2U"}"#;
        let header = JoseHeader::from_json(raw).unwrap();
        assert_eq!(header.get("epk"), Some(&json!({"kty":"EC"})));
        assert_eq!(header.get("apu"), Some(&json!("QWxpY2U")));

        let reparsed = JoseHeader::from_json(&header.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, header);
    }
}
