//! End-to-end token round trips through the public API only.

use std::sync::Arc;

use jose_engine::algorithms::AlgorithmCollection;
use jose_engine::credentials::CredentialSelector;
use jose_engine::jose::JoseHeader;
use jose_engine::key::{
    EccKeyPair, KeyMetadata, KeyUse, SecretKey, SecretKeyProvider, StaticSecretKeyDataSource,
};
use jose_engine::token::{encrypt_compact, sign_compact, JweDecoder, JwsDecoder};
use jose_engine::{Claims, RegisteredClaims};

fn algorithms() -> Arc<AlgorithmCollection> {
    Arc::new(AlgorithmCollection::standard())
}

fn key_set(keys: Vec<SecretKey>) -> Arc<Vec<Arc<SecretKey>>> {
    Arc::new(keys.into_iter().map(Arc::new).collect())
}

fn sign_and_verify(keys: Arc<Vec<Arc<SecretKey>>>, code: &str) {
    let selector = CredentialSelector::new(algorithms(), Arc::clone(&keys));
    let credentials = selector
        .signing_credentials(&[code])
        .unwrap()
        .unwrap_or_else(|| panic!("no credentials for {code}"));

    let claims = Claims::from(serde_json::json!({"scope": "read"}));
    let payload = serde_json::to_vec(&claims).unwrap();
    let token = sign_compact(&credentials, JoseHeader::new(), &payload).unwrap();

    let verified = JwsDecoder::new(algorithms(), keys).decode(&token).unwrap();
    assert_eq!(verified.header().algorithm(), Some(code));
    let parsed: Claims<serde_json::Value> = serde_json::from_slice(verified.payload()).unwrap();
    assert_eq!(parsed.claims["scope"], "read");
    assert_eq!(parsed.registered, RegisteredClaims::default());
}

#[test]
fn hmac_families_round_trip() {
    for code in ["HS256", "HS384", "HS512"] {
        let keys = key_set(vec![SecretKey::symmetric(
            vec![0xa5; 64],
            KeyMetadata::with_key_id("oct"),
        )]);
        sign_and_verify(keys, code);
    }
}

#[test]
fn rsa_families_round_trip() {
    let private = rsa::RsaPrivateKey::new(&mut rand_core::OsRng, 2048).unwrap();
    for code in ["RS256", "RS512", "PS256", "PS512"] {
        let keys = key_set(vec![SecretKey::rsa(
            private.clone(),
            KeyMetadata::with_key_id("rsa"),
        )]);
        sign_and_verify(keys, code);
    }
}

#[test]
fn ecdsa_families_round_trip() {
    let cases: Vec<(&str, EccKeyPair)> = vec![
        (
            "ES256",
            EccKeyPair::P256(p256::SecretKey::random(&mut rand_core::OsRng)),
        ),
        (
            "ES384",
            EccKeyPair::P384(p384::SecretKey::random(&mut rand_core::OsRng)),
        ),
        (
            "ES512",
            EccKeyPair::P521(p521::SecretKey::random(&mut rand_core::OsRng)),
        ),
    ];
    for (code, pair) in cases {
        let keys = key_set(vec![SecretKey::ecc(pair, KeyMetadata::with_key_id("ec"))]);
        sign_and_verify(keys, code);
    }
}

#[test]
fn jwe_matrix_round_trips() {
    let cases = [
        ("A128KW", "A128CBC-HS256", 16),
        ("A192KW", "A192CBC-HS384", 24),
        ("A256KW", "A256CBC-HS512", 32),
        ("A128KW", "A128GCM", 16),
        ("A256KW", "A256GCM", 32),
    ];
    for (wrap, enc, kek_bytes) in cases {
        let mut metadata = KeyMetadata::with_key_id("kek");
        metadata.key_use = Some(KeyUse::Encryption);
        let keys = key_set(vec![SecretKey::symmetric(vec![0x31; kek_bytes], metadata)]);

        let selector = CredentialSelector::new(algorithms(), Arc::clone(&keys));
        let credentials = selector
            .encrypting_credentials(&[wrap], &[enc], &["DEF"])
            .unwrap()
            .unwrap_or_else(|| panic!("no credentials for {wrap}/{enc}"));

        let token = encrypt_compact(&credentials, JoseHeader::new(), b"body").unwrap();
        let decrypted = JweDecoder::new(algorithms(), Arc::clone(&keys))
            .decode(&token)
            .unwrap();
        assert_eq!(decrypted.plaintext(), b"body");
        assert_eq!(decrypted.header().algorithm(), Some(wrap));
        assert_eq!(decrypted.header().encryption(), Some(enc));
    }
}

#[test]
fn provider_rotation_flows_through_verification() {
    let source = Arc::new(StaticSecretKeyDataSource::new(vec![Arc::new(
        SecretKey::symmetric(vec![0x10; 32], KeyMetadata::with_key_id("gen-1")),
    )]));
    let provider = SecretKeyProvider::new(vec![Box::new(ArcSource(Arc::clone(&source)))]);

    let keys = provider.keys().unwrap();
    let selector = CredentialSelector::new(algorithms(), Arc::clone(&keys));
    let credentials = selector.signing_credentials(&["HS256"]).unwrap().unwrap();
    let token = sign_compact(&credentials, JoseHeader::new(), b"payload").unwrap();

    // Rotate to a new key set that still contains the signing key.
    source.replace(vec![
        Arc::new(SecretKey::symmetric(
            vec![0x10; 32],
            KeyMetadata::with_key_id("gen-1"),
        )),
        Arc::new(SecretKey::symmetric(
            vec![0x20; 32],
            KeyMetadata::with_key_id("gen-2"),
        )),
    ]);

    let rotated = provider.keys().unwrap();
    assert_eq!(rotated.len(), 2);
    let verified = JwsDecoder::new(algorithms(), rotated).decode(&token).unwrap();
    assert_eq!(verified.key().unwrap().key_id(), Some("gen-1"));
}

/// Adapter so one static source can be shared with the test and owned
/// by the provider at the same time.
struct ArcSource(Arc<StaticSecretKeyDataSource>);

impl jose_engine::key::SecretKeyDataSource for ArcSource {
    fn keys(
        &self,
    ) -> Result<Arc<Vec<Arc<SecretKey>>>, jose_engine::CryptoError> {
        self.0.keys()
    }

    fn change_token(&self) -> jose_engine::change::ChangeToken {
        self.0.change_token()
    }
}
