//! Key providers with hot rotation.
//!
//! A [`SecretKeyDataSource`] exposes the current key list as an atomic
//! snapshot plus a change token. [`SecretKeyProvider`] composes one or
//! more sources into a single snapshot that is recomputed lazily when
//! any underlying token fires. Readers never block each other and never
//! observe a partially-updated list.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use crate::change::{ChangeSource, ChangeToken};
use crate::error::CryptoError;

use super::SecretKey;

/// A source of secret keys with change notification.
pub trait SecretKeyDataSource: Send + Sync {
    /// The current key list.
    fn keys(&self) -> Result<Arc<Vec<Arc<SecretKey>>>, CryptoError>;

    /// A token that fires when the key list changes.
    fn change_token(&self) -> ChangeToken;

    /// Release the source's resources. The default is a no-op;
    /// stateful sources mark themselves disposed.
    fn close(&self) {}
}

/// A key source backed by an in-memory list.
///
/// [`replace`] swaps the whole list atomically and fires the change
/// token, which is how hot key rotation reaches the provider.
///
/// [`replace`]: StaticSecretKeyDataSource::replace
#[derive(Debug)]
pub struct StaticSecretKeyDataSource {
    keys: ArcSwap<Vec<Arc<SecretKey>>>,
    change: ChangeSource,
}

impl StaticSecretKeyDataSource {
    /// Create a source holding the given keys.
    pub fn new(keys: Vec<Arc<SecretKey>>) -> Self {
        StaticSecretKeyDataSource {
            keys: ArcSwap::from_pointee(keys),
            change: ChangeSource::new(),
        }
    }

    /// Replace the key list. The change token fires before the new
    /// list becomes observable.
    pub fn replace(&self, keys: Vec<Arc<SecretKey>>) {
        self.change.notify();
        self.keys.store(Arc::new(keys));
    }
}

impl SecretKeyDataSource for StaticSecretKeyDataSource {
    fn keys(&self) -> Result<Arc<Vec<Arc<SecretKey>>>, CryptoError> {
        Ok(self.keys.load_full())
    }

    fn change_token(&self) -> ChangeToken {
        self.change.token()
    }
}

struct ProviderState {
    /// Tokens captured from each source at the last recomputation.
    tokens: Vec<ChangeToken>,
    initialized: bool,
}

/// Aggregates N key sources into one atomically-swapped snapshot.
///
/// The snapshot is the concatenation of all sources' current lists in
/// source order. It is recomputed lazily, only when at least one
/// underlying change token has fired, and at most one caller performs
/// the recomputation; concurrent callers wait on the refresh lock
/// rather than computing their own.
pub struct SecretKeyProvider {
    sources: Vec<Box<dyn SecretKeyDataSource>>,
    snapshot: ArcSwap<Vec<Arc<SecretKey>>>,
    state: Mutex<ProviderState>,
    change: ChangeSource,
    closed: AtomicBool,
}

impl SecretKeyProvider {
    /// Create a provider over the given sources.
    pub fn new(sources: Vec<Box<dyn SecretKeyDataSource>>) -> Self {
        SecretKeyProvider {
            sources,
            snapshot: ArcSwap::from_pointee(Vec::new()),
            state: Mutex::new(ProviderState {
                tokens: Vec::new(),
                initialized: false,
            }),
            change: ChangeSource::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Convenience constructor over a fixed key list.
    pub fn from_keys(keys: Vec<Arc<SecretKey>>) -> Self {
        Self::new(vec![Box::new(StaticSecretKeyDataSource::new(keys))])
    }

    /// The current key snapshot, refreshing it first if any source
    /// changed since the last read.
    pub fn keys(&self) -> Result<Arc<Vec<Arc<SecretKey>>>, CryptoError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CryptoError::Disposed("SecretKeyProvider"));
        }

        let mut state = self
            .state
            .lock()
            .map_err(|_| CryptoError::Disposed("SecretKeyProvider"))?;

        if !state.initialized || state.tokens.iter().any(ChangeToken::has_changed) {
            let mut keys = Vec::new();
            let mut tokens = Vec::with_capacity(self.sources.len());
            for source in &self.sources {
                // Capture the token before the list so a change racing
                // this refresh fires the captured token.
                tokens.push(source.change_token());
                keys.extend(source.keys()?.iter().cloned());
            }
            if state.initialized {
                self.change.notify();
            }
            self.snapshot.store(Arc::new(keys));
            state.tokens = tokens;
            state.initialized = true;
        }

        Ok(self.snapshot.load_full())
    }

    /// A token that fires when the provider's snapshot is superseded.
    pub fn change_token(&self) -> ChangeToken {
        self.change.token()
    }

    /// Dispose the provider and every underlying source. All
    /// subsequent access fails with [`CryptoError::Disposed`]; key
    /// material is wiped when the last outstanding `Arc<SecretKey>`
    /// drops.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        for source in &self.sources {
            source.close();
        }
    }
}

impl SecretKeyDataSource for SecretKeyProvider {
    fn keys(&self) -> Result<Arc<Vec<Arc<SecretKey>>>, CryptoError> {
        SecretKeyProvider::keys(self)
    }

    fn change_token(&self) -> ChangeToken {
        SecretKeyProvider::change_token(self)
    }

    fn close(&self) {
        SecretKeyProvider::close(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::key::KeyMetadata;

    fn key(id: &str) -> Arc<SecretKey> {
        Arc::new(SecretKey::symmetric(
            vec![0u8; 32],
            KeyMetadata::with_key_id(id),
        ))
    }

    fn ids(keys: &[Arc<SecretKey>]) -> Vec<String> {
        keys.iter()
            .map(|k| k.key_id().unwrap().to_owned())
            .collect()
    }

    #[test]
    fn concatenates_sources_in_order() {
        let provider = SecretKeyProvider::new(vec![
            Box::new(StaticSecretKeyDataSource::new(vec![key("a")])),
            Box::new(StaticSecretKeyDataSource::new(vec![key("b"), key("c")])),
        ]);

        let keys = provider.keys().unwrap();
        assert_eq!(ids(&keys), vec!["a", "b", "c"]);
    }

    #[test]
    fn refresh_fires_token_and_swaps_snapshot() {
        let source = Arc::new(StaticSecretKeyDataSource::new(vec![key("old")]));

        struct Shared(Arc<StaticSecretKeyDataSource>);
        impl SecretKeyDataSource for Shared {
            fn keys(&self) -> Result<Arc<Vec<Arc<SecretKey>>>, CryptoError> {
                self.0.keys()
            }
            fn change_token(&self) -> ChangeToken {
                self.0.change_token()
            }
        }

        let provider = SecretKeyProvider::new(vec![Box::new(Shared(Arc::clone(&source)))]);
        assert_eq!(ids(&provider.keys().unwrap()), vec!["old"]);

        let token = provider.change_token();
        source.replace(vec![key("new")]);

        assert_eq!(ids(&provider.keys().unwrap()), vec!["new"]);
        assert!(token.has_changed());
        assert!(!provider.change_token().has_changed());
    }

    #[test]
    fn closed_provider_fails() {
        let provider = SecretKeyProvider::from_keys(vec![key("a")]);
        provider.keys().unwrap();
        provider.close();
        assert!(matches!(
            provider.keys(),
            Err(CryptoError::Disposed("SecretKeyProvider"))
        ));
    }

    #[test]
    fn close_cascades_to_sources() {
        use std::sync::atomic::{AtomicBool, Ordering};

        struct Tracked {
            inner: StaticSecretKeyDataSource,
            closed: Arc<AtomicBool>,
        }
        impl SecretKeyDataSource for Tracked {
            fn keys(&self) -> Result<Arc<Vec<Arc<SecretKey>>>, CryptoError> {
                self.inner.keys()
            }
            fn change_token(&self) -> ChangeToken {
                self.inner.change_token()
            }
            fn close(&self) {
                self.closed.store(true, Ordering::SeqCst);
            }
        }

        let closed = Arc::new(AtomicBool::new(false));
        let provider = SecretKeyProvider::new(vec![Box::new(Tracked {
            inner: StaticSecretKeyDataSource::new(vec![key("a")]),
            closed: Arc::clone(&closed),
        })]);

        provider.close();
        assert!(closed.load(Ordering::SeqCst));
        // A second close is a no-op.
        provider.close();
    }
}
