//! Algorithm registry and composable algorithm sources.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use crate::change::{ChangeSource, ChangeToken};
use crate::error::CryptoError;

use super::{
    AeadAlgorithm, CompressionAlgorithm, JoseAlgorithm, KeyManagementAlgorithm,
    SignatureAlgorithm,
};

/// An immutable, queryable set of algorithms, unique by code.
///
/// Typed getters return `None` both when the code is unknown and when
/// the code resolves to an algorithm of a different capability;
/// callers must treat the two identically.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmCollection {
    by_code: HashMap<String, JoseAlgorithm>,
}

impl AlgorithmCollection {
    /// Build a collection, failing if two algorithms share a code.
    pub fn new(algorithms: impl IntoIterator<Item = JoseAlgorithm>) -> Result<Self, CryptoError> {
        let mut by_code = HashMap::new();
        for algorithm in algorithms {
            let code = algorithm.code().to_owned();
            if by_code.insert(code.clone(), algorithm).is_some() {
                return Err(CryptoError::DuplicateAlgorithmCode(code));
            }
        }
        Ok(AlgorithmCollection { by_code })
    }

    /// Every built-in algorithm this crate ships.
    pub fn standard() -> Self {
        let algorithms = super::none::algorithms()
            .chain(super::hmac::algorithms())
            .chain(super::rsa::algorithms())
            .chain(super::ecdsa::algorithms())
            .chain(super::aesgcm::algorithms())
            .chain(super::aescbc::algorithms())
            .chain(super::keywrap::algorithms())
            .chain(super::compression::algorithms());
        // Built-in codes are distinct by construction.
        Self::new(algorithms).expect("built-in algorithm codes are unique")
    }

    /// Number of registered algorithms.
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Look up any algorithm by code.
    pub fn get(&self, code: &str) -> Option<&JoseAlgorithm> {
        self.by_code.get(code)
    }

    /// Look up a signature algorithm by code.
    pub fn signature(&self, code: &str) -> Option<Arc<dyn SignatureAlgorithm>> {
        self.get(code)?.as_signature()
    }

    /// Look up a key-management algorithm by code.
    pub fn key_management(&self, code: &str) -> Option<Arc<dyn KeyManagementAlgorithm>> {
        self.get(code)?.as_key_management()
    }

    /// Look up an authenticated-encryption algorithm by code.
    pub fn encryption(&self, code: &str) -> Option<Arc<dyn AeadAlgorithm>> {
        self.get(code)?.as_encryption()
    }

    /// Look up a compression algorithm by code.
    pub fn compression(&self, code: &str) -> Option<Arc<dyn CompressionAlgorithm>> {
        self.get(code)?.as_compression()
    }

    /// Iterate over the registered algorithms.
    pub fn iter(&self) -> impl Iterator<Item = &JoseAlgorithm> {
        self.by_code.values()
    }
}

/// A source of algorithms with change notification, for hot
/// algorithm-set changes.
pub trait AlgorithmDataSource: Send + Sync {
    /// The current algorithm list, in registration order.
    fn algorithms(&self) -> Result<Arc<Vec<JoseAlgorithm>>, CryptoError>;

    /// A token that fires when the algorithm list changes.
    fn change_token(&self) -> ChangeToken;

    /// Release the source's resources. The default is a no-op;
    /// stateful sources mark themselves disposed.
    fn close(&self) {}
}

/// An algorithm source backed by an in-memory list.
#[derive(Debug)]
pub struct StaticAlgorithmDataSource {
    algorithms: ArcSwap<Vec<JoseAlgorithm>>,
    change: ChangeSource,
}

impl StaticAlgorithmDataSource {
    /// Create a source holding the given algorithms.
    pub fn new(algorithms: Vec<JoseAlgorithm>) -> Self {
        StaticAlgorithmDataSource {
            algorithms: ArcSwap::from_pointee(algorithms),
            change: ChangeSource::new(),
        }
    }

    /// Replace the algorithm list, firing the change token first.
    pub fn replace(&self, algorithms: Vec<JoseAlgorithm>) {
        self.change.notify();
        self.algorithms.store(Arc::new(algorithms));
    }
}

impl AlgorithmDataSource for StaticAlgorithmDataSource {
    fn algorithms(&self) -> Result<Arc<Vec<JoseAlgorithm>>, CryptoError> {
        Ok(self.algorithms.load_full())
    }

    fn change_token(&self) -> ChangeToken {
        self.change.token()
    }
}

struct CompositeState {
    tokens: Vec<ChangeToken>,
    initialized: bool,
}

/// Aggregates N algorithm sources.
///
/// The composite's list is the concatenation of all sources' current
/// lists, source order first, registration order within a source. It
/// is recomputed lazily, only when at least one underlying change
/// token has fired; the composite's own token fires exactly when any
/// underlying token fires, and a fresh unfired token is vended after
/// each recomputation.
pub struct CompositeAlgorithmDataSource {
    sources: Vec<Box<dyn AlgorithmDataSource>>,
    snapshot: ArcSwap<Vec<JoseAlgorithm>>,
    state: Mutex<CompositeState>,
    change: ChangeSource,
    closed: AtomicBool,
}

impl CompositeAlgorithmDataSource {
    /// Create a composite over the given sources.
    pub fn new(sources: Vec<Box<dyn AlgorithmDataSource>>) -> Self {
        CompositeAlgorithmDataSource {
            sources,
            snapshot: ArcSwap::from_pointee(Vec::new()),
            state: Mutex::new(CompositeState {
                tokens: Vec::new(),
                initialized: false,
            }),
            change: ChangeSource::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Build an [`AlgorithmCollection`] from the current snapshot.
    pub fn collection(&self) -> Result<AlgorithmCollection, CryptoError> {
        AlgorithmCollection::new(self.algorithms()?.iter().cloned())
    }

    /// Dispose the composite and every underlying source. All
    /// subsequent access fails with [`CryptoError::Disposed`].
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        for source in &self.sources {
            source.close();
        }
    }
}

impl AlgorithmDataSource for CompositeAlgorithmDataSource {
    fn algorithms(&self) -> Result<Arc<Vec<JoseAlgorithm>>, CryptoError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CryptoError::Disposed("CompositeAlgorithmDataSource"));
        }

        let mut state = self
            .state
            .lock()
            .map_err(|_| CryptoError::Disposed("CompositeAlgorithmDataSource"))?;

        if !state.initialized || state.tokens.iter().any(ChangeToken::has_changed) {
            let mut algorithms = Vec::new();
            let mut tokens = Vec::with_capacity(self.sources.len());
            for source in &self.sources {
                tokens.push(source.change_token());
                algorithms.extend(source.algorithms()?.iter().cloned());
            }
            if state.initialized {
                self.change.notify();
            }
            self.snapshot.store(Arc::new(algorithms));
            state.tokens = tokens;
            state.initialized = true;
        }

        Ok(self.snapshot.load_full())
    }

    fn change_token(&self) -> ChangeToken {
        self.change.token()
    }

    fn close(&self) {
        CompositeAlgorithmDataSource::close(self)
    }
}
