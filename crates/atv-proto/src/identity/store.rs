//! Identity store: where the client keeps its certificate between runs.
//!
//! The [`IdentityStore`] trait abstracts persistence of the one client
//! identity. [`MemoryIdentityStore`] keeps it in memory, suitable for tests
//! and short-lived processes; callers that need persistence implement the
//! trait over files or a keychain using [`ClientIdentity::to_pem`].
//!
//! A paired peer recognises the client by its certificate, so a store must
//! hand back the same identity until it is explicitly recreated.

use std::sync::{PoisonError, RwLock};

use time::OffsetDateTime;

use crate::error::{ProtoError, Result};
use crate::identity::client::ClientIdentity;

/// Capability for checking, creating and loading the client identity.
///
/// Implementations must be `Send + Sync` so a store can be shared via
/// `Arc<dyn IdentityStore>` across async tasks.
pub trait IdentityStore: Send + Sync {
    /// Returns `true` if an identity has been created.
    fn has_identity(&self) -> bool;

    /// Generate a new identity with `common_name` and store it, replacing
    /// any existing one.
    fn create_identity(&self, common_name: &str) -> Result<()>;

    /// Load the stored identity. Fails with [`ProtoError::IdentityMissing`]
    /// if none exists.
    fn load_identity(&self) -> Result<ClientIdentity>;
}

/// Load the stored identity, creating it first if the store is empty.
pub fn load_or_create(store: &dyn IdentityStore, common_name: &str) -> Result<ClientIdentity> {
    if !store.has_identity() {
        store.create_identity(common_name)?;
    }
    store.load_identity()
}

/// In-memory identity store backed by `RwLock<Option<ClientIdentity>>`.
#[derive(Default)]
pub struct MemoryIdentityStore {
    identity: RwLock<Option<ClientIdentity>>,
}

impl MemoryIdentityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with an existing identity.
    pub fn with_identity(identity: ClientIdentity) -> Self {
        Self {
            identity: RwLock::new(Some(identity)),
        }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn has_identity(&self) -> bool {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn create_identity(&self, common_name: &str) -> Result<()> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let identity = ClientIdentity::generate(common_name, now)?;
        *self
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(identity);
        Ok(())
    }

    fn load_identity(&self) -> Result<ClientIdentity> {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ProtoError::IdentityMissing)
    }
}
