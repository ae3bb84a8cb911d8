//! Provides [`KeySet`], a [`KeyProvider`] that resolves keys by the `kid` header
use std::collections::BTreeMap;

use crate::{
    JwtError,
    crypto::PublicKey,
    error::KeyError,
    header::Kid,
    jwks::JwkSet,
    validation::{
        KeyProvider,
        VerificationKey,
    },
};

/// In-memory [`KeyProvider`] implementation that determines key
/// association via the `kid` JWT header parameter.
///
/// Tokens without a `kid`, or whose `kid` names no key in the set, fail with
/// [`JwtError::VerificationKeyNotFound`].
#[derive(Debug, Clone)]
pub struct KeySet<VK: VerificationKey = PublicKey> {
    keys: BTreeMap<String, VK>,
}

impl<VK: VerificationKey> KeySet<VK> {
    /// Instantiates a new, empty [`KeySet`]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            keys: BTreeMap::new(),
        }
    }

    /// Adds a [`VerificationKey`] under `key_id`, replacing any key already bound to it
    pub fn add_key(&mut self, key_id: impl Into<String>, key: VK) {
        self.keys.insert(key_id.into(), key);
    }

    /// Removes the [`VerificationKey`] bound to `key_id`
    pub fn remove_key(&mut self, key_id: impl AsRef<str>) -> Option<VK> {
        self.keys.remove(key_id.as_ref())
    }

    /// Number of keys in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set holds no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeySet<PublicKey> {
    /// Adds `key` under its thumbprint `kid`
    pub fn insert(&mut self, key: PublicKey) {
        self.add_key(key.kid().to_owned(), key);
    }
}

impl FromIterator<PublicKey> for KeySet<PublicKey> {
    fn from_iter<T: IntoIterator<Item = PublicKey>>(iter: T) -> Self {
        let mut set = Self::empty();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

impl TryFrom<&JwkSet> for KeySet<PublicKey> {
    type Error = KeyError;

    /// Imports every key of a published JWKS document.
    fn try_from(value: &JwkSet) -> Result<Self, Self::Error> {
        value.keys.iter().map(PublicKey::try_from).collect()
    }
}

impl<H, C, VK> KeyProvider<H, C> for KeySet<VK>
where
    H: Kid,
    VK: VerificationKey,
{
    type Key = VK;

    fn resolve_key(&self, header: &H, _: &C) -> Result<&VK, JwtError> {
        header
            .kid()
            .and_then(|kid| self.keys.get(kid))
            .ok_or(JwtError::VerificationKeyNotFound)
    }
}
