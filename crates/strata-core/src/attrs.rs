//! Typed per-request attribute storage.
//!
//! The [`AttributeBag`] is the substrate that pipeline elements communicate
//! through: each element publishes the values it produced (a database
//! session, an authenticated principal, a resolved template) under a typed
//! [`AttributeKey`], and inner elements and the business logic read them
//! back. Bags are copy-on-write: `set` returns an extended bag and never
//! mutates the receiver, so a published bag can be shared freely.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{Outcome, StackError};

/// Process-wide allocator for attribute key identities.
static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(0);

/// A unique, typed identifier for a slot in an [`AttributeBag`].
///
/// Keys have identity-based equality: every call to [`AttributeKey::new`]
/// produces a distinct key, even for the same name. The name exists only
/// for diagnostics. The type parameter `T` is the value type the key
/// guards; it is enforced at both `set` and `get`.
///
/// # Example
///
/// ```
/// use strata_core::AttributeKey;
///
/// let a: AttributeKey<u32> = AttributeKey::new("retries");
/// let b: AttributeKey<u32> = AttributeKey::new("retries");
/// assert_ne!(a, b, "same name, distinct identity");
/// ```
pub struct AttributeKey<T> {
    id: u64,
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AttributeKey<T> {
    /// Creates a new key with a fresh, process-unique identity.
    ///
    /// The name is used in error messages and debug output only; it does
    /// not participate in equality.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            id: NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed),
            name,
            _marker: PhantomData,
        }
    }

    /// Returns the diagnostic name of this key.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the unique identity of this key.
    pub(crate) const fn id(&self) -> u64 {
        self.id
    }
}

// Manual impls: the key is Copy/comparable regardless of whether T is.
impl<T> Clone for AttributeKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AttributeKey<T> {}

impl<T> PartialEq for AttributeKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for AttributeKey<T> {}

impl<T> std::hash::Hash for AttributeKey<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for AttributeKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeKey")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// A stored attribute value together with its key's diagnostic name.
#[derive(Clone)]
struct Slot {
    name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

/// A typed, heterogeneous, copy-on-write per-request store.
///
/// Within one request's lifetime a bag only grows: [`AttributeBag::set`]
/// returns a new bag extended with the given entry, leaving the receiver
/// untouched. Values are `Arc`-shared internally, so extension is a
/// shallow copy. There is no removal operation.
///
/// Because keys have identity-based equality, two keys of the same value
/// type occupy distinct slots.
///
/// # Example
///
/// ```
/// use strata_core::{AttributeBag, AttributeKey};
///
/// let key: AttributeKey<String> = AttributeKey::new("greeting");
/// let empty = AttributeBag::new();
/// let bag = empty.set(&key, "hello".to_string());
///
/// assert!(empty.get_optional(&key).is_none(), "receiver is untouched");
/// assert_eq!(bag.get(&key).unwrap(), "hello");
/// ```
#[derive(Clone, Default)]
pub struct AttributeBag {
    values: HashMap<u64, Slot>,
}

impl AttributeBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new bag identical to this one except that `key` now maps
    /// to `value`.
    ///
    /// The receiver is not mutated; call sites must use the returned bag
    /// going forward.
    #[must_use]
    pub fn set<T: Send + Sync + 'static>(&self, key: &AttributeKey<T>, value: T) -> Self {
        let mut values = self.values.clone();
        values.insert(
            key.id(),
            Slot {
                name: key.name(),
                value: Arc::new(value),
            },
        );
        Self { values }
    }

    /// Returns the value previously set for `key`.
    ///
    /// Failing to find the key is a programmer error (a required element
    /// was not stacked, or a seed attribute was not supplied) and fails
    /// fast with [`StackError::MissingAttribute`]. Use
    /// [`AttributeBag::get_optional`] where absence is expected.
    pub fn get<T: Send + Sync + 'static>(&self, key: &AttributeKey<T>) -> Outcome<&T> {
        self.get_optional(key)
            .ok_or_else(|| StackError::missing_attribute(key.name()))
    }

    /// Returns the value for `key`, or `None` if it was never set.
    #[must_use]
    pub fn get_optional<T: Send + Sync + 'static>(&self, key: &AttributeKey<T>) -> Option<&T> {
        self.values
            .get(&key.id())
            .and_then(|slot| slot.value.downcast_ref::<T>())
    }

    /// Returns `true` if a value was set for `key`.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self, key: &AttributeKey<T>) -> bool {
        self.values.contains_key(&key.id())
    }

    /// Returns the number of attributes in the bag.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the bag holds no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for AttributeBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&'static str> = self.values.values().map(|slot| slot.name).collect();
        names.sort_unstable();
        f.debug_struct("AttributeBag").field("keys", &names).finish()
    }
}
