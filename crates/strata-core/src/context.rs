//! Request context types.
//!
//! The [`RequestContext`] pairs the raw incoming request with its
//! [`AttributeBag`] and is threaded by value through the element chain.
//! The request itself is immutable and `Arc`-shared; the bag is extended
//! copy-on-write via [`RequestContext::with_attribute`].

use crate::attrs::{AttributeBag, AttributeKey};
use crate::error::Outcome;
use bytes::Bytes;
use http_body_util::Full;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// The raw request type threaded through the chain.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body, a
/// framework-neutral representation. The host web framework owns its
/// construction; this library only reads it.
pub type Request = http::Request<Full<Bytes>>;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking
/// and log correlation.
///
/// # Example
///
/// ```
/// use strata_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    ///
    /// Useful when the request ID was supplied by a client or upstream
    /// service.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<RequestId> for Uuid {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

/// Per-request context threaded by value through the element chain.
///
/// The context is exclusively owned by the executing chain for the
/// duration of one request. Elements publish new attribute values with
/// [`RequestContext::with_attribute`], which returns an extended context;
/// the request itself stays immutable throughout.
///
/// Cloning is cheap: the request is `Arc`-shared and bag values are
/// `Arc`-shared, so clones are shallow.
///
/// # Example
///
/// ```
/// use strata_core::{AttributeKey, RequestContext};
///
/// let key: AttributeKey<u32> = AttributeKey::new("answer");
/// let ctx = RequestContext::mock().with_attribute(&key, 42);
/// assert_eq!(ctx.get(&key).unwrap(), &42);
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request.
    request_id: RequestId,

    /// The raw incoming request, shared so the context stays cheap to pass
    /// by value.
    request: Arc<Request>,

    /// Per-request attribute storage.
    attributes: AttributeBag,

    /// When the request started processing.
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context for `request` with a fresh request ID and an
    /// empty attribute bag.
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self::seeded(request, AttributeBag::new())
    }

    /// Creates a context for `request` seeded with initial attributes.
    ///
    /// Seed attributes are visible to every element in the chain; they
    /// carry per-invocation configuration such as a required authority
    /// level.
    #[must_use]
    pub fn seeded(request: Request, attributes: AttributeBag) -> Self {
        Self {
            request_id: RequestId::new(),
            request: Arc::new(request),
            attributes,
            started_at: Instant::now(),
        }
    }

    /// Creates a minimal context for testing purposes.
    #[must_use]
    pub fn mock() -> Self {
        let request = http::Request::builder()
            .method(http::Method::GET)
            .uri("/")
            .body(Full::new(Bytes::new()))
            .expect("failed to build mock request");
        Self::new(request)
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the raw incoming request.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the attribute bag.
    #[must_use]
    pub const fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    /// Returns a new context whose bag is extended with `key → value`.
    ///
    /// This is the copy-on-write publication step: the original context is
    /// consumed and the extended one must be used going forward.
    #[must_use]
    pub fn with_attribute<T: Send + Sync + 'static>(
        mut self,
        key: &AttributeKey<T>,
        value: T,
    ) -> Self {
        self.attributes = self.attributes.set(key, value);
        self
    }

    /// Returns the attribute for `key`, failing fast if it was never set.
    pub fn get<T: Send + Sync + 'static>(&self, key: &AttributeKey<T>) -> Outcome<&T> {
        self.attributes.get(key)
    }

    /// Returns the attribute for `key`, or `None` if it was never set.
    #[must_use]
    pub fn get_optional<T: Send + Sync + 'static>(&self, key: &AttributeKey<T>) -> Option<&T> {
        self.attributes.get_optional(key)
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_new_generates_unique_ids() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();
        assert_ne!(id1, id2, "Each RequestId should be unique");
    }

    #[test]
    fn test_request_id_display() {
        let id = RequestId::new();
        let display = id.to_string();
        assert_eq!(display.len(), 36, "UUID string should be 36 characters");
        assert!(display.contains('-'), "UUID should contain hyphens");
    }

    #[test]
    fn test_request_id_serialization() {
        let id = RequestId::new();
        let json = serde_json::to_string(&id).expect("serialization should work");
        let parsed: RequestId = serde_json::from_str(&json).expect("deserialization should work");
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_new_context_has_empty_bag() {
        let ctx = RequestContext::mock();
        assert!(ctx.attributes().is_empty());
    }

    #[test]
    fn test_seeded_attributes_are_visible() {
        let key: AttributeKey<u32> = AttributeKey::new("minimum.level");
        let seeds = AttributeBag::new().set(&key, 3);
        let request = http::Request::builder()
            .uri("/admin")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let ctx = RequestContext::seeded(request, seeds);
        assert_eq!(ctx.get(&key).unwrap(), &3);
        assert_eq!(ctx.request().uri().path(), "/admin");
    }

    #[test]
    fn test_with_attribute_extends_bag() {
        let first: AttributeKey<u32> = AttributeKey::new("first");
        let second: AttributeKey<&'static str> = AttributeKey::new("second");

        let ctx = RequestContext::mock()
            .with_attribute(&first, 1)
            .with_attribute(&second, "two");

        assert_eq!(ctx.get(&first).unwrap(), &1);
        assert_eq!(ctx.get(&second).unwrap(), &"two");
    }

    #[test]
    fn test_clones_share_request() {
        let key: AttributeKey<u32> = AttributeKey::new("n");
        let ctx = RequestContext::mock();
        let extended = ctx.clone().with_attribute(&key, 1);

        assert_eq!(ctx.request_id(), extended.request_id());
        assert!(ctx.get_optional(&key).is_none());
        assert_eq!(extended.get(&key).unwrap(), &1);
    }

    #[test]
    fn test_elapsed_time() {
        let ctx = RequestContext::mock();
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(ctx.elapsed() >= std::time::Duration::from_millis(10));
    }
}
