//! Core element trait and continuation types.
//!
//! This module defines the [`StackElement`] trait that all stackable
//! behaviors implement, and the [`Next`] continuation that represents the
//! rest of the chain.
//!
//! # Design Philosophy
//!
//! An element contributes three hook points around the shared request:
//! `proceed` wraps the inward delegation, and `on_success`/`on_failure`
//! release whatever `proceed` acquired once the whole chain has settled.
//! The cleanup hooks are *not* called from inside `proceed`; they are
//! driven exactly once by the [`StackAction`](crate::action::StackAction)
//! entry point, in reverse stacking order, so a retrying element can
//! invoke `next` as often as it likes without double-firing cleanup.
//!
//! # Example
//!
//! ```ignore
//! use strata_stack::{BoxFuture, ChainResult, Next, StackElement};
//! use strata_core::RequestContext;
//!
//! struct StampElement;
//!
//! impl<T: Send + 'static> StackElement<T> for StampElement {
//!     fn name(&self) -> &'static str {
//!         "stamp"
//!     }
//!
//!     fn proceed<'a>(
//!         &'a self,
//!         ctx: RequestContext,
//!         next: Next<'a, T>,
//!     ) -> BoxFuture<'a, ChainResult<T>> {
//!         Box::pin(async move {
//!             let ctx = ctx.with_attribute(stamp_key(), now());
//!             next.run(ctx).await
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use strata_core::{Outcome, RequestContext, StackError};

/// A boxed future, the continuation currency of the chain.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What one step of the chain produces: the deepest context observed so
/// far, threaded back outward, together with the outcome.
///
/// Threading the context back out is what lets the entry point run the
/// cleanup pass against the fullest attribute bag, including values
/// published by elements deeper than a failure point.
pub type ChainResult<T> = (RequestContext, Outcome<T>);

/// The terminal continuation: the innermost business logic.
///
/// The body receives its own copy of the context (contexts are cheap,
/// `Arc`-backed clones) and must be re-invocable, because an element is
/// allowed to retry the inward call.
pub type BodyFn<T> = dyn Fn(RequestContext) -> BoxFuture<'static, Outcome<T>> + Send + Sync;

/// The core element trait.
///
/// Elements are stateless across requests: one instance is shared by
/// every request flowing through a composition, so any per-request state
/// must live in the context's attribute bag, never on the element.
///
/// # Invariants
///
/// - `proceed` must always produce an outcome: delegate, short-circuit,
///   or fail, but never hang without resolution, so cleanup can always be
///   scheduled.
/// - Cleanup hooks must tolerate requests their `proceed` never entered
///   (an outer element may have short-circuited first); look attributes
///   up with `get_optional` and no-op on absence.
/// - Cleanup hooks must not assume the other hook ran: exactly one of
///   `on_success` / `on_failure` fires per request.
pub trait StackElement<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    /// Returns the unique name of this element.
    ///
    /// This name is used for logging, cleanup reporting, and debugging.
    fn name(&self) -> &'static str;

    /// Process the request through this element.
    ///
    /// An element may call `next.run` zero or more times (normally exactly
    /// once) to delegate inward with an augmented context, short-circuit
    /// by producing an outcome without delegating, or wrap the inward
    /// call in error translation. The default is the identity element:
    /// delegate with the context unchanged.
    fn proceed<'a>(
        &'a self,
        ctx: RequestContext,
        next: Next<'a, T>,
    ) -> BoxFuture<'a, ChainResult<T>> {
        Box::pin(async move { next.run(ctx).await })
    }

    /// Success-path cleanup, invoked once after the chain produced a
    /// successful outcome.
    ///
    /// Hooks run outward (innermost element first); a hook error is
    /// reported but never prevents outer hooks from running.
    fn on_success<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Outcome<()>> {
        let _ = ctx;
        Box::pin(async { Ok(()) })
    }

    /// Failure-path cleanup, invoked once after the chain failed or
    /// short-circuited, mirroring [`StackElement::on_success`].
    fn on_failure<'a>(
        &'a self,
        ctx: &'a RequestContext,
        error: &'a StackError,
    ) -> BoxFuture<'a, Outcome<()>> {
        let _ = (ctx, error);
        Box::pin(async { Ok(()) })
    }
}

/// Continuation representing "the rest of the chain".
///
/// A `Next` is a cheap copyable view over the remaining elements and the
/// terminal body. Copyability is deliberate: it is what allows an element
/// to invoke the inward call more than once (e.g. a retry), which the
/// entry point's single cleanup pass makes safe.
pub struct Next<'a, T>
where
    T: Send + 'static,
{
    /// The elements remaining inward of the caller.
    elements: &'a [Arc<dyn StackElement<T>>],
    /// The innermost business logic.
    body: &'a BodyFn<T>,
}

impl<T> Clone for Next<'_, T>
where
    T: Send + 'static,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Next<'_, T> where T: Send + 'static {}

impl<'a, T> Next<'a, T>
where
    T: Send + 'static,
{
    /// Creates a continuation over `elements` terminating in `body`.
    pub(crate) const fn new(elements: &'a [Arc<dyn StackElement<T>>], body: &'a BodyFn<T>) -> Self {
        Self { elements, body }
    }

    /// Returns the number of elements remaining before the body.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if running this continuation invokes the body
    /// directly.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.elements.is_empty()
    }

    /// Invokes the next element inward, or the body if none remain.
    ///
    /// The body receives its own clone of the context; the context itself
    /// is threaded back out in the returned [`ChainResult`].
    pub fn run(self, ctx: RequestContext) -> BoxFuture<'a, ChainResult<T>> {
        match self.elements.split_first() {
            Some((element, rest)) => {
                let next = Self {
                    elements: rest,
                    body: self.body,
                };
                element.proceed(ctx, next)
            }
            None => Box::pin(async move {
                let outcome = (self.body)(ctx.clone()).await;
                (ctx, outcome)
            }),
        }
    }
}

/// An element defined by a function.
///
/// This allows defining simple elements without implementing the trait
/// directly. Plain `fn` items coerce cleanly to the required signature:
///
/// ```ignore
/// fn shed_load<T: Send + 'static>(
///     ctx: RequestContext,
///     next: Next<'_, T>,
/// ) -> BoxFuture<'_, ChainResult<T>> {
///     Box::pin(async move {
///         if overloaded() {
///             return (ctx, Err(StackError::short_circuit(/* ... */)));
///         }
///         next.run(ctx).await
///     })
/// }
///
/// let element = FnElement::new("shed-load", shed_load);
/// ```
pub struct FnElement<F> {
    name: &'static str,
    func: F,
}

impl<F> FnElement<F> {
    /// Creates a new function-based element.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<T, F> StackElement<T> for FnElement<F>
where
    T: Send + 'static,
    F: for<'a> Fn(RequestContext, Next<'a, T>) -> BoxFuture<'a, ChainResult<T>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn proceed<'a>(
        &'a self,
        ctx: RequestContext,
        next: Next<'a, T>,
    ) -> BoxFuture<'a, ChainResult<T>> {
        (self.func)(ctx, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::AttributeKey;
    use std::sync::OnceLock;

    /// An element that relies entirely on the trait defaults.
    struct IdentityElement;

    impl<T: Send + 'static> StackElement<T> for IdentityElement {
        fn name(&self) -> &'static str {
            "identity"
        }
    }

    fn marker_key() -> &'static AttributeKey<u32> {
        static KEY: OnceLock<AttributeKey<u32>> = OnceLock::new();
        KEY.get_or_init(|| AttributeKey::new("test.marker"))
    }

    /// An element that publishes a marker attribute before delegating.
    struct MarkerElement;

    impl<T: Send + 'static> StackElement<T> for MarkerElement {
        fn name(&self) -> &'static str {
            "marker"
        }

        fn proceed<'a>(
            &'a self,
            ctx: RequestContext,
            next: Next<'a, T>,
        ) -> BoxFuture<'a, ChainResult<T>> {
            Box::pin(async move {
                let ctx = ctx.with_attribute(marker_key(), 99);
                next.run(ctx).await
            })
        }
    }

    fn read_marker_body(ctx: RequestContext) -> BoxFuture<'static, Outcome<u32>> {
        Box::pin(async move { ctx.get(marker_key()).copied() })
    }

    #[tokio::test]
    async fn test_terminal_next_invokes_body() {
        let elements: Vec<Arc<dyn StackElement<u32>>> = Vec::new();
        let body = |_ctx: RequestContext| -> BoxFuture<'static, Outcome<u32>> {
            Box::pin(async { Ok(7) })
        };

        let next = Next::new(&elements, &body);
        assert!(next.is_terminal());
        assert_eq!(next.remaining(), 0);

        let (_ctx, outcome) = next.run(RequestContext::mock()).await;
        assert_eq!(outcome.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_default_proceed_is_identity() {
        let elements: Vec<Arc<dyn StackElement<u32>>> =
            vec![Arc::new(IdentityElement), Arc::new(MarkerElement)];
        let body = read_marker_body;
        let body_ref: &BodyFn<u32> = &body;

        let next = Next::new(&elements, body_ref);
        let (ctx, outcome) = next.run(RequestContext::mock()).await;

        assert_eq!(outcome.unwrap(), 99);
        assert_eq!(ctx.get(marker_key()).unwrap(), &99);
    }

    #[tokio::test]
    async fn test_next_is_reinvocable() {
        let elements: Vec<Arc<dyn StackElement<u32>>> = vec![Arc::new(MarkerElement)];
        let body = read_marker_body;
        let body_ref: &BodyFn<u32> = &body;

        let next = Next::new(&elements, body_ref);
        let (_ctx, first) = next.run(RequestContext::mock()).await;
        let (_ctx, second) = next.run(RequestContext::mock()).await;

        assert_eq!(first.unwrap(), 99);
        assert_eq!(second.unwrap(), 99);
    }

    #[tokio::test]
    async fn test_fn_element() {
        fn double_marker(
            ctx: RequestContext,
            next: Next<'_, u32>,
        ) -> BoxFuture<'_, ChainResult<u32>> {
            Box::pin(async move {
                let ctx = ctx.with_attribute(marker_key(), 21);
                next.run(ctx).await
            })
        }

        let element = FnElement::new("double-marker", double_marker);
        assert_eq!(StackElement::<u32>::name(&element), "double-marker");

        let elements: Vec<Arc<dyn StackElement<u32>>> = vec![Arc::new(element)];
        let body = read_marker_body;
        let body_ref: &BodyFn<u32> = &body;

        let (_ctx, outcome) = Next::new(&elements, body_ref).run(RequestContext::mock()).await;
        assert_eq!(outcome.unwrap(), 21);
    }

    #[tokio::test]
    async fn test_default_cleanup_hooks_are_noops() {
        let element = IdentityElement;
        let ctx = RequestContext::mock();
        let error = StackError::body("boom");

        assert!(StackElement::<u32>::on_success(&element, &ctx).await.is_ok());
        assert!(StackElement::<u32>::on_failure(&element, &ctx, &error)
            .await
            .is_ok());
    }
}
