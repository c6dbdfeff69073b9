//! Transactional session element.
//!
//! Begins a database session before delegating inward and settles it from
//! the cleanup hooks: commit+close on success, rollback+close on failure.
//! The session lives in the attribute bag under
//! [`TransactionElement::session_key`], where the business logic reads it.
//!
//! The database itself is a collaborator, not implemented here; anything
//! that can hand out sessions implements [`SessionProvider`].

use std::sync::{Arc, OnceLock};

use strata_core::{AttributeKey, Outcome, RequestContext, StackError};

use crate::element::{BoxFuture, ChainResult, Next, StackElement};

/// A transactional unit of work owned by one request.
///
/// The session is acquired in `proceed` and settled exactly once by the
/// matching cleanup hook; no element may retain it beyond the request.
pub trait Session: Send + Sync {
    /// Commits the work performed in this session.
    fn commit<'a>(&'a self) -> BoxFuture<'a, Outcome<()>>;

    /// Discards the work performed in this session.
    fn rollback<'a>(&'a self) -> BoxFuture<'a, Outcome<()>>;

    /// Releases the session's underlying resources.
    ///
    /// Always invoked, even when commit or rollback failed.
    fn close<'a>(&'a self) -> BoxFuture<'a, Outcome<()>>;
}

/// A shared handle to a request-scoped [`Session`].
pub type SessionHandle = Arc<dyn Session>;

/// Hands out transactional sessions.
pub trait SessionProvider: Send + Sync {
    /// Begins a new session for one request.
    fn begin<'a>(&'a self) -> BoxFuture<'a, Outcome<SessionHandle>>;
}

/// Element that wraps the rest of the chain in a transactional session.
pub struct TransactionElement {
    provider: Arc<dyn SessionProvider>,
}

impl TransactionElement {
    /// Creates a transaction element backed by `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn SessionProvider>) -> Self {
        Self { provider }
    }

    /// The bag key under which the request's session is published.
    #[must_use]
    pub fn session_key() -> &'static AttributeKey<SessionHandle> {
        static KEY: OnceLock<AttributeKey<SessionHandle>> = OnceLock::new();
        KEY.get_or_init(|| AttributeKey::new("db.session"))
    }
}

impl<T> StackElement<T> for TransactionElement
where
    T: Send + 'static,
{
    fn name(&self) -> &'static str {
        "transaction"
    }

    fn proceed<'a>(
        &'a self,
        ctx: RequestContext,
        next: Next<'a, T>,
    ) -> BoxFuture<'a, ChainResult<T>> {
        Box::pin(async move {
            let session = match self.provider.begin().await {
                Ok(session) => session,
                Err(error) => {
                    return (
                        ctx,
                        Err(StackError::element_with_source(
                            "transaction",
                            "failed to begin session",
                            error,
                        )),
                    );
                }
            };

            let ctx = ctx.with_attribute(Self::session_key(), session);
            next.run(ctx).await
        })
    }

    fn on_success<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Outcome<()>> {
        Box::pin(async move {
            // Absent when an outer element short-circuited before us.
            let Some(session) = ctx.get_optional(Self::session_key()) else {
                return Ok(());
            };

            let committed = session.commit().await;
            let closed = session.close().await;
            committed.and(closed)
        })
    }

    fn on_failure<'a>(
        &'a self,
        ctx: &'a RequestContext,
        _error: &'a StackError,
    ) -> BoxFuture<'a, Outcome<()>> {
        Box::pin(async move {
            let Some(session) = ctx.get_optional(Self::session_key()) else {
                return Ok(());
            };

            let rolled_back = session.rollback().await;
            let closed = session.close().await;
            rolled_back.and(closed)
        })
    }
}
