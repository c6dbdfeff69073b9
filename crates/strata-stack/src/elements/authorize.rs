//! Authorization element.
//!
//! Checks the caller against a per-invocation required authority before
//! anything inward of it runs. The required [`Authority`] is supplied as
//! a seed attribute (caller configuration, decided per action invocation,
//! not per controller) and the authenticated [`Principal`] is published
//! for inner elements and the body.
//!
//! A denied request short-circuits with a 403-equivalent outcome; the
//! body never runs.
//!
//! The authorization algorithm itself is a collaborator behind the
//! [`Authorizer`] trait, not implemented here.

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use strata_core::{AttributeKey, Request, RequestContext, StackError};

use crate::element::{BoxFuture, ChainResult, Next, StackElement};

/// A required privilege level.
///
/// The library treats authority as an opaque ordered level; what a given
/// level means is the [`Authorizer`]'s business.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Authority(u32);

impl Authority {
    /// Creates an authority at the given level.
    #[must_use]
    pub const fn new(level: u32) -> Self {
        Self(level)
    }

    /// Returns the numeric level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.0
    }

    /// Returns `true` if this authority satisfies `required`.
    #[must_use]
    pub const fn satisfies(&self, required: Self) -> bool {
        self.0 >= required.0
    }
}

/// The authenticated caller an [`Authorizer`] resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable identifier of the caller.
    pub id: String,
    /// Display name, if known.
    pub name: Option<String>,
    /// The authority the caller holds.
    pub authority: Authority,
}

impl Principal {
    /// Creates a principal with the given id and authority.
    #[must_use]
    pub fn new(id: impl Into<String>, authority: Authority) -> Self {
        Self {
            id: id.into(),
            name: None,
            authority,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Authorization decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzDecision {
    /// The caller holds the required authority.
    Grant(Principal),
    /// The request is denied with a reason.
    Deny {
        /// The reason for denial.
        reason: String,
    },
}

/// Resolves whether a request's caller holds a required authority.
pub trait Authorizer: Send + Sync {
    /// Evaluates the request against the required authority.
    fn authorize<'a>(
        &'a self,
        required: Authority,
        request: &'a Request,
    ) -> BoxFuture<'a, AuthzDecision>;
}

/// Element that gates the rest of the chain on authorization.
pub struct AuthorizeElement {
    authorizer: Arc<dyn Authorizer>,
}

impl AuthorizeElement {
    /// Creates an authorization element backed by `authorizer`.
    #[must_use]
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self { authorizer }
    }

    /// The seed key carrying the required authority for one invocation.
    ///
    /// Forgetting to seed this key fails the request fast with a
    /// missing-attribute error rather than silently allowing it.
    #[must_use]
    pub fn required_authority_key() -> &'static AttributeKey<Authority> {
        static KEY: OnceLock<AttributeKey<Authority>> = OnceLock::new();
        KEY.get_or_init(|| AttributeKey::new("authz.required_authority"))
    }

    /// The bag key under which the authenticated principal is published.
    #[must_use]
    pub fn principal_key() -> &'static AttributeKey<Principal> {
        static KEY: OnceLock<AttributeKey<Principal>> = OnceLock::new();
        KEY.get_or_init(|| AttributeKey::new("authz.principal"))
    }
}

impl<T> StackElement<T> for AuthorizeElement
where
    T: Send + 'static,
{
    fn name(&self) -> &'static str {
        "authorize"
    }

    fn proceed<'a>(
        &'a self,
        ctx: RequestContext,
        next: Next<'a, T>,
    ) -> BoxFuture<'a, ChainResult<T>> {
        Box::pin(async move {
            let required = match ctx.get(Self::required_authority_key()) {
                Ok(required) => *required,
                Err(error) => return (ctx, Err(error)),
            };

            let decision = self.authorizer.authorize(required, ctx.request()).await;
            match decision {
                AuthzDecision::Grant(principal) => {
                    tracing::debug!(
                        element = "authorize",
                        principal = %principal.id,
                        required_level = required.level(),
                        "authorization granted"
                    );
                    let ctx = ctx.with_attribute(Self::principal_key(), principal);
                    next.run(ctx).await
                }
                AuthzDecision::Deny { reason } => {
                    tracing::debug!(
                        element = "authorize",
                        required_level = required.level(),
                        %reason,
                        "authorization denied"
                    );
                    (ctx, Err(StackError::forbidden(reason)))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{AttributeBag, Outcome};

    /// Grants when the configured caller authority satisfies the
    /// requirement.
    struct LevelAuthorizer {
        caller: Authority,
    }

    impl Authorizer for LevelAuthorizer {
        fn authorize<'a>(
            &'a self,
            required: Authority,
            _request: &'a Request,
        ) -> BoxFuture<'a, AuthzDecision> {
            Box::pin(async move {
                if self.caller.satisfies(required) {
                    AuthzDecision::Grant(
                        Principal::new("user-1", self.caller).with_name("Casey"),
                    )
                } else {
                    AuthzDecision::Deny {
                        reason: format!("level {} required", required.level()),
                    }
                }
            })
        }
    }

    fn seeded_ctx(required: Authority) -> RequestContext {
        let request = http::Request::builder()
            .uri("/orders")
            .body(http_body_util::Full::new(bytes::Bytes::new()))
            .unwrap();
        let seeds = AttributeBag::new().set(AuthorizeElement::required_authority_key(), required);
        RequestContext::seeded(request, seeds)
    }

    async fn run_element(element: &AuthorizeElement, ctx: RequestContext) -> ChainResult<u32> {
        let elements: Vec<Arc<dyn StackElement<u32>>> = Vec::new();
        let body = |_ctx: RequestContext| -> BoxFuture<'static, Outcome<u32>> {
            Box::pin(async { Ok(200) })
        };
        let next = Next::new(&elements, &body);
        StackElement::<u32>::proceed(element, ctx, next).await
    }

    #[test]
    fn test_authority_ordering() {
        let normal = Authority::new(1);
        let admin = Authority::new(2);

        assert!(admin.satisfies(normal));
        assert!(admin.satisfies(admin));
        assert!(!normal.satisfies(admin));
        assert!(normal < admin);
    }

    #[tokio::test]
    async fn test_grant_publishes_principal_and_delegates() {
        let element = AuthorizeElement::new(Arc::new(LevelAuthorizer {
            caller: Authority::new(2),
        }));

        let (ctx, outcome) = run_element(&element, seeded_ctx(Authority::new(1))).await;
        assert_eq!(outcome.unwrap(), 200);

        let principal = ctx.get(AuthorizeElement::principal_key()).unwrap();
        assert_eq!(principal.id, "user-1");
        assert_eq!(principal.name.as_deref(), Some("Casey"));
    }

    #[tokio::test]
    async fn test_denial_short_circuits() {
        let element = AuthorizeElement::new(Arc::new(LevelAuthorizer {
            caller: Authority::new(1),
        }));

        let (ctx, outcome) = run_element(&element, seeded_ctx(Authority::new(2))).await;
        let error = outcome.unwrap_err();

        assert!(error.is_short_circuit());
        assert_eq!(error.status_code(), http::StatusCode::FORBIDDEN);
        assert!(
            ctx.get_optional(AuthorizeElement::principal_key()).is_none(),
            "no principal on denial"
        );
    }

    #[tokio::test]
    async fn test_missing_seed_fails_fast() {
        let element = AuthorizeElement::new(Arc::new(LevelAuthorizer {
            caller: Authority::new(2),
        }));

        let (_ctx, outcome) = run_element(&element, RequestContext::mock()).await;
        let error = outcome.unwrap_err();
        assert!(matches!(error, StackError::MissingAttribute { .. }));
    }

    #[test]
    fn test_principal_serialization() {
        let principal = Principal::new("user-9", Authority::new(3));
        let json = serde_json::to_string(&principal).unwrap();
        let parsed: Principal = serde_json::from_str(&json).unwrap();
        assert_eq!(principal, parsed);
    }
}
