//! Asynchronous enrichment element.
//!
//! Awaits an external fetch before delegating inward and publishes the
//! fetched value under [`EnrichElement::enrichment_key`]. The fetch runs
//! under a timeout so the chain can never stall without producing an
//! outcome.
//!
//! What happens when the fetch fails or times out is a per-element
//! choice, [`EnrichFailurePolicy`]: `Fallback` delegates with the
//! unmodified context (the body simply sees no enrichment), `Fail`
//! turns the request into an element failure.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use strata_core::{AttributeKey, Outcome, Request, RequestContext, StackError};

use crate::element::{BoxFuture, ChainResult, Next, StackElement};

/// Fetches an enrichment value for a request.
pub trait Enricher: Send + Sync {
    /// Fetches the value to publish for this request.
    fn fetch<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Outcome<serde_json::Value>>;
}

/// What an [`EnrichElement`] does when its fetch fails or times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichFailurePolicy {
    /// Delegate inward with the unmodified context.
    Fallback,
    /// Fail the request with an element failure.
    Fail,
}

/// Default time budget for one enrichment fetch.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Element that enriches the context from an external source.
pub struct EnrichElement {
    enricher: Arc<dyn Enricher>,
    policy: EnrichFailurePolicy,
    timeout: Duration,
}

impl EnrichElement {
    /// Creates an enrichment element backed by `enricher`, with the
    /// fallback policy and a 5-second timeout.
    #[must_use]
    pub fn new(enricher: Arc<dyn Enricher>) -> Self {
        Self {
            enricher,
            policy: EnrichFailurePolicy::Fallback,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the failure policy.
    #[must_use]
    pub fn with_policy(mut self, policy: EnrichFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the fetch timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The bag key under which the fetched value is published.
    ///
    /// Bodies should read it with `get_optional` when the element runs
    /// with the fallback policy.
    #[must_use]
    pub fn enrichment_key() -> &'static AttributeKey<serde_json::Value> {
        static KEY: OnceLock<AttributeKey<serde_json::Value>> = OnceLock::new();
        KEY.get_or_init(|| AttributeKey::new("enrich.value"))
    }
}

impl<T> StackElement<T> for EnrichElement
where
    T: Send + 'static,
{
    fn name(&self) -> &'static str {
        "enrich"
    }

    fn proceed<'a>(
        &'a self,
        ctx: RequestContext,
        next: Next<'a, T>,
    ) -> BoxFuture<'a, ChainResult<T>> {
        Box::pin(async move {
            let fetched =
                tokio::time::timeout(self.timeout, self.enricher.fetch(ctx.request())).await;

            let failure = match fetched {
                Ok(Ok(value)) => {
                    let ctx = ctx.with_attribute(Self::enrichment_key(), value);
                    return next.run(ctx).await;
                }
                Ok(Err(error)) => error,
                Err(_) => StackError::element(
                    "enrich",
                    format!("fetch timed out after {}ms", self.timeout.as_millis()),
                ),
            };

            match self.policy {
                EnrichFailurePolicy::Fallback => {
                    tracing::warn!(
                        element = "enrich",
                        error = %failure,
                        "enrichment failed, proceeding unenriched"
                    );
                    next.run(ctx).await
                }
                EnrichFailurePolicy::Fail => (
                    ctx,
                    Err(StackError::element_with_source(
                        "enrich",
                        "enrichment failed",
                        failure,
                    )),
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticEnricher {
        result: Outcome<serde_json::Value>,
    }

    impl StaticEnricher {
        fn ok(value: serde_json::Value) -> Arc<Self> {
            Arc::new(Self { result: Ok(value) })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                result: Err(StackError::element("enrich", "upstream unavailable")),
            })
        }
    }

    impl Enricher for StaticEnricher {
        fn fetch<'a>(
            &'a self,
            _request: &'a Request,
        ) -> BoxFuture<'a, Outcome<serde_json::Value>> {
            Box::pin(async move {
                match &self.result {
                    Ok(value) => Ok(value.clone()),
                    Err(_) => Err(StackError::element("enrich", "upstream unavailable")),
                }
            })
        }
    }

    /// Never resolves within any sane test timeout.
    struct StalledEnricher;

    impl Enricher for StalledEnricher {
        fn fetch<'a>(
            &'a self,
            _request: &'a Request,
        ) -> BoxFuture<'a, Outcome<serde_json::Value>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(serde_json::Value::Null)
            })
        }
    }

    async fn run_element(element: &EnrichElement) -> ChainResult<u32> {
        let elements: Vec<Arc<dyn StackElement<u32>>> = Vec::new();
        let body = |ctx: RequestContext| -> BoxFuture<'static, Outcome<u32>> {
            Box::pin(async move {
                Ok(u32::from(
                    ctx.get_optional(EnrichElement::enrichment_key()).is_some(),
                ))
            })
        };
        let next = Next::new(&elements, &body);
        StackElement::<u32>::proceed(element, RequestContext::mock(), next).await
    }

    #[tokio::test]
    async fn test_publishes_fetched_value() {
        let element = EnrichElement::new(StaticEnricher::ok(json!({"score": 8})));
        let (ctx, outcome) = run_element(&element).await;

        assert_eq!(outcome.unwrap(), 1, "body saw the enrichment");
        let value = ctx.get(EnrichElement::enrichment_key()).unwrap();
        assert_eq!(value["score"], 8);
    }

    #[tokio::test]
    async fn test_fallback_proceeds_unenriched() {
        let element = EnrichElement::new(StaticEnricher::failing())
            .with_policy(EnrichFailurePolicy::Fallback);
        let (ctx, outcome) = run_element(&element).await;

        assert_eq!(outcome.unwrap(), 0, "body ran without the enrichment");
        assert!(ctx.get_optional(EnrichElement::enrichment_key()).is_none());
    }

    #[tokio::test]
    async fn test_fail_policy_surfaces_element_failure() {
        let element =
            EnrichElement::new(StaticEnricher::failing()).with_policy(EnrichFailurePolicy::Fail);
        let (_ctx, outcome) = run_element(&element).await;

        let error = outcome.unwrap_err();
        assert!(matches!(error, StackError::Element { .. }));
        assert!(!error.is_short_circuit());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_applies_policy() {
        let element = EnrichElement::new(Arc::new(StalledEnricher))
            .with_timeout(Duration::from_millis(50))
            .with_policy(EnrichFailurePolicy::Fallback);

        let (_ctx, outcome) = run_element(&element).await;
        assert_eq!(outcome.unwrap(), 0, "timed out fetch falls back");
    }
}
