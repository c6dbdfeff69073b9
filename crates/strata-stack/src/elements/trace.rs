//! Request logging element.
//!
//! Emits structured logs around the request: entry at debug level when
//! the chain reaches the element, and the final outcome with timing from
//! the cleanup hooks. Because cleanup hooks run after the chain settles,
//! the element observes the true end-to-end duration.

use strata_core::{Outcome, RequestContext, StackError};

use crate::element::{BoxFuture, ChainResult, Next, StackElement};

/// Element that logs request entry and outcome.
///
/// Stack it outermost so its hooks run last and cover the whole chain.
pub struct TraceElement {
    service: String,
}

impl TraceElement {
    /// Creates a trace element labelled with the given service name.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl<T> StackElement<T> for TraceElement
where
    T: Send + 'static,
{
    fn name(&self) -> &'static str {
        "trace"
    }

    fn proceed<'a>(
        &'a self,
        ctx: RequestContext,
        next: Next<'a, T>,
    ) -> BoxFuture<'a, ChainResult<T>> {
        Box::pin(async move {
            tracing::debug!(
                service = %self.service,
                request_id = %ctx.request_id(),
                method = %ctx.request().method(),
                path = %ctx.request().uri().path(),
                remaining = next.remaining(),
                "request entered stack"
            );
            next.run(ctx).await
        })
    }

    fn on_success<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Outcome<()>> {
        Box::pin(async move {
            tracing::info!(
                service = %self.service,
                request_id = %ctx.request_id(),
                duration_ms = ctx.elapsed().as_secs_f64() * 1000.0,
                "request completed"
            );
            Ok(())
        })
    }

    fn on_failure<'a>(
        &'a self,
        ctx: &'a RequestContext,
        error: &'a StackError,
    ) -> BoxFuture<'a, Outcome<()>> {
        Box::pin(async move {
            tracing::warn!(
                service = %self.service,
                request_id = %ctx.request_id(),
                duration_ms = ctx.elapsed().as_secs_f64() * 1000.0,
                status = error.status_code().as_u16(),
                short_circuit = error.is_short_circuit(),
                %error,
                "request failed"
            );
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_trace_is_transparent() {
        let element = TraceElement::new("orders");
        let elements: Vec<Arc<dyn StackElement<u32>>> = Vec::new();
        let body = |_ctx: RequestContext| -> BoxFuture<'static, Outcome<u32>> {
            Box::pin(async { Ok(7) })
        };
        let next = Next::new(&elements, &body);

        let (ctx, outcome) =
            StackElement::<u32>::proceed(&element, RequestContext::mock(), next).await;
        assert_eq!(outcome.unwrap(), 7);
        assert!(ctx.attributes().is_empty(), "trace publishes nothing");
    }

    #[tokio::test]
    async fn test_hooks_never_fail() {
        let element = TraceElement::new("orders");
        let ctx = RequestContext::mock();
        let error = StackError::body("boom");

        assert!(StackElement::<u32>::on_success(&element, &ctx).await.is_ok());
        assert!(StackElement::<u32>::on_failure(&element, &ctx, &error)
            .await
            .is_ok());
    }
}
