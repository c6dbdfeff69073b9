//! The stack-action entry point.
//!
//! [`StackAction`] is the outward-facing operation a controller invokes:
//! it executes the composed element chain around the business-logic body
//! and guarantees that cleanup hooks run exactly once per element, in
//! reverse stacking order, regardless of how the chain settled.
//!
//! Cleanup is driven here, from the top, rather than from within each
//! element's `proceed`. That single point of control is what makes the
//! exactly-once guarantee hold even when an element retries the inward
//! call or short-circuits without delegating.
//!
//! # Request lifecycle
//!
//! ```text
//! Created → Running → {Succeeded | Failed} → CleanupRunning → Completed
//! ```
//!
//! No path skips `CleanupRunning`; every transition is traced at debug
//! level.

use strata_core::{AttributeBag, Outcome, Request, RequestContext, StackError};

use crate::chain::ElementChain;
use crate::element::{BodyFn, BoxFuture};

/// Named phases of one request's passage through a stack action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPhase {
    /// The seeded context has been constructed.
    Created,
    /// The element chain is executing.
    Running,
    /// The chain produced a successful outcome.
    Succeeded,
    /// The chain failed or short-circuited.
    Failed,
    /// Cleanup hooks are running.
    CleanupRunning,
    /// The request is finished; the outcome is final.
    Completed,
}

impl ActionPhase {
    /// Returns the phase name used in structured logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::CleanupRunning => "cleanup_running",
            Self::Completed => "completed",
        }
    }
}

/// Which cleanup hook a failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupPhase {
    /// The `on_success` pass.
    Success,
    /// The `on_failure` pass.
    Failure,
}

impl CleanupPhase {
    /// Returns the hook name used in structured logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Success => "on_success",
            Self::Failure => "on_failure",
        }
    }
}

/// A cleanup hook failure, recorded without disturbing the request
/// outcome.
#[derive(Debug)]
pub struct CleanupFailure {
    /// The element whose hook failed.
    pub element: &'static str,
    /// Which hook failed.
    pub phase: CleanupPhase,
    /// The error the hook produced.
    pub error: StackError,
}

/// Aggregated cleanup-hook failures for one request.
///
/// A hook failure never prevents outer elements' hooks from running and
/// never replaces the request outcome; it is logged and recorded here.
#[derive(Debug, Default)]
pub struct CleanupReport {
    failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    /// Returns `true` if every cleanup hook completed without error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the recorded failures, in the order the hooks ran.
    #[must_use]
    pub fn failures(&self) -> &[CleanupFailure] {
        &self.failures
    }

    /// Returns the number of recorded failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns `true` if no failures were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, element: &'static str, phase: CleanupPhase, error: StackError) {
        self.failures.push(CleanupFailure {
            element,
            phase,
            error,
        });
    }
}

/// The outward-facing entry point for one controller composition.
///
/// A `StackAction` owns the chain and is shared across all requests the
/// composition handles; per-request state lives exclusively in each
/// request's context.
///
/// # Example
///
/// ```ignore
/// let action = StackAction::new(
///     ElementChain::builder()
///         .stack(TransactionElement::new(provider))
///         .stack(AuthorizeElement::new(authorizer))
///         .build(),
/// );
///
/// let seeds = AttributeBag::new()
///     .set(AuthorizeElement::required_authority_key(), Authority::new(1));
///
/// let outcome = action.run(request, seeds, show_order_body).await;
/// ```
pub struct StackAction<T>
where
    T: Send + 'static,
{
    chain: ElementChain<T>,
}

impl<T> StackAction<T>
where
    T: Send + 'static,
{
    /// Creates an action around the given chain.
    #[must_use]
    pub fn new(chain: ElementChain<T>) -> Self {
        Self { chain }
    }

    /// Returns the composed chain.
    #[must_use]
    pub fn chain(&self) -> &ElementChain<T> {
        &self.chain
    }

    /// Executes the chain around `body` and returns its outcome.
    ///
    /// Cleanup-hook failures are logged; use
    /// [`StackAction::run_with_report`] to inspect them.
    pub async fn run<B>(&self, request: Request, seeds: AttributeBag, body: B) -> Outcome<T>
    where
        B: Fn(RequestContext) -> BoxFuture<'static, Outcome<T>> + Send + Sync + 'static,
    {
        self.run_with_report(request, seeds, body).await.0
    }

    /// Executes the chain around `body`, returning the outcome together
    /// with the cleanup report.
    ///
    /// The outcome is exactly what the chain produced: a failure is never
    /// converted into a success, a short-circuit is surfaced unchanged,
    /// and cleanup failures never replace it.
    pub async fn run_with_report<B>(
        &self,
        request: Request,
        seeds: AttributeBag,
        body: B,
    ) -> (Outcome<T>, CleanupReport)
    where
        B: Fn(RequestContext) -> BoxFuture<'static, Outcome<T>> + Send + Sync + 'static,
    {
        let ctx = RequestContext::seeded(request, seeds);
        let request_id = ctx.request_id();
        tracing::debug!(
            %request_id,
            phase = ActionPhase::Created.name(),
            elements = self.chain.len(),
            "stack action created"
        );

        tracing::debug!(%request_id, phase = ActionPhase::Running.name(), "executing chain");
        let body_ref: &BodyFn<T> = &body;
        let (ctx, outcome) = self.chain.execute(ctx, body_ref).await;

        let settled = if outcome.is_ok() {
            ActionPhase::Succeeded
        } else {
            ActionPhase::Failed
        };
        tracing::debug!(%request_id, phase = settled.name(), "chain settled");

        tracing::debug!(
            %request_id,
            phase = ActionPhase::CleanupRunning.name(),
            "running cleanup hooks"
        );
        let report = match &outcome {
            Ok(_) => self.run_success_cleanup(&ctx).await,
            Err(error) => self.run_failure_cleanup(&ctx, error).await,
        };

        tracing::debug!(
            %request_id,
            phase = ActionPhase::Completed.name(),
            duration_ms = ctx.elapsed().as_secs_f64() * 1000.0,
            clean = report.is_clean(),
            "stack action completed"
        );
        (outcome, report)
    }

    /// Runs every element's `on_success`, innermost first.
    async fn run_success_cleanup(&self, ctx: &RequestContext) -> CleanupReport {
        let mut report = CleanupReport::default();
        for element in self.chain.elements().iter().rev() {
            if let Err(error) = element.on_success(ctx).await {
                tracing::warn!(
                    element = element.name(),
                    hook = CleanupPhase::Success.name(),
                    %error,
                    "cleanup hook failed"
                );
                report.record(element.name(), CleanupPhase::Success, error);
            }
        }
        report
    }

    /// Runs every element's `on_failure`, innermost first.
    async fn run_failure_cleanup(&self, ctx: &RequestContext, cause: &StackError) -> CleanupReport {
        let mut report = CleanupReport::default();
        for element in self.chain.elements().iter().rev() {
            if let Err(error) = element.on_failure(ctx, cause).await {
                tracing::warn!(
                    element = element.name(),
                    hook = CleanupPhase::Failure.name(),
                    %error,
                    "cleanup hook failed"
                );
                report.record(element.name(), CleanupPhase::Failure, error);
            }
        }
        report
    }
}

impl<T> Clone for StackAction<T>
where
    T: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            chain: self.chain.clone(),
        }
    }
}
