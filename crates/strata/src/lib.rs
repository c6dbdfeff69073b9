//! # Strata
//!
//! **Stackable request-composition for web controllers**
//!
//! Strata lets independently authored behaviors (transaction management,
//! authorization, template selection, async enrichment) be mixed onto a
//! controller in arbitrary combination, each contributing pre-processing,
//! short-circuiting, and cleanup around the shared request:
//!
//! - 🧱 **Explicit stacking** – composition is an ordered list, not a
//!   wrapper per combination of concerns
//! - 🔁 **Symmetric cleanup** – success/failure hooks run exactly once per
//!   element, in reverse stacking order
//! - 🧳 **Typed attributes** – elements communicate through an
//!   identity-keyed, copy-on-write per-request bag
//! - ⚡ **Async throughout** – elements may await external work without
//!   blocking a shared worker
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strata::prelude::*;
//!
//! let action = StackAction::new(
//!     ElementChain::builder()
//!         .stack(TraceElement::new("orders"))
//!         .stack(TransactionElement::new(sessions))
//!         .stack(AuthorizeElement::new(authorizer))
//!         .build(),
//! );
//!
//! let seeds = AttributeBag::new()
//!     .set(AuthorizeElement::required_authority_key(), Authority::new(1));
//!
//! let outcome = action.run(request, seeds, show_order).await;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request ──▶ E1.proceed ──▶ E2.proceed ──▶ … ──▶ body
//!                                                  │
//! Outcome ◀── E1.hook ◀───── E2.hook ◀──── … ◀─────┘
//! ```

#![doc(html_root_url = "https://docs.rs/strata/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use strata_core as core;

// Re-export stack types
pub use strata_stack as stack;

/// Commonly used types, importable in one line.
pub mod prelude {
    pub use strata_core::{
        AttributeBag, AttributeKey, Outcome, Request, RequestContext, RequestId, StackError,
    };
    pub use strata_stack::elements::{
        Authority, AuthorizeElement, Authorizer, AuthzDecision, EnrichElement,
        EnrichFailurePolicy, Enricher, Principal, Session, SessionHandle, SessionProvider,
        Template, TemplateElement, TemplateSelector, TraceElement, TransactionElement,
    };
    pub use strata_stack::{
        ActionPhase, BoxFuture, ChainResult, CleanupReport, ElementChain, FnElement, Next,
        StackAction, StackElement,
    };
}
