//! # Strata Stack
//!
//! The composition mechanism of the Strata library: ordered element
//! chains around a business-logic body, with symmetric, exactly-once
//! cleanup.
//!
//! Independently authored behaviors (transaction management,
//! authorization, template selection, async enrichment) implement one
//! trait, [`StackElement`], and are mixed onto a controller in any
//! combination by listing them in an [`ElementChain`]. Without this, each
//! combination of concerns needs its own hand-written wrapper; with it,
//! composition is a list.
//!
//! ## Request flow
//!
//! ```text
//! Request ──▶ E1.proceed ──▶ E2.proceed ──▶ … ──▶ En.proceed ──▶ body
//!                                                                 │
//! Outcome ◀── E1.hook ◀───── E2.hook ◀───── … ◀── En.hook ◀───────┘
//! ```
//!
//! Pre-processing runs outermost-first; after the chain settles, exactly
//! one of each element's cleanup hooks (`on_success` / `on_failure`) runs
//! in the exact reverse order, driven once by the [`StackAction`] entry
//! point.
//!
//! ## Key properties
//!
//! - **Explicit order**: the stacking order is the list passed to the
//!   chain builder; nothing is implicit.
//! - **Exactly-once cleanup**: per element per request, regardless of
//!   short-circuits or retried inward calls.
//! - **Causal attribute visibility**: an element observes exactly the
//!   attributes published by elements stacked before it, through the
//!   copy-on-write bag in [`strata_core`].
//! - **Stateless elements**: one element instance serves all concurrent
//!   requests; per-request state lives in the context.
//!
//! ## Example
//!
//! ```ignore
//! use strata_stack::{ElementChain, StackAction};
//! use strata_stack::elements::{Authority, AuthorizeElement, TransactionElement};
//! use strata_core::AttributeBag;
//!
//! let action = StackAction::new(
//!     ElementChain::builder()
//!         .stack(TransactionElement::new(provider))
//!         .stack(AuthorizeElement::new(authorizer))
//!         .build(),
//! );
//!
//! let seeds = AttributeBag::new()
//!     .set(AuthorizeElement::required_authority_key(), Authority::new(1));
//!
//! let outcome = action.run(request, seeds, show_order).await;
//! ```

#![doc(html_root_url = "https://docs.rs/strata-stack/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod action;
pub mod chain;
pub mod element;
pub mod elements;

// Re-export main types at crate root
pub use action::{ActionPhase, CleanupFailure, CleanupPhase, CleanupReport, StackAction};
pub use chain::{ElementChain, ElementChainBuilder};
pub use element::{BodyFn, BoxFuture, ChainResult, FnElement, Next, StackElement};
