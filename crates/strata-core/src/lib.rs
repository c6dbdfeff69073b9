//! # Strata Core
//!
//! Core types for the Strata stackable request-composition library.
//!
//! This crate provides the foundational types used throughout Strata:
//!
//! - [`AttributeKey`] / [`AttributeBag`] - Typed, identity-keyed per-request storage
//! - [`RequestContext`] - Per-request context pairing the raw request with its attributes
//! - [`RequestId`] - UUID v7 request identifier
//! - [`StackError`] / [`Outcome`] - Standard error taxonomy and result type

#![doc(html_root_url = "https://docs.rs/strata-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod attrs;
mod context;
mod error;

pub use attrs::{AttributeBag, AttributeKey};
pub use context::{Request, RequestContext, RequestId};
pub use error::{ErrorCategory, Outcome, StackError};
