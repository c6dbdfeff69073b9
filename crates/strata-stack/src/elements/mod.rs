//! Standard element library.
//!
//! Ready-made elements for the common cross-cutting concerns a controller
//! stacks around its business logic. Each element names its external
//! collaborator as a narrow trait ([`SessionProvider`], [`Authorizer`],
//! [`TemplateSelector`], [`Enricher`]); concrete implementations belong
//! to the host application.

pub mod authorize;
pub mod enrich;
pub mod template;
pub mod trace;
pub mod transaction;

pub use authorize::{Authority, AuthorizeElement, Authorizer, AuthzDecision, Principal};
pub use enrich::{EnrichElement, EnrichFailurePolicy, Enricher};
pub use template::{Template, TemplateElement, TemplateSelector};
pub use trace::TraceElement;
pub use transaction::{Session, SessionHandle, SessionProvider, TransactionElement};
