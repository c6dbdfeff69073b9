//! Ordered element chains.
//!
//! An [`ElementChain`] is the explicit, immutable stacking order for one
//! controller composition: elements are listed outermost to innermost,
//! and executing the chain runs each element's `proceed` in that order,
//! terminating in the business-logic body.
//!
//! The order is supplied by the caller at construction time and is
//! authoritative; there is no implicit ordering. Chains are built once
//! (typically at controller construction) and shared across requests.

use std::sync::Arc;

use strata_core::RequestContext;

use crate::element::{BodyFn, ChainResult, Next, StackElement};

/// An immutable ordered sequence of elements, outermost first.
///
/// # Example
///
/// ```ignore
/// use strata_stack::ElementChain;
///
/// let chain = ElementChain::builder()
///     .stack(TraceElement::new("orders"))
///     .stack(TransactionElement::new(provider))
///     .stack(AuthorizeElement::new(authorizer))
///     .build();
/// ```
pub struct ElementChain<T>
where
    T: Send + 'static,
{
    elements: Vec<Arc<dyn StackElement<T>>>,
}

impl<T> ElementChain<T>
where
    T: Send + 'static,
{
    /// Creates a new chain builder.
    #[must_use]
    pub fn builder() -> ElementChainBuilder<T> {
        ElementChainBuilder::new()
    }

    /// Creates a chain with no elements.
    ///
    /// Executing an empty chain runs the body directly with the seeded
    /// attributes only.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// Executes the chain with `ctx`, terminating in `body`.
    ///
    /// Elements run outermost-first; the returned [`ChainResult`] carries
    /// the deepest context observed together with the outcome.
    pub async fn execute(&self, ctx: RequestContext, body: &BodyFn<T>) -> ChainResult<T> {
        Next::new(&self.elements, body).run(ctx).await
    }

    /// Returns the names of all elements in stacking order.
    #[must_use]
    pub fn element_names(&self) -> Vec<&'static str> {
        self.elements.iter().map(|element| element.name()).collect()
    }

    /// Returns the number of elements in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the chain has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The elements in stacking order, for the cleanup pass.
    pub(crate) fn elements(&self) -> &[Arc<dyn StackElement<T>>] {
        &self.elements
    }
}

impl<T> Clone for ElementChain<T>
where
    T: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            elements: self.elements.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ElementChain<T>
where
    T: Send + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementChain")
            .field("elements", &self.element_names())
            .finish()
    }
}

/// Builder for constructing an [`ElementChain`].
///
/// Elements are stacked outermost to innermost; the call order *is* the
/// stacking order.
pub struct ElementChainBuilder<T>
where
    T: Send + 'static,
{
    elements: Vec<Arc<dyn StackElement<T>>>,
}

impl<T> ElementChainBuilder<T>
where
    T: Send + 'static,
{
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// Stacks an element inward of everything stacked so far.
    #[must_use]
    pub fn stack<E: StackElement<T>>(mut self, element: E) -> Self {
        self.elements.push(Arc::new(element));
        self
    }

    /// Stacks an already-shared element instance.
    ///
    /// Use this to reuse one element instance across several chains.
    #[must_use]
    pub fn stack_shared(mut self, element: Arc<dyn StackElement<T>>) -> Self {
        self.elements.push(element);
        self
    }

    /// Builds the chain.
    ///
    /// The resulting order is fixed; build a new chain to compose
    /// differently.
    #[must_use]
    pub fn build(self) -> ElementChain<T> {
        ElementChain {
            elements: self.elements,
        }
    }
}

impl<T> Default for ElementChainBuilder<T>
where
    T: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
