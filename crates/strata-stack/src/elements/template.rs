//! Response-template selection element.
//!
//! Resolves which template the body should render with, as a pure
//! function of the incoming request (typically its headers), and
//! publishes the choice under [`TemplateElement::template_key`].
//!
//! Rendering itself is out of scope; a [`Template`] is just the selected
//! name handed to whatever view layer the host framework uses.

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use strata_core::{AttributeKey, Request, RequestContext};

use crate::element::{BoxFuture, ChainResult, Next, StackElement};

/// A selected template, identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template(String);

impl Template {
    /// Creates a template with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Template {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Chooses a template for a request.
///
/// Selection must be a pure function of the request; it runs on every
/// request against a shared selector instance.
pub trait TemplateSelector: Send + Sync {
    /// Returns the template the body should render with.
    fn select(&self, request: &Request) -> Template;
}

/// Element that publishes the selected template for the body.
pub struct TemplateElement {
    selector: Arc<dyn TemplateSelector>,
}

impl TemplateElement {
    /// Creates a template element backed by `selector`.
    #[must_use]
    pub fn new(selector: Arc<dyn TemplateSelector>) -> Self {
        Self { selector }
    }

    /// The bag key under which the selected template is published.
    #[must_use]
    pub fn template_key() -> &'static AttributeKey<Template> {
        static KEY: OnceLock<AttributeKey<Template>> = OnceLock::new();
        KEY.get_or_init(|| AttributeKey::new("view.template"))
    }
}

impl<T> StackElement<T> for TemplateElement
where
    T: Send + 'static,
{
    fn name(&self) -> &'static str {
        "template"
    }

    fn proceed<'a>(
        &'a self,
        ctx: RequestContext,
        next: Next<'a, T>,
    ) -> BoxFuture<'a, ChainResult<T>> {
        Box::pin(async move {
            let template = self.selector.select(ctx.request());
            let ctx = ctx.with_attribute(Self::template_key(), template);
            next.run(ctx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Full;
    use strata_core::Outcome;

    /// Selects "mobile" when the client hints a mobile user agent.
    struct UserAgentSelector;

    impl TemplateSelector for UserAgentSelector {
        fn select(&self, request: &Request) -> Template {
            let mobile = request
                .headers()
                .get(http::header::USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .is_some_and(|agent| agent.contains("Mobile"));

            if mobile {
                Template::new("orders/show.mobile")
            } else {
                Template::new("orders/show")
            }
        }
    }

    fn request_with_agent(agent: &str) -> Request {
        http::Request::builder()
            .uri("/orders/1")
            .header(http::header::USER_AGENT, agent)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn selected_template(request: Request) -> Template {
        let element = TemplateElement::new(Arc::new(UserAgentSelector));
        let elements: Vec<Arc<dyn StackElement<u32>>> = Vec::new();
        let body = |_ctx: RequestContext| -> BoxFuture<'static, Outcome<u32>> {
            Box::pin(async { Ok(0) })
        };
        let next = Next::new(&elements, &body);

        let (ctx, outcome) =
            StackElement::<u32>::proceed(&element, RequestContext::new(request), next).await;
        outcome.unwrap();
        ctx.get(TemplateElement::template_key()).unwrap().clone()
    }

    #[tokio::test]
    async fn test_selects_by_user_agent() {
        let desktop = selected_template(request_with_agent("Mozilla/5.0")).await;
        assert_eq!(desktop.name(), "orders/show");

        let mobile = selected_template(request_with_agent("Mozilla/5.0 Mobile Safari")).await;
        assert_eq!(mobile.name(), "orders/show.mobile");
    }

    #[test]
    fn test_template_from_str() {
        let template: Template = "users/index".into();
        assert_eq!(template.name(), "users/index");
    }
}
