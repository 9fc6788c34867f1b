use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

/// Caller identity forwarded to upstream services
///
/// Session validation happens upstream; this layer only carries the headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub authorization: Option<String>,
    pub cookie: Option<String>,
}

impl RequestContext {
    /// Fixed identity used by background jobs that act on behalf of no user
    pub fn synthetic() -> Self {
        Self {
            authorization: Some("Bearer keep-alive".to_string()),
            cookie: Some("ukama_session=keep-alive".to_string()),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string)
        };

        Self {
            authorization: read(header::AUTHORIZATION),
            cookie: read(header::COOKIE),
        }
    }

    /// Attach the carried headers to an outgoing upstream request
    pub fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut builder = builder;
        if let Some(auth) = &self.authorization {
            builder = builder.header(reqwest::header::AUTHORIZATION, auth);
        }
        if let Some(cookie) = &self.cookie {
            builder = builder.header(reqwest::header::COOKIE, cookie);
        }
        builder
    }
}

pub async fn request_context_middleware(mut req: Request, next: Next) -> Response {
    let ctx = RequestContext::from_headers(req.headers());

    if ctx.authorization.is_none() && ctx.cookie.is_none() {
        tracing::debug!("No identity headers on {} {}", req.method(), req.uri());
    }

    req.extensions_mut().insert(ctx);
    next.run(req).await
}
