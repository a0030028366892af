//! Axum extractors for identity resolution

use axum::{
    body::to_bytes,
    extract::{
        FromRequest, FromRequestParts, MatchedPath, RawPathParams, Request,
        rejection::RawPathParamsRejection,
    },
    http::{header::CONTENT_TYPE, request::Parts},
};
use http_body_util::LengthLimitError;

use crate::{
    config::IdentityResolverConfig,
    context::{HttpRequestContext, RouteMatch},
    errors::IdentityError,
    resolver::IdentityResolver,
    source::ResolvedIdentity,
};

/// Maximum body size read by [`FullRequestContext`].
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

impl<S> FromRequestParts<S> for HttpRequestContext
where
    S: Send + Sync,
{
    type Rejection = IdentityError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let mut ctx = HttpRequestContext::new();

        if let Some(route) = route_match(parts, state).await? {
            ctx = ctx.with_route(route);
        }
        if let Some(query) = parts.uri.query() {
            ctx = ctx.with_query(query)?;
        }
        Ok(ctx)
    }
}

async fn route_match<S>(parts: &mut Parts, state: &S) -> Result<Option<RouteMatch>, IdentityError>
where
    S: Send + Sync,
{
    let params = match RawPathParams::from_request_parts(parts, state).await {
        Ok(params) => params,
        Err(RawPathParamsRejection::MissingPathParams(_)) => {
            tracing::debug!("no route parameters for request, route source will be empty");
            return Ok(None);
        }
        Err(err) => return Err(IdentityError::InvalidPathParams(err.body_text())),
    };

    let mut route = RouteMatch {
        pattern: parts
            .extensions
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_owned()),
        ..RouteMatch::default()
    };
    for (key, value) in &params {
        route.params.insert(key.to_owned(), value.to_owned());
    }
    Ok(Some(route))
}

/// Request context including JSON or urlencoded form body fields.
///
/// Other content types contribute no input. Body fields override query
/// fields with the same name.
#[derive(Debug, Clone)]
pub struct FullRequestContext(pub HttpRequestContext);

impl<S> FromRequest<S> for FullRequestContext
where
    S: Send + Sync,
{
    type Rejection = IdentityError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let ctx = HttpRequestContext::from_request_parts(&mut parts, state).await?;

        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or_default().trim().to_ascii_lowercase());
        let Some(content_type) = content_type else {
            return Ok(Self(ctx));
        };

        let is_json = content_type == "application/json" || content_type.ends_with("+json");
        let is_form = content_type == "application/x-www-form-urlencoded";
        if !is_json && !is_form {
            tracing::debug!(content_type = %content_type, "ignoring request body for identity input");
            return Ok(Self(ctx));
        }

        let bytes = to_bytes(body, DEFAULT_BODY_LIMIT)
            .await
            .map_err(body_read_error)?;
        if bytes.is_empty() {
            return Ok(Self(ctx));
        }

        let ctx = if is_json {
            let value: serde_json::Value = serde_json::from_slice(&bytes)
                .map_err(|e| IdentityError::InvalidBody(e.to_string()))?;
            ctx.with_json_body(value)?
        } else {
            ctx.with_form_body(&bytes)?
        };
        Ok(Self(ctx))
    }
}

fn body_read_error(err: axum::Error) -> IdentityError {
    let inner = err.into_inner();
    if inner.is::<LengthLimitError>() {
        return IdentityError::BodyTooLarge {
            limit: DEFAULT_BODY_LIMIT,
        };
    }
    IdentityError::BodyRead(inner.to_string())
}

/// Identity resolved from route parameters and query string.
///
/// Uses the [`IdentityResolverConfig`] stored in request extensions (for
/// example via `Extension(config)`), or the default configuration. No render
/// context exists at extraction time, so view variables never contribute.
#[derive(Debug, Clone)]
pub struct RequestIdentity(pub Option<ResolvedIdentity>);

impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = IdentityError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = HttpRequestContext::from_request_parts(parts, state).await?;
        let config = parts
            .extensions
            .get::<IdentityResolverConfig>()
            .cloned()
            .unwrap_or_default();

        let resolver = IdentityResolver::with_config(&ctx, None, config);
        Ok(Self(resolver.resolve()))
    }
}

// Note: extractor tests live in tests/axum_integration.rs, they need a routed request.
