//! Request and render contexts the resolver reads from.
//!
//! The resolver only needs two narrow capabilities from the request and one
//! from the render context, so both are traits. [`HttpRequestContext`] and
//! [`RenderView`] are the concrete implementations used by the axum
//! integration; tests and other hosts can supply their own.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::errors::IdentityError;
use crate::source::IdentityValue;

/// Variables assigned to a render context, keyed by name.
pub type ViewData = serde_json::Map<String, Value>;

/// Read access to the current request.
pub trait RequestContext {
    /// Parameter of the matched route.
    ///
    /// Returns `None` both when the key is missing and when no route matched.
    fn route_parameter(&self, key: &str) -> Option<IdentityValue>;

    /// Field submitted by the client (query string or body).
    fn input(&self, key: &str) -> Option<IdentityValue>;
}

/// Read access to the variables assigned for rendering.
pub trait RenderContext {
    /// Snapshot of the assigned variables.
    fn variables(&self) -> &ViewData;
}

impl RenderContext for ViewData {
    fn variables(&self) -> &ViewData {
        self
    }
}

/// Route matched for the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    /// Route pattern, e.g. `/items/{id}`.
    pub pattern: Option<String>,
    /// Path parameters captured by the pattern.
    pub params: BTreeMap<String, String>,
}

impl RouteMatch {
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            params: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Request context assembled from an HTTP request.
///
/// Input merges query and body fields; body fields win on conflicts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpRequestContext {
    route: Option<RouteMatch>,
    input: ViewData,
}

impl HttpRequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_route(mut self, route: RouteMatch) -> Self {
        self.route = Some(route);
        self
    }

    /// Merge an urlencoded query string into the input.
    ///
    /// A leading `?` is accepted. Repeated keys keep the last value. Query
    /// fields never replace fields already taken from a body.
    ///
    /// # Errors
    /// Returns [`IdentityError::InvalidQuery`] if a decoded key or value is
    /// not valid UTF-8.
    pub fn with_query(mut self, query: &str) -> Result<Self, IdentityError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = decode_urlencoded(query.as_bytes()).map_err(IdentityError::InvalidQuery)?;

        let mut fields = ViewData::new();
        for (key, value) in pairs {
            fields.insert(key, Value::String(value));
        }
        for (key, value) in fields {
            self.input.entry(key).or_insert(value);
        }
        Ok(self)
    }

    /// Merge a JSON object body into the input.
    ///
    /// # Errors
    /// Returns [`IdentityError::InvalidBody`] if the body is not a JSON object.
    pub fn with_json_body(mut self, body: Value) -> Result<Self, IdentityError> {
        let Value::Object(fields) = body else {
            return Err(IdentityError::InvalidBody(
                "JSON body must be an object".to_owned(),
            ));
        };
        self.input.extend(fields);
        Ok(self)
    }

    /// Merge an urlencoded form body into the input.
    ///
    /// # Errors
    /// Returns [`IdentityError::InvalidBody`] if a decoded key or value is
    /// not valid UTF-8.
    pub fn with_form_body(mut self, body: &[u8]) -> Result<Self, IdentityError> {
        let pairs = decode_urlencoded(body).map_err(IdentityError::InvalidBody)?;
        for (key, value) in pairs {
            self.input.insert(key, Value::String(value));
        }
        Ok(self)
    }

    #[must_use]
    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.input.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn route(&self) -> Option<&RouteMatch> {
        self.route.as_ref()
    }

    #[must_use]
    pub fn input_fields(&self) -> &ViewData {
        &self.input
    }
}

/// Strict `application/x-www-form-urlencoded` decoding.
///
/// Empty pairs are skipped and a pair without `=` has an empty value. Unlike
/// lossy decoders, invalid UTF-8 is an error instead of U+FFFD.
fn decode_urlencoded(input: &[u8]) -> Result<Vec<(String, String)>, String> {
    let mut pairs = Vec::new();
    for pair in input.split(|&b| b == b'&') {
        if pair.is_empty() {
            continue;
        }
        let mut parts = pair.splitn(2, |&b| b == b'=');
        let key = decode_component(parts.next().unwrap_or_default())?;
        let value = decode_component(parts.next().unwrap_or_default())?;
        pairs.push((key, value));
    }
    Ok(pairs)
}

fn decode_component(raw: &[u8]) -> Result<String, String> {
    let spaced: Vec<u8> = raw
        .iter()
        .map(|&b| if b == b'+' { b' ' } else { b })
        .collect();
    let decoded = urlencoding::decode_binary(&spaced);
    String::from_utf8(decoded.into_owned())
        .map_err(|e| format!("invalid UTF-8 in urlencoded data: {e}"))
}

impl RequestContext for HttpRequestContext {
    fn route_parameter(&self, key: &str) -> Option<IdentityValue> {
        self.route
            .as_ref()?
            .param(key)
            .map(|v| Value::String(v.to_owned()))
    }

    fn input(&self, key: &str) -> Option<IdentityValue> {
        self.input.get(key).cloned()
    }
}

/// Named view with the variables handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderView {
    name: String,
    data: ViewData,
}

impl RenderView {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: ViewData::new(),
        }
    }

    /// Assign a variable.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl RenderContext for RenderView {
    fn variables(&self) -> &ViewData {
        &self.data
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn route_parameter_is_absent_without_route() {
        let ctx = HttpRequestContext::new().with_input("id", "from-input");

        assert_eq!(ctx.route_parameter("id"), None);
        assert_eq!(ctx.input("id"), Some(json!("from-input")));
    }

    #[test]
    fn route_parameter_reads_matched_params() {
        let ctx = HttpRequestContext::new()
            .with_route(RouteMatch::new("/items/{id}").with_param("id", "42"));

        assert_eq!(ctx.route_parameter("id"), Some(json!("42")));
        assert_eq!(ctx.route_parameter("other"), None);
        assert_eq!(ctx.route().and_then(|r| r.pattern.as_deref()), Some("/items/{id}"));
    }

    #[test]
    fn query_is_decoded_and_last_value_wins() {
        let ctx = HttpRequestContext::new()
            .with_query("?id=1&name=a%20b&id=2")
            .unwrap();

        assert_eq!(ctx.input("id"), Some(json!("2")));
        assert_eq!(ctx.input("name"), Some(json!("a b")));
    }

    #[test]
    fn empty_query_yields_no_input() {
        let ctx = HttpRequestContext::new().with_query("").unwrap();
        assert!(ctx.input_fields().is_empty());
    }

    #[test]
    fn body_fields_override_query_fields() {
        let ctx = HttpRequestContext::new()
            .with_json_body(json!({ "id": 10, "kind": "json" }))
            .unwrap()
            .with_query("id=query&page=3")
            .unwrap();

        assert_eq!(ctx.input("id"), Some(json!(10)));
        assert_eq!(ctx.input("kind"), Some(json!("json")));
        assert_eq!(ctx.input("page"), Some(json!("3")));

        let ctx = HttpRequestContext::new()
            .with_query("id=query")
            .unwrap()
            .with_form_body(b"id=form")
            .unwrap();
        assert_eq!(ctx.input("id"), Some(json!("form")));
    }

    #[test]
    fn invalid_utf8_in_query_is_rejected() {
        let err = HttpRequestContext::new().with_query("id=%FF").unwrap_err();
        assert!(matches!(err, IdentityError::InvalidQuery(_)));

        let err = HttpRequestContext::new().with_query("id=%FF%FE").unwrap_err();
        assert!(matches!(err, IdentityError::InvalidQuery(_)));

        let err = HttpRequestContext::new().with_query("%C3=1").unwrap_err();
        assert!(matches!(err, IdentityError::InvalidQuery(_)));
    }

    #[test]
    fn invalid_utf8_in_form_body_is_rejected() {
        let err = HttpRequestContext::new()
            .with_form_body(&[0xff, b'=', 0xfe])
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidBody(_)));

        let err = HttpRequestContext::new()
            .with_form_body(b"id=%FF")
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidBody(_)));
    }

    #[test]
    fn lenient_query_shapes_are_accepted() {
        let ctx = HttpRequestContext::new()
            .with_query("&&id=a=b&flag&name=%C3%A9+x&bad=%ZZ")
            .unwrap();

        assert_eq!(ctx.input("id"), Some(json!("a=b")));
        assert_eq!(ctx.input("flag"), Some(json!("")));
        assert_eq!(ctx.input("name"), Some(json!("\u{e9} x")));
        assert!(ctx.input("bad").is_some());
    }

    #[test]
    fn encoded_plus_is_not_a_space() {
        let ctx = HttpRequestContext::new().with_query("id=a%2Bb").unwrap();
        assert_eq!(ctx.input("id"), Some(json!("a+b")));
    }

    #[test]
    fn non_object_json_body_is_rejected() {
        let err = HttpRequestContext::new()
            .with_json_body(json!([1, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidBody(_)));
    }

    #[test]
    fn render_view_exposes_assigned_variables() {
        let view = RenderView::new("items.show").with("id", 5).with("title", "x");

        assert_eq!(view.name(), "items.show");
        assert_eq!(view.variables().get("id"), Some(&json!(5)));
        assert_eq!(view.variables().len(), 2);
    }

    #[test]
    fn plain_view_data_is_a_render_context() {
        let mut data = ViewData::new();
        data.insert("id".to_owned(), json!("abc"));

        let ctx: &dyn RenderContext = &data;
        assert_eq!(ctx.variables().get("id"), Some(&json!("abc")));
    }
}
