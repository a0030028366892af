//! Identity sources and resolution results.

use serde::Serialize;

/// Value carried by an identity source.
///
/// `Value::Null` is never treated as a present identity.
pub type IdentityValue = serde_json::Value;

/// Place an identity value can be found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    /// Parameter of the matched route pattern.
    RouteParameter,
    /// Query string or body field submitted by the client.
    Input,
    /// Variable assigned to the render context.
    ViewVariable,
}

impl IdentitySource {
    /// Lookup order used by the resolver. Not configurable.
    pub const PRIORITY: [Self; 3] = [Self::RouteParameter, Self::Input, Self::ViewVariable];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RouteParameter => "route_parameter",
            Self::Input => "input",
            Self::ViewVariable => "view_variable",
        }
    }
}

impl std::fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity value together with the source that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedIdentity {
    pub source: IdentitySource,
    pub value: IdentityValue,
}

impl ResolvedIdentity {
    #[must_use]
    pub fn into_value(self) -> IdentityValue {
        self.value
    }

    /// String form of the value, if it is a JSON string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }
}
