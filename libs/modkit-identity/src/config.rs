//! Configuration for identity resolution.

use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::errors::IdentityError;

/// Which sources are consulted and under which name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityResolverConfig {
    /// Name looked up in every enabled source.
    pub identifier: String,

    /// Consult route parameters.
    pub route_parameter: bool,

    /// Consult query string and body fields.
    pub input: bool,

    /// Consult variables assigned to the render context.
    pub view_variable: bool,
}

impl Default for IdentityResolverConfig {
    fn default() -> Self {
        Self {
            identifier: "id".to_owned(),
            route_parameter: true,
            input: false,
            view_variable: true,
        }
    }
}

impl IdentityResolverConfig {
    /// Extract the configuration from the root of a figment.
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// # Errors
    /// Returns [`IdentityError::Config`] on unknown fields or type mismatches.
    pub fn from_figment(figment: &Figment) -> Result<Self, IdentityError> {
        Ok(figment.extract()?)
    }

    /// Extract the configuration from a nested section, e.g.
    /// `modules.items.identity`. A missing section yields the defaults.
    ///
    /// # Errors
    /// Returns [`IdentityError::Config`] on unknown fields or type mismatches.
    pub fn from_figment_section(figment: &Figment, section: &str) -> Result<Self, IdentityError> {
        if !figment.contains(section) {
            tracing::debug!(section, "identity config section missing, using defaults");
            return Ok(Self::default());
        }
        Ok(figment.extract_inner(section)?)
    }
}
