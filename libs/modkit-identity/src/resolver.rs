use crate::config::IdentityResolverConfig;
use crate::context::{RenderContext, RequestContext};
use crate::source::{IdentitySource, IdentityValue, ResolvedIdentity};

/// Resolves the identity of the resource a request operates on.
///
/// Sources are consulted in [`IdentitySource::PRIORITY`] order and the first
/// enabled source holding a non-null value wins; later sources are not
/// queried. Built per request and dropped with it.
pub struct IdentityResolver<'a> {
    request: &'a dyn RequestContext,
    view: Option<&'a dyn RenderContext>,
    config: IdentityResolverConfig,
}

impl<'a> IdentityResolver<'a> {
    /// Create a resolver with the default configuration: identifier `id`,
    /// route parameters and view variables enabled, input disabled.
    #[must_use]
    pub fn new(request: &'a dyn RequestContext, view: Option<&'a dyn RenderContext>) -> Self {
        Self::with_config(request, view, IdentityResolverConfig::default())
    }

    #[must_use]
    pub fn with_config(
        request: &'a dyn RequestContext,
        view: Option<&'a dyn RenderContext>,
        config: IdentityResolverConfig,
    ) -> Self {
        Self {
            request,
            view,
            config,
        }
    }

    pub fn enable_route_parameter(&mut self) -> &mut Self {
        self.config.route_parameter = true;
        self
    }

    pub fn disable_route_parameter(&mut self) -> &mut Self {
        self.config.route_parameter = false;
        self
    }

    pub fn enable_input(&mut self) -> &mut Self {
        self.config.input = true;
        self
    }

    pub fn disable_input(&mut self) -> &mut Self {
        self.config.input = false;
        self
    }

    pub fn enable_view_variable(&mut self) -> &mut Self {
        self.config.view_variable = true;
        self
    }

    pub fn disable_view_variable(&mut self) -> &mut Self {
        self.config.view_variable = false;
        self
    }

    /// Set the name looked up in all three sources. Empty names are looked
    /// up as is.
    pub fn set_identifier(&mut self, identifier: impl Into<String>) -> &mut Self {
        self.config.identifier = identifier.into();
        self
    }

    /// Replace flags and identifier at once.
    pub fn apply_config(&mut self, config: &IdentityResolverConfig) -> &mut Self {
        self.config.clone_from(config);
        self
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.config.identifier
    }

    #[must_use]
    pub fn config(&self) -> &IdentityResolverConfig {
        &self.config
    }

    #[must_use]
    pub fn is_enabled(&self, source: IdentitySource) -> bool {
        match source {
            IdentitySource::RouteParameter => self.config.route_parameter,
            IdentitySource::Input => self.config.input,
            IdentitySource::ViewVariable => self.config.view_variable,
        }
    }

    /// Identity value of the first enabled source holding one.
    #[must_use]
    pub fn resolve_identity(&self) -> Option<IdentityValue> {
        self.resolve().map(ResolvedIdentity::into_value)
    }

    /// Like [`Self::resolve_identity`], but also reports the winning source.
    #[must_use]
    pub fn resolve(&self) -> Option<ResolvedIdentity> {
        let resolved = IdentitySource::PRIORITY.into_iter().find_map(|source| {
            self.lookup(source)
                .map(|value| ResolvedIdentity { source, value })
        });

        match &resolved {
            Some(r) => tracing::debug!(
                identifier = %self.config.identifier,
                source = %r.source,
                "identity resolved"
            ),
            None => tracing::debug!(
                identifier = %self.config.identifier,
                "identity not found in any enabled source"
            ),
        }
        resolved
    }

    fn lookup(&self, source: IdentitySource) -> Option<IdentityValue> {
        if !self.is_enabled(source) {
            return None;
        }
        let key = self.config.identifier.as_str();
        let value = match source {
            IdentitySource::RouteParameter => self.request.route_parameter(key),
            IdentitySource::Input => self.request.input(key),
            IdentitySource::ViewVariable => self.view?.variables().get(key).cloned(),
        };
        value.filter(|v| !v.is_null())
    }
}

impl std::fmt::Debug for IdentityResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("config", &self.config)
            .field("has_view", &self.view.is_some())
            .finish_non_exhaustive()
    }
}
