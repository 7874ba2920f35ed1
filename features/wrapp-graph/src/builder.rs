use wrapp_config::ResolverConfig;

use crate::{
    declarations::{BindingDeclaration, ComponentDeclaration, Declarations},
    errors::ResolutionResult,
    resolution,
};

/// Collects components and bindings, then resolves them in one go
///
/// ```
/// use wrapp_graph::{
///     BindingDeclaration, ComponentDeclaration, DeclarationSite, Key, WiringBuilder,
/// };
///
/// let graph = WiringBuilder::new()
///     .add_component(ComponentDeclaration::new("App").entry_point("heater", Key::of("Heater")))
///     .add_binding(BindingDeclaration::provision(
///         "App",
///         Key::of("Heater"),
///         DeclarationSite::new("HeaterModule", "provideHeater"),
///     ))
///     .resolve()
///     .unwrap();
///
/// assert_eq!(graph.components.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WiringBuilder {
    declarations: Declarations,
    config: ResolverConfig,
}
impl WiringBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing declaration list, e.g. one read from a front-end
    pub fn from_declarations(declarations: Declarations) -> Self {
        WiringBuilder {
            declarations,
            config: ResolverConfig::default(),
        }
    }

    pub fn add_component(mut self, component: ComponentDeclaration) -> Self {
        self.declarations.components.push(component);
        self
    }

    pub fn add_binding(mut self, binding: BindingDeclaration) -> Self {
        self.declarations.bindings.push(binding);
        self
    }

    pub fn add_bindings(mut self, bindings: impl IntoIterator<Item = BindingDeclaration>) -> Self {
        self.declarations.bindings.extend(bindings);
        self
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    pub fn resolve(self) -> ResolutionResult {
        resolution::resolve(self.declarations, &self.config)
    }
}
