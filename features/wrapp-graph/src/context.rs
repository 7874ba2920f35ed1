use wrapp_config::ResolverConfig;

use crate::{
    catalog::BindingCatalog,
    components::{ComponentIdx, ComponentTree},
    declarations::Declarations,
    errors::DeclarationError,
    types::ComponentId,
};

/// Everything a resolution walk reads
///
/// Populated once from the declaration list, then only shared immutably.
pub struct ResolutionContext {
    pub tree: ComponentTree,
    pub catalog: BindingCatalog,
    pub config: ResolverConfig,
}
impl ResolutionContext {
    pub fn new(
        declarations: Declarations,
        config: ResolverConfig,
    ) -> Result<Self, DeclarationError> {
        let Declarations {
            components,
            bindings,
        } = declarations;

        let tree = ComponentTree::new(components)?;
        let mut catalog = BindingCatalog::new();
        for binding in bindings {
            catalog.register(&tree, binding)?;
        }

        tracing::debug!(
            "Populated catalog with {} bindings for {} components",
            catalog.len(),
            tree.len()
        );

        Ok(ResolutionContext {
            tree,
            catalog,
            config,
        })
    }

    pub fn component_id(&self, index: ComponentIdx) -> &ComponentId {
        &self.tree.get(index).id
    }
}
