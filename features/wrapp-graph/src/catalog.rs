use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use crate::{
    components::{ComponentIdx, ComponentTree},
    declarations::{BindingDeclaration, BindingKind},
    errors::DeclarationError,
    types::Key,
};

/// Index of a binding inside the [BindingCatalog]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub(crate) usize);

/// All declared bindings, indexed by owning component and key
///
/// The catalog is filled once before any walk starts and only read afterwards,
/// so it can be shared between walks on different threads.
#[derive(Default)]
pub struct BindingCatalog {
    bindings: Vec<Arc<BindingDeclaration>>,
    by_component: HashMap<(ComponentIdx, Key), Vec<BindingId>>,
    /// Components with at least one binding for a key, used to explain invisible bindings
    declared_in: HashMap<Key, BTreeSet<ComponentIdx>>,
}
impl BindingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a binding under its component and key
    ///
    /// Registering the exact same declaration again returns the existing id.
    pub fn register(
        &mut self,
        tree: &ComponentTree,
        binding: BindingDeclaration,
    ) -> Result<BindingId, DeclarationError> {
        let Some(component) = tree.index_of(&binding.component) else {
            return Err(DeclarationError::UnknownComponent {
                site: binding.site,
                component: binding.component,
            });
        };
        check_well_formed(&binding)?;

        let entry = self
            .by_component
            .entry((component, binding.key.clone()))
            .or_default();
        if let Some(existing) = entry
            .iter()
            .find(|id| *self.bindings[id.0] == binding)
        {
            tracing::trace!("Ignoring repeated registration of {}", binding.site);
            return Ok(*existing);
        }

        let id = BindingId(self.bindings.len());
        entry.push(id);
        self.declared_in
            .entry(binding.key.clone())
            .or_default()
            .insert(component);
        self.bindings.push(Arc::new(binding));
        Ok(id)
    }

    /// Bindings for `key` visible to `component`
    ///
    /// Union of the component's own bindings and those of all its ancestors,
    /// own bindings first, each component in registration order.
    /// Ambiguity is not checked here, the returned list may hold more than one binding.
    pub fn lookup(
        &self,
        tree: &ComponentTree,
        component: ComponentIdx,
        key: &Key,
    ) -> Vec<BindingId> {
        tree.lineage(component)
            .flat_map(|ancestor| self.bindings_in(ancestor, key).iter().copied())
            .collect()
    }

    /// Bindings for `key` installed in `component` itself
    pub fn bindings_in(&self, component: ComponentIdx, key: &Key) -> &[BindingId] {
        self.by_component
            .get(&(component, key.clone()))
            .map_or(&[], Vec::as_slice)
    }

    /// Components which declare any binding for `key`, in index order
    pub fn declaring_components(&self, key: &Key) -> impl Iterator<Item = ComponentIdx> + '_ {
        self.declared_in
            .get(key)
            .into_iter()
            .flat_map(|components| components.iter().copied())
    }

    pub fn binding(&self, id: BindingId) -> &Arc<BindingDeclaration> {
        &self.bindings[id.0]
    }

    /// Component the binding is installed in
    pub fn owner(&self, tree: &ComponentTree, id: BindingId) -> Option<ComponentIdx> {
        tree.index_of(&self.binding(id).component)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

fn check_well_formed(binding: &BindingDeclaration) -> Result<(), DeclarationError> {
    let malformed = |reason| DeclarationError::MalformedBinding {
        site: binding.site.clone(),
        key: binding.key.clone(),
        reason,
    };

    match &binding.kind {
        BindingKind::MapContribution { map_key } if map_key.is_empty() => {
            Err(malformed("map contributions need a map key"))
        }
        BindingKind::MultibindingDeclaration { .. } if !binding.dependencies.is_empty() => {
            Err(malformed("multibinding declarations can't have dependencies"))
        }
        BindingKind::MultibindingDeclaration { .. } if binding.scope.is_some() => {
            Err(malformed("multibinding declarations can't be scoped"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        declarations::{ComponentDeclaration, MultibindingType},
        types::DeclarationSite,
    };

    fn tree() -> ComponentTree {
        ComponentTree::new(vec![
            ComponentDeclaration::new("Parent"),
            ComponentDeclaration::new("Child").child_of("Parent"),
            ComponentDeclaration::new("Sibling").child_of("Parent"),
        ])
        .unwrap()
    }

    fn string_in(component: &str, element: &str) -> BindingDeclaration {
        BindingDeclaration::provision(
            component,
            Key::of("String"),
            DeclarationSite::new(format!("{component}Module"), element),
        )
    }

    #[test]
    fn lookup_includes_ancestors_but_not_siblings() {
        let tree = tree();
        let mut catalog = BindingCatalog::new();
        let parent = catalog.register(&tree, string_in("Parent", "a")).unwrap();
        let child = catalog.register(&tree, string_in("Child", "b")).unwrap();
        catalog.register(&tree, string_in("Sibling", "c")).unwrap();

        let child_idx = tree.index_of(&"Child".into()).unwrap();
        let parent_idx = tree.index_of(&"Parent".into()).unwrap();

        assert_eq!(
            catalog.lookup(&tree, child_idx, &Key::of("String")),
            vec![child, parent]
        );
        assert_eq!(
            catalog.lookup(&tree, parent_idx, &Key::of("String")),
            vec![parent]
        );
        assert!(catalog.lookup(&tree, parent_idx, &Key::of("Int")).is_empty());
        assert_eq!(catalog.declaring_components(&Key::of("String")).count(), 3);
    }

    #[test]
    fn registration_is_idempotent() {
        let tree = tree();
        let mut catalog = BindingCatalog::new();
        let first = catalog.register(&tree, string_in("Parent", "a")).unwrap();
        let again = catalog.register(&tree, string_in("Parent", "a")).unwrap();

        assert_eq!(first, again);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn rejects_unknown_components_and_malformed_bindings() {
        let tree = tree();
        let mut catalog = BindingCatalog::new();

        let unknown = catalog.register(&tree, string_in("Nowhere", "a"));
        assert!(matches!(
            unknown,
            Err(DeclarationError::UnknownComponent { .. })
        ));

        let declaration = BindingDeclaration::new(
            BindingKind::MultibindingDeclaration {
                multibinding_type: MultibindingType::Set,
            },
            "Parent",
            Key::of("Set<String>"),
            DeclarationSite::new("ParentModule", "strings"),
        )
        .depends_on(Key::of("String"));
        assert!(matches!(
            catalog.register(&tree, declaration),
            Err(DeclarationError::MalformedBinding { .. })
        ));

        let no_map_key = BindingDeclaration::into_map(
            "Parent",
            Key::of("Map<String, Int>"),
            "",
            DeclarationSite::new("ParentModule", "entry"),
        );
        assert!(catalog.register(&tree, no_map_key).is_err());
    }
}
