//! The normalized declaration list handed over by the front-end.
//!
//! Nothing in here knows about source syntax, it's plain data describing
//! components and the bindings installed in them.

use serde::{Deserialize, Serialize};

use crate::types::{ComponentId, DeclarationSite, DependencyRequest, Key, Scope};

/// Whether a multibinding collects into a set or a map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MultibindingType {
    Set,
    Map,
}

/// How a binding provides its key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindingKind {
    /// Explicit provision method
    Provision,
    /// Constructor injection
    Injection,
    /// Contributes one element into a set
    SetContribution,
    /// Contributes all elements of a collection into a set
    SetValuesContribution,
    /// Contributes one entry into a map
    MapContribution { map_key: String },
    /// Declares a set or map which may stay empty
    MultibindingDeclaration { multibinding_type: MultibindingType },
    /// The component itself or an instance bound into it
    ComponentInstance,
}
impl BindingKind {
    /// The multibinding this kind takes part in, `None` for unique bindings
    pub fn multibinding_type(&self) -> Option<MultibindingType> {
        match self {
            BindingKind::SetContribution | BindingKind::SetValuesContribution => {
                Some(MultibindingType::Set)
            }
            BindingKind::MapContribution { .. } => Some(MultibindingType::Map),
            BindingKind::MultibindingDeclaration { multibinding_type } => Some(*multibinding_type),
            BindingKind::Provision | BindingKind::Injection | BindingKind::ComponentInstance => {
                None
            }
        }
    }

    pub fn is_multibinding(&self) -> bool {
        self.multibinding_type().is_some()
    }

    /// True for kinds adding a value into a multibinding
    pub fn is_contribution(&self) -> bool {
        self.is_multibinding() && !matches!(self, BindingKind::MultibindingDeclaration { .. })
    }

    pub fn map_key(&self) -> Option<&str> {
        match self {
            BindingKind::MapContribution { map_key } => Some(map_key),
            _ => None,
        }
    }
}

/// A declared way to provide a [Key]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingDeclaration {
    /// The provided key, for contributions the key of the collection
    pub key: Key,
    #[serde(flatten)]
    pub kind: BindingKind,
    #[serde(default)]
    pub dependencies: Vec<DependencyRequest>,
    /// Component the binding is installed in
    pub component: ComponentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    pub site: DeclarationSite,
}
impl BindingDeclaration {
    pub fn new(
        kind: BindingKind,
        component: impl Into<ComponentId>,
        key: Key,
        site: DeclarationSite,
    ) -> Self {
        BindingDeclaration {
            key,
            kind,
            dependencies: Vec::new(),
            component: component.into(),
            scope: None,
            site,
        }
    }

    pub fn provision(component: impl Into<ComponentId>, key: Key, site: DeclarationSite) -> Self {
        Self::new(BindingKind::Provision, component, key, site)
    }

    pub fn injection(component: impl Into<ComponentId>, key: Key, site: DeclarationSite) -> Self {
        Self::new(BindingKind::Injection, component, key, site)
    }

    pub fn into_set(component: impl Into<ComponentId>, key: Key, site: DeclarationSite) -> Self {
        Self::new(BindingKind::SetContribution, component, key, site)
    }

    pub fn into_map(
        component: impl Into<ComponentId>,
        key: Key,
        map_key: impl Into<String>,
        site: DeclarationSite,
    ) -> Self {
        let kind = BindingKind::MapContribution {
            map_key: map_key.into(),
        };
        Self::new(kind, component, key, site)
    }

    pub fn depends_on(mut self, request: impl Into<DependencyRequest>) -> Self {
        self.dependencies.push(request.into());
        self
    }

    pub fn scoped(mut self, scope: impl Into<Scope>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

/// A key the component must be able to hand out, e.g. an accessor or injection site
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryPoint {
    pub name: String,
    pub request: DependencyRequest,
}
impl EntryPoint {
    pub fn new(name: impl Into<String>, request: impl Into<DependencyRequest>) -> Self {
        EntryPoint {
            name: name.into(),
            request: request.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDeclaration {
    pub id: ComponentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ComponentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub entry_points: Vec<EntryPoint>,
}
impl ComponentDeclaration {
    pub fn new(id: impl Into<ComponentId>) -> Self {
        ComponentDeclaration {
            id: id.into(),
            parent: None,
            scope: None,
            entry_points: Vec::new(),
        }
    }

    pub fn child_of(mut self, parent: impl Into<ComponentId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn scoped(mut self, scope: impl Into<Scope>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn entry_point(
        mut self,
        name: impl Into<String>,
        request: impl Into<DependencyRequest>,
    ) -> Self {
        self.entry_points.push(EntryPoint::new(name, request));
        self
    }
}

/// Everything the resolver consumes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declarations {
    #[serde(default)]
    pub components: Vec<ComponentDeclaration>,
    #[serde(default)]
    pub bindings: Vec<BindingDeclaration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_read_from_json() {
        let json = r#"{
            "components": [
                { "id": "App", "scope": "Singleton", "entry_points": [
                    { "name": "maker", "request": { "key": { "type_name": "CoffeeMaker" } } }
                ]}
            ],
            "bindings": [
                { "key": { "type_name": "Set<String>" }, "kind": "set_contribution",
                  "component": "App", "site": { "module": "AppModule", "element": "one" } },
                { "key": { "type_name": "Map<String, Int>" }, "kind": "map_contribution",
                  "map_key": "a", "component": "App",
                  "site": { "module": "AppModule", "element": "a" } },
                { "key": { "type_name": "CoffeeMaker" }, "kind": "injection",
                  "component": "App", "scope": "Singleton",
                  "dependencies": [ { "key": { "type_name": "Heater" }, "kind": "Lazy" } ],
                  "site": { "module": "CoffeeMaker", "element": "<init>" } }
            ]
        }"#;

        let declarations: Declarations = serde_json::from_str(json).unwrap();

        assert_eq!(declarations.components[0].scope, Some(Scope::new("Singleton")));
        assert_eq!(declarations.bindings[0].kind, BindingKind::SetContribution);
        assert_eq!(declarations.bindings[1].kind.map_key(), Some("a"));
        let maker = &declarations.bindings[2];
        assert_eq!(maker.kind, BindingKind::Injection);
        assert!(maker.dependencies[0].is_indirect());

        let again: Declarations =
            serde_json::from_str(&serde_json::to_string(&declarations).unwrap()).unwrap();
        assert_eq!(again, declarations);
    }

    #[test]
    fn declarations_are_not_contributions() {
        let declaration = BindingKind::MultibindingDeclaration {
            multibinding_type: MultibindingType::Set,
        };
        assert!(declaration.is_multibinding());
        assert!(!declaration.is_contribution());
        assert!(BindingKind::SetValuesContribution.is_contribution());
        assert!(!BindingKind::ComponentInstance.is_multibinding());
    }
}
