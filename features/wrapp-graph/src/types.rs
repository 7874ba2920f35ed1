use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Identity of a requested or provided value
///
/// Two keys are the same iff type and qualifier match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}
impl Key {
    pub fn of(type_name: impl Into<String>) -> Key {
        Key {
            type_name: type_name.into(),
            qualifier: None,
        }
    }

    pub fn qualified(type_name: impl Into<String>, qualifier: impl Into<String>) -> Key {
        Key {
            type_name: type_name.into(),
            qualifier: Some(qualifier.into()),
        }
    }
}
impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "@{} {}", qualifier, self.type_name),
            None => f.write_str(&self.type_name),
        }
    }
}

/// Id of a component as given by the declaration list
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub String);
impl ComponentId {
    pub fn new(id: impl Into<String>) -> Self {
        ComponentId(id.into())
    }
}
impl Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
impl From<&str> for ComponentId {
    fn from(id: &str) -> Self {
        ComponentId(id.to_string())
    }
}

/// Lifetime tag of a component or binding
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(pub String);
impl Scope {
    /// Name of the scope that may be used from any component
    pub const REUSABLE: &'static str = "Reusable";

    pub fn new(name: impl Into<String>) -> Self {
        Scope(name.into())
    }

    pub fn reusable() -> Self {
        Scope(Self::REUSABLE.to_string())
    }

    pub fn is_reusable(&self) -> bool {
        self.0 == Self::REUSABLE
    }
}
impl Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}
impl From<&str> for Scope {
    fn from(name: &str) -> Self {
        Scope(name.to_string())
    }
}

/// Where a binding was declared
///
/// The derived ordering (module first, then element) is the canonical order used for
/// multibinding contributions and to break ties when planning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclarationSite {
    pub module: String,
    pub element: String,
}
impl DeclarationSite {
    pub fn new(module: impl Into<String>, element: impl Into<String>) -> Self {
        DeclarationSite {
            module: module.into(),
            element: element.into(),
        }
    }

    /// Site of an entry point, named after its component
    pub fn entry_point(component: &ComponentId, name: &str) -> Self {
        Self::new(component.0.clone(), name)
    }

    /// Site of the component declaration itself
    pub fn component(component: &ComponentId) -> Self {
        Self::new(component.0.clone(), "<component>")
    }
}
impl Display for DeclarationSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.module, self.element)
    }
}

/// In which form a dependency is requested
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RequestKind {
    /// The value itself, constructed eagerly
    #[default]
    Instance,
    /// A provider which can be called for the value
    Provider,
    /// A lazily computed and then remembered value
    Lazy,
    /// A provider handing out lazy values
    ProviderOfLazy,
}
impl RequestKind {
    /// Deferred requests don't need the value at construction time, so they may take part in cycles
    pub fn is_deferred(self) -> bool {
        self != RequestKind::Instance
    }
}

/// A Key requested by a binding or entry point
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyRequest {
    pub key: Key,
    #[serde(default)]
    pub kind: RequestKind,
    /// If a missing binding is acceptable
    #[serde(default)]
    pub optional: bool,
}
impl DependencyRequest {
    pub fn new(key: Key, kind: RequestKind) -> Self {
        DependencyRequest {
            key,
            kind,
            optional: false,
        }
    }

    pub fn instance(key: Key) -> Self {
        Self::new(key, RequestKind::Instance)
    }

    pub fn provider(key: Key) -> Self {
        Self::new(key, RequestKind::Provider)
    }

    pub fn lazy(key: Key) -> Self {
        Self::new(key, RequestKind::Lazy)
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// The edge created for this request does not constrain construction order
    pub fn is_indirect(&self) -> bool {
        self.kind.is_deferred()
    }
}
impl From<Key> for DependencyRequest {
    fn from(key: Key) -> Self {
        DependencyRequest::instance(key)
    }
}
impl Display for DependencyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            RequestKind::Instance => write!(f, "{}", self.key)?,
            RequestKind::Provider => write!(f, "Provider<{}>", self.key)?,
            RequestKind::Lazy => write!(f, "Lazy<{}>", self.key)?,
            RequestKind::ProviderOfLazy => write!(f, "Provider<Lazy<{}>>", self.key)?,
        }
        if self.optional {
            f.write_str("?")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_compare_type_and_qualifier() {
        assert_eq!(Key::of("String"), Key::of("String"));
        assert_ne!(Key::of("String"), Key::qualified("String", "Named(\"url\")"));
        assert_eq!(
            Key::qualified("String", "Named(\"url\")").to_string(),
            "@Named(\"url\") String"
        );
    }

    #[test]
    fn sites_order_by_module_then_element() {
        let mut sites = vec![
            DeclarationSite::new("b.Module", "a"),
            DeclarationSite::new("a.Module", "z"),
            DeclarationSite::new("a.Module", "b"),
        ];
        sites.sort();
        assert_eq!(
            sites,
            vec![
                DeclarationSite::new("a.Module", "b"),
                DeclarationSite::new("a.Module", "z"),
                DeclarationSite::new("b.Module", "a"),
            ]
        );
    }

    #[test]
    fn only_instance_requests_are_direct() {
        assert!(!DependencyRequest::instance(Key::of("A")).is_indirect());
        assert!(DependencyRequest::provider(Key::of("A")).is_indirect());
        assert!(DependencyRequest::lazy(Key::of("A")).is_indirect());
        assert!(RequestKind::ProviderOfLazy.is_deferred());
        assert_eq!(
            DependencyRequest::lazy(Key::of("A")).optional().to_string(),
            "Lazy<A>?"
        );
    }
}
