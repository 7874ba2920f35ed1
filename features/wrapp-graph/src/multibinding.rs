use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;

use crate::{
    catalog::{BindingCatalog, BindingId},
    declarations::{BindingDeclaration, MultibindingType},
    errors::Diagnostic,
    types::{ComponentId, DeclarationSite, DependencyRequest, Key, RequestKind},
};

/// One binding standing in for all visible contributions to a set or map
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntheticMultibinding {
    pub key: Key,
    pub multibinding_type: MultibindingType,
    /// Contributions in canonical order
    pub contributions: Vec<Arc<BindingDeclaration>>,
    /// Union of the contributions' dependencies, merged per key
    pub dependencies: Vec<DependencyRequest>,
}
impl SyntheticMultibinding {
    /// First contribution site, used as the canonical position of the multibinding
    pub fn first_site(&self) -> Option<&DeclarationSite> {
        self.contributions.first().map(|c| &c.site)
    }
}

/// Combines multibinding contributions into a [SyntheticMultibinding]
pub struct MultibindingMerger<'a> {
    catalog: &'a BindingCatalog,
}
impl<'a> MultibindingMerger<'a> {
    pub fn new(catalog: &'a BindingCatalog) -> Self {
        Self { catalog }
    }

    /// Merges the given multibinding declarations and contributions for `key`
    ///
    /// `candidates` must only hold multibinding kinds. Contributions are ordered by
    /// declaration site, so merging the same set twice yields the same binding.
    /// Returns every problem found: mixed set and map contributions or map keys used twice.
    pub fn merge(
        &self,
        key: &Key,
        component: &ComponentId,
        candidates: &[BindingId],
    ) -> Result<SyntheticMultibinding, Vec<Diagnostic>> {
        let mut declarations: Vec<&Arc<BindingDeclaration>> = candidates
            .iter()
            .map(|id| self.catalog.binding(*id))
            .collect();
        declarations.sort_by(|a, b| {
            a.site
                .cmp(&b.site)
                .then_with(|| a.component.cmp(&b.component))
        });
        declarations.dedup_by(|a, b| a == b);

        let mut types = declarations.iter().filter_map(|d| d.kind.multibinding_type());
        let Some(multibinding_type) = types.next() else {
            return Err(vec![]);
        };
        if types.any(|other| other != multibinding_type) {
            return Err(vec![Diagnostic::DuplicateBinding {
                key: key.clone(),
                component: component.clone(),
                sites: declarations.iter().map(|d| d.site.clone()).collect(),
            }]);
        }

        let contributions: Vec<Arc<BindingDeclaration>> = declarations
            .into_iter()
            .filter(|d| d.kind.is_contribution())
            .cloned()
            .collect();

        if multibinding_type == MultibindingType::Map {
            let errors = duplicate_map_keys(key, &contributions);
            if !errors.is_empty() {
                return Err(errors);
            }
        }

        let dependencies = union_dependencies(&contributions);
        tracing::trace!(
            "Merged {} contributions into {} for {}",
            contributions.len(),
            key,
            component
        );

        Ok(SyntheticMultibinding {
            key: key.clone(),
            multibinding_type,
            contributions,
            dependencies,
        })
    }
}

fn duplicate_map_keys(key: &Key, contributions: &[Arc<BindingDeclaration>]) -> Vec<Diagnostic> {
    let mut by_map_key: BTreeMap<&str, Vec<DeclarationSite>> = BTreeMap::new();
    for contribution in contributions {
        if let Some(map_key) = contribution.kind.map_key() {
            by_map_key
                .entry(map_key)
                .or_default()
                .push(contribution.site.clone());
        }
    }

    by_map_key
        .into_iter()
        .filter(|(_, sites)| sites.len() > 1)
        .map(|(map_key, sites)| Diagnostic::DuplicateMultibindingKey {
            key: key.clone(),
            map_key: map_key.to_string(),
            sites,
        })
        .collect()
}

/// Merges requests for the same key: direct if any contribution needs it directly,
/// optional only if every contribution tolerates its absence
fn union_dependencies(contributions: &[Arc<BindingDeclaration>]) -> Vec<DependencyRequest> {
    let mut merged: Vec<DependencyRequest> = Vec::new();
    for request in contributions.iter().flat_map(|c| c.dependencies.iter()) {
        match merged.iter_mut().find(|m| m.key == request.key) {
            Some(existing) => {
                if request.kind == RequestKind::Instance {
                    existing.kind = RequestKind::Instance;
                }
                existing.optional &= request.optional;
            }
            None => merged.push(request.clone()),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        components::ComponentTree,
        declarations::{BindingKind, ComponentDeclaration},
    };

    fn setup(bindings: Vec<BindingDeclaration>) -> (BindingCatalog, Vec<BindingId>) {
        let tree = ComponentTree::new(vec![
            ComponentDeclaration::new("Parent"),
            ComponentDeclaration::new("Child").child_of("Parent"),
        ])
        .unwrap();
        let mut catalog = BindingCatalog::new();
        let ids = bindings
            .into_iter()
            .map(|b| catalog.register(&tree, b).unwrap())
            .collect();
        (catalog, ids)
    }

    fn strings() -> Key {
        Key::of("Set<String>")
    }

    #[test]
    fn contributions_are_ordered_by_site() {
        let (catalog, ids) = setup(vec![
            BindingDeclaration::into_set(
                "Child",
                strings(),
                DeclarationSite::new("ChildModule", "b"),
            ),
            BindingDeclaration::into_set(
                "Parent",
                strings(),
                DeclarationSite::new("ParentModule", "a"),
            ),
            BindingDeclaration::into_set(
                "Child",
                strings(),
                DeclarationSite::new("ChildModule", "a"),
            ),
        ]);
        let merger = MultibindingMerger::new(&catalog);

        let merged = merger.merge(&strings(), &"Child".into(), &ids).unwrap();
        let reversed: Vec<_> = ids.iter().rev().copied().collect();
        let again = merger.merge(&strings(), &"Child".into(), &reversed).unwrap();

        let sites: Vec<_> = merged.contributions.iter().map(|c| c.site.to_string()).collect();
        assert_eq!(sites, vec!["ChildModule.a", "ChildModule.b", "ParentModule.a"]);
        assert_eq!(merged, again);
    }

    #[test]
    fn dependencies_are_unioned() {
        let (catalog, ids) = setup(vec![
            BindingDeclaration::into_set("Parent", strings(), DeclarationSite::new("M", "a"))
                .depends_on(DependencyRequest::lazy(Key::of("Heater")))
                .depends_on(Key::of("Pump")),
            BindingDeclaration::into_set("Parent", strings(), DeclarationSite::new("M", "b"))
                .depends_on(Key::of("Heater"))
                .depends_on(DependencyRequest::instance(Key::of("Clock")).optional()),
        ]);

        let merged = MultibindingMerger::new(&catalog)
            .merge(&strings(), &"Parent".into(), &ids)
            .unwrap();

        assert_eq!(
            merged.dependencies,
            vec![
                DependencyRequest::instance(Key::of("Heater")),
                DependencyRequest::instance(Key::of("Pump")),
                DependencyRequest::instance(Key::of("Clock")).optional(),
            ]
        );
    }

    #[test]
    fn duplicate_map_keys_are_reported() {
        let map = Key::of("Map<String, Handler>");
        let (catalog, ids) = setup(vec![
            BindingDeclaration::into_map(
                "Parent",
                map.clone(),
                "home",
                DeclarationSite::new("M", "a"),
            ),
            BindingDeclaration::into_map(
                "Child",
                map.clone(),
                "home",
                DeclarationSite::new("C", "b"),
            ),
            BindingDeclaration::into_map(
                "Child",
                map.clone(),
                "about",
                DeclarationSite::new("C", "c"),
            ),
        ]);

        let errors = MultibindingMerger::new(&catalog)
            .merge(&map, &"Child".into(), &ids)
            .unwrap_err();

        assert_eq!(
            errors,
            vec![Diagnostic::DuplicateMultibindingKey {
                key: map,
                map_key: "home".to_string(),
                sites: vec![DeclarationSite::new("C", "b"), DeclarationSite::new("M", "a")],
            }]
        );
    }

    #[test]
    fn declarations_allow_empty_multibindings() {
        let (catalog, ids) = setup(vec![BindingDeclaration::new(
            BindingKind::MultibindingDeclaration {
                multibinding_type: MultibindingType::Set,
            },
            "Parent",
            strings(),
            DeclarationSite::new("M", "strings"),
        )]);

        let merged = MultibindingMerger::new(&catalog)
            .merge(&strings(), &"Parent".into(), &ids)
            .unwrap();

        assert!(merged.contributions.is_empty());
        assert_eq!(merged.multibinding_type, MultibindingType::Set);
    }

    #[test]
    fn mixed_set_and_map_contributions_conflict() {
        let key = Key::of("Collection");
        let (catalog, ids) = setup(vec![
            BindingDeclaration::into_set("Parent", key.clone(), DeclarationSite::new("M", "a")),
            BindingDeclaration::into_map(
                "Parent",
                key.clone(),
                "k",
                DeclarationSite::new("M", "b"),
            ),
        ]);

        let errors = MultibindingMerger::new(&catalog)
            .merge(&key, &"Parent".into(), &ids)
            .unwrap_err();

        assert!(matches!(errors[..], [Diagnostic::DuplicateBinding { .. }]));
    }
}
