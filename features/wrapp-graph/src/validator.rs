//! Checks run on top of the resolution walk
//!
//! - component scopes (repeated or reusable scopes on components)
//! - effective owner of bindings, see [resolve_owner]
//! - illegal cycles, see [find_cycles]
//! - ownership invariant of finished graphs

use std::collections::HashSet;

use crate::{
    catalog::BindingId,
    components::ComponentIdx,
    context::ResolutionContext,
    declarations::BindingKind,
    errors::{Diagnostic, ResolveError},
    graph::{BindingGraph, NodeId},
    types::{DeclarationSite, Key},
};

/// Validates the scopes placed on components
///
/// Returns all issues found, in component pre-order
pub fn check_component_scopes(ctx: &ResolutionContext) -> Vec<Diagnostic> {
    let mut errors = Vec::new();
    let level = ctx.config.repeated_scope_validation;

    for index in ctx.tree.pre_order() {
        let component = ctx.tree.get(index);
        let Some(scope) = &component.scope else {
            continue;
        };

        if scope.is_reusable() {
            errors.push(Diagnostic::ReusableComponent {
                component: component.id.clone(),
                scope: scope.clone(),
                site: DeclarationSite::component(&component.id),
            });
            continue;
        }

        if !level.is_enabled() {
            continue;
        }
        let repeated = component
            .parent
            .and_then(|parent| ctx.tree.scoped_ancestor(parent, scope));
        if let Some(ancestor) = repeated {
            let diagnostic = Diagnostic::RepeatedScope {
                component: component.id.clone(),
                ancestor: ctx.component_id(ancestor).clone(),
                scope: scope.clone(),
                site: DeclarationSite::component(&component.id),
            };
            if level.is_error() {
                errors.push(diagnostic);
            } else {
                tracing::warn!("{diagnostic}");
            }
        }
    }

    errors
}

/// Decides which component holds the instance of a binding requested from `requester`
///
/// - reusable bindings and unscoped constructor bindings live in the requester
/// - unscoped explicit bindings live in their declaring component, unless they depend on
///   multibinding contributions of a component between it and the requester
/// - scoped explicit bindings live in their declaring component, which must carry the same scope
/// - scoped constructor bindings live in the nearest component of the lineage with that scope
///
/// The dependencies of a binding are resolved from its owner, so an ancestor never reads
/// the bindings of its descendants.
/// With scope validation lowered to a warning (or disabled) a mismatch falls back to the requester.
pub fn resolve_owner(
    ctx: &ResolutionContext,
    requester: ComponentIdx,
    id: BindingId,
) -> Result<ComponentIdx, Diagnostic> {
    let binding = ctx.catalog.binding(id);
    let declared_in = ctx.catalog.owner(&ctx.tree, id);

    // Lookups only walk up the tree, anything else is a broken catalog
    let Some(declared_in) = declared_in.filter(|owner| ctx.tree.is_in_lineage(requester, *owner))
    else {
        return Err(Diagnostic::InvisibleBinding {
            key: binding.key.clone(),
            component: ctx.component_id(requester).clone(),
            declared_in: vec![binding.component.clone()],
            sites: vec![binding.site.clone()],
        });
    };

    let scope = match &binding.scope {
        Some(scope) if scope.is_reusable() => return Ok(requester),
        Some(scope) => scope,
        None if binding.kind == BindingKind::Injection => return Ok(requester),
        None => return Ok(explicit_owner(ctx, requester, declared_in, id)),
    };

    let owner = match binding.kind {
        BindingKind::Injection => ctx.tree.scoped_ancestor(requester, scope),
        _ => (ctx.tree.get(declared_in).scope.as_ref() == Some(scope)).then_some(declared_in),
    };
    if let Some(owner) = owner {
        return Ok(owner);
    }

    let level = ctx.config.scope_validation;
    let diagnostic = Diagnostic::ScopeMismatch {
        key: binding.key.clone(),
        component: ctx.component_id(requester).clone(),
        scope: scope.clone(),
        site: binding.site.clone(),
    };
    if level.is_error() {
        return Err(diagnostic);
    }
    if level.is_enabled() {
        tracing::warn!("{diagnostic}");
    }
    Ok(requester)
}

/// Nearest component from the requester up to `declared_in` whose own multibinding
/// contributions the binding depends on, `declared_in` if there is none
fn explicit_owner(
    ctx: &ResolutionContext,
    requester: ComponentIdx,
    declared_in: ComponentIdx,
    id: BindingId,
) -> ComponentIdx {
    ctx.tree
        .lineage(requester)
        .take_while(|component| *component != declared_in)
        .find(|component| {
            depends_on_local_multibindings(ctx, *component, id, &mut HashSet::new())
        })
        .unwrap_or(declared_in)
}

/// Checks whether the binding, or any unscoped binding it depends on as seen from
/// `component`, depends on multibinding contributions installed in `component` itself
///
/// Scoped bindings are skipped, they can't depend on contributions of a descendant.
fn depends_on_local_multibindings(
    ctx: &ResolutionContext,
    component: ComponentIdx,
    id: BindingId,
    visited: &mut HashSet<BindingId>,
) -> bool {
    if !visited.insert(id) {
        return false;
    }
    let binding = ctx.catalog.binding(id);
    if binding.scope.as_ref().is_some_and(|scope| !scope.is_reusable()) {
        return false;
    }

    let local = ctx.component_id(component);
    for request in &binding.dependencies {
        let visible = ctx.catalog.lookup(&ctx.tree, component, &request.key);
        let has_local_contribution = visible.iter().any(|dependency| {
            let dependency = ctx.catalog.binding(*dependency);
            dependency.kind.is_contribution() && &dependency.component == local
        });
        if has_local_contribution {
            return true;
        }
        for dependency in visible {
            if depends_on_local_multibindings(ctx, component, dependency, visited) {
                return true;
            }
        }
    }
    false
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Finds cycles made of direct edges only
///
/// Indirect edges end the depth first branch, the deferred value breaks the eager construction.
/// Returns one diagnostic per cycle closed during the walk, starting from the entry points.
pub fn find_cycles(graph: &BindingGraph) -> Vec<Diagnostic> {
    let mut marks = vec![Mark::Unvisited; graph.nodes().len()];
    let mut chain = Vec::new();
    let mut errors = Vec::new();

    let roots = graph
        .entry_points
        .iter()
        .filter_map(|entry| entry.target)
        .chain(graph.node_ids());
    for root in roots {
        visit(graph, root, &mut marks, &mut chain, &mut errors);
    }

    return errors;

    fn visit(
        graph: &BindingGraph,
        node: NodeId,
        marks: &mut [Mark],
        chain: &mut Vec<NodeId>,
        errors: &mut Vec<Diagnostic>,
    ) {
        match marks[node.0] {
            Mark::Done => return,
            Mark::InProgress => {
                if let Some(start) = chain.iter().position(|n| *n == node) {
                    let mut cycle: Vec<Key> = chain[start..]
                        .iter()
                        .map(|n| graph.node(*n).key.clone())
                        .collect();
                    cycle.push(graph.node(node).key.clone()); // Close the cycle
                    let sites = chain[start..]
                        .iter()
                        .filter_map(|n| graph.node(*n).binding.canonical_site().cloned())
                        .collect();

                    errors.push(Diagnostic::IllegalCycle {
                        component: graph.component.clone(),
                        cycle,
                        sites,
                    });
                }
                return;
            }
            Mark::Unvisited => {}
        }

        marks[node.0] = Mark::InProgress;
        chain.push(node);

        for target in graph.node(node).direct_targets() {
            visit(graph, target, marks, chain, errors);
        }

        chain.pop();
        marks[node.0] = Mark::Done;
    }
}

/// Every node must be owned by the graph's component or one of its ancestors
pub fn check_ownership(ctx: &ResolutionContext, graph: &BindingGraph) -> Result<(), ResolveError> {
    let Some(component) = ctx.tree.index_of(&graph.component) else {
        return Err(ResolveError::Invariant {
            message: format!("graph for unknown component '{}'", graph.component),
        });
    };

    for node in graph.nodes() {
        let owned_above = ctx
            .tree
            .index_of(&node.owner)
            .is_some_and(|owner| ctx.tree.is_in_lineage(component, owner));
        if !owned_above {
            return Err(ResolveError::Invariant {
                message: format!(
                    "'{}' in '{}' is owned by '{}' outside of its lineage",
                    node.key, graph.component, node.owner
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use wrapp_config::{ResolverConfig, ValidationLevel};

    use super::*;
    use crate::{
        declarations::{BindingDeclaration, ComponentDeclaration, Declarations, EntryPoint},
        graph::{Edge, Node, ResolvedBinding, ResolvedEntryPoint},
        types::{DeclarationSite, DependencyRequest, Scope},
    };

    fn context(bindings: Vec<BindingDeclaration>, config: ResolverConfig) -> ResolutionContext {
        let components = vec![
            ComponentDeclaration::new("App").scoped("Singleton"),
            ComponentDeclaration::new("Activity")
                .child_of("App")
                .scoped("ActivityScope"),
            ComponentDeclaration::new("Fragment").child_of("Activity"),
        ];
        ResolutionContext::new(
            Declarations {
                components,
                bindings,
            },
            config,
        )
        .unwrap()
    }

    fn site(element: &str) -> DeclarationSite {
        DeclarationSite::new("TestModule", element)
    }

    fn idx(ctx: &ResolutionContext, id: &str) -> ComponentIdx {
        ctx.tree.index_of(&id.into()).unwrap()
    }

    #[test]
    fn scoped_injection_binding_lives_in_matching_component() {
        let ctx = context(
            vec![
                BindingDeclaration::injection("Fragment", Key::of("Presenter"), site("presenter"))
                    .scoped("ActivityScope"),
            ],
            ResolverConfig::default(),
        );

        let owner = resolve_owner(&ctx, idx(&ctx, "Fragment"), BindingId(0)).unwrap();
        assert_eq!(owner, idx(&ctx, "Activity"));
    }

    #[test]
    fn unscoped_explicit_binding_lives_where_declared() {
        let ctx = context(
            vec![BindingDeclaration::provision("App", Key::of("Clock"), site("clock"))],
            ResolverConfig::default(),
        );

        let owner = resolve_owner(&ctx, idx(&ctx, "Fragment"), BindingId(0)).unwrap();
        assert_eq!(owner, idx(&ctx, "App"));
    }

    #[test]
    fn unscoped_injection_and_reusable_bindings_live_in_requester() {
        let ctx = context(
            vec![
                BindingDeclaration::injection("App", Key::of("Clock"), site("clock")),
                BindingDeclaration::provision("App", Key::of("Pool"), site("pool"))
                    .scoped(Scope::reusable()),
            ],
            ResolverConfig::default(),
        );

        let fragment = idx(&ctx, "Fragment");
        assert_eq!(resolve_owner(&ctx, fragment, BindingId(0)).unwrap(), fragment);
        assert_eq!(resolve_owner(&ctx, fragment, BindingId(1)).unwrap(), fragment);
    }

    #[test]
    fn explicit_binding_follows_local_multibinding_contributions() {
        let strings = Key::of("Set<String>");
        let ctx = context(
            vec![
                BindingDeclaration::provision("App", Key::of("Greeter"), site("greeter"))
                    .depends_on(strings.clone()),
                BindingDeclaration::provision("App", Key::of("Formatter"), site("formatter"))
                    .depends_on(Key::of("Greeter")),
                BindingDeclaration::into_set("App", strings.clone(), site("app")),
                BindingDeclaration::into_set("Activity", strings.clone(), site("activity")),
            ],
            ResolverConfig::default(),
        );

        let fragment = idx(&ctx, "Fragment");
        let activity = idx(&ctx, "Activity");
        assert_eq!(resolve_owner(&ctx, fragment, BindingId(0)).unwrap(), activity);
        // Through the unscoped Greeter
        assert_eq!(resolve_owner(&ctx, fragment, BindingId(1)).unwrap(), activity);
        assert_eq!(
            resolve_owner(&ctx, idx(&ctx, "App"), BindingId(0)).unwrap(),
            idx(&ctx, "App")
        );
    }

    #[test]
    fn explicit_binding_must_match_declaring_scope() {
        let bindings = vec![
            BindingDeclaration::provision("App", Key::of("Session"), site("session"))
                .scoped("ActivityScope"),
        ];
        let ctx = context(bindings.clone(), ResolverConfig::default());

        let err = resolve_owner(&ctx, idx(&ctx, "Fragment"), BindingId(0)).unwrap_err();
        assert_eq!(
            err,
            Diagnostic::ScopeMismatch {
                key: Key::of("Session"),
                component: "Fragment".into(),
                scope: "ActivityScope".into(),
                site: site("session"),
            }
        );

        let lenient = context(
            bindings,
            ResolverConfig::default().with_scope_validation(ValidationLevel::Warning),
        );
        let owner = resolve_owner(&lenient, idx(&lenient, "Fragment"), BindingId(0)).unwrap();
        assert_eq!(owner, idx(&lenient, "Fragment"));
    }

    #[test]
    fn repeated_and_reusable_component_scopes() {
        let ctx = ResolutionContext::new(
            Declarations {
                components: vec![
                    ComponentDeclaration::new("App").scoped("Singleton"),
                    ComponentDeclaration::new("Child").child_of("App"),
                    ComponentDeclaration::new("Grandchild")
                        .child_of("Child")
                        .scoped("Singleton"),
                    ComponentDeclaration::new("Other")
                        .child_of("App")
                        .scoped(Scope::reusable()),
                ],
                bindings: vec![],
            },
            ResolverConfig::default(),
        )
        .unwrap();

        assert_eq!(
            check_component_scopes(&ctx),
            vec![
                Diagnostic::RepeatedScope {
                    component: "Grandchild".into(),
                    ancestor: "App".into(),
                    scope: "Singleton".into(),
                    site: DeclarationSite::component(&"Grandchild".into()),
                },
                Diagnostic::ReusableComponent {
                    component: "Other".into(),
                    scope: Scope::reusable(),
                    site: DeclarationSite::component(&"Other".into()),
                },
            ]
        );
    }

    fn node(key: &str, edges: Vec<Edge>) -> Node {
        Node {
            key: Key::of(key),
            owner: "App".into(),
            binding: ResolvedBinding::Declared(std::sync::Arc::new(BindingDeclaration::provision(
                "App",
                Key::of(key),
                site(key),
            ))),
            edges,
        }
    }

    fn edge(request: DependencyRequest, target: usize) -> Edge {
        Edge {
            request,
            target: Some(NodeId(target)),
        }
    }

    #[test]
    fn cycles_through_direct_edges_are_found() {
        let mut graph = BindingGraph::new("App".into(), None, None);
        graph.add_node(node("A", vec![edge(Key::of("B").into(), 1)]));
        graph.add_node(node("B", vec![edge(Key::of("C").into(), 2)]));
        graph.add_node(node("C", vec![edge(Key::of("A").into(), 0)]));
        graph.entry_points.push(ResolvedEntryPoint {
            entry_point: EntryPoint::new("a", Key::of("A")),
            target: Some(NodeId(0)),
        });

        assert_eq!(
            find_cycles(&graph),
            vec![Diagnostic::IllegalCycle {
                component: "App".into(),
                cycle: vec![Key::of("A"), Key::of("B"), Key::of("C"), Key::of("A")],
                sites: vec![site("A"), site("B"), site("C")],
            }]
        );
    }

    #[test]
    fn indirect_edges_break_cycles() {
        let mut graph = BindingGraph::new("App".into(), None, None);
        graph.add_node(node("A", vec![edge(Key::of("B").into(), 1)]));
        let provider = DependencyRequest::provider(Key::of("A"));
        graph.add_node(node("B", vec![edge(provider, 0)]));

        assert!(find_cycles(&graph).is_empty());
    }
}
