use std::collections::BTreeSet;

use crate::{
    errors::ResolveError,
    graph::{BindingGraph, Node, NodeId},
    types::{ComponentId, DeclarationSite, Key},
};

/// Position of a node among nodes not ordered by any edge
type CanonicalKey<'a> = (Option<&'a DeclarationSite>, &'a Key, &'a ComponentId, NodeId);

fn canonical_key(id: NodeId, node: &Node) -> CanonicalKey<'_> {
    (node.binding.canonical_site(), &node.key, &node.owner, id)
}

/// Orders the nodes of a validated graph for emission
///
/// Every direct dependency comes before its dependent, indirect edges don't constrain the order.
/// Ties are broken by declaration site, so the same graph always yields the same order.
pub fn plan(graph: &BindingGraph) -> Result<Vec<NodeId>, ResolveError> {
    let count = graph.nodes().len();
    let mut pending = vec![0_usize; count];
    let mut dependents: Vec<Vec<NodeId>> = vec![Vec::new(); count];

    for id in graph.node_ids() {
        let mut targets: Vec<NodeId> = graph.node(id).direct_targets().collect();
        targets.sort();
        targets.dedup();

        pending[id.0] = targets.len();
        for target in targets {
            dependents[target.0].push(id);
        }
    }

    let mut ready: BTreeSet<CanonicalKey<'_>> = graph
        .node_ids()
        .filter(|id| pending[id.0] == 0)
        .map(|id| canonical_key(id, graph.node(id)))
        .collect();

    let mut order = Vec::with_capacity(count);
    while let Some((_, _, _, next)) = ready.pop_first() {
        order.push(next);
        for dependent in &dependents[next.0] {
            pending[dependent.0] -= 1;
            if pending[dependent.0] == 0 {
                ready.insert(canonical_key(*dependent, graph.node(*dependent)));
            }
        }
    }

    if order.len() != count {
        return Err(ResolveError::Invariant {
            message: format!(
                "{} nodes of '{}' are left on a cycle after validation",
                count - order.len(),
                graph.component
            ),
        });
    }

    tracing::debug!("Planned {} nodes for {}", order.len(), graph.component);
    Ok(order)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        declarations::BindingDeclaration,
        graph::{Edge, ResolvedBinding},
        types::DependencyRequest,
    };

    fn node(key: &str, site: &str, edges: Vec<Edge>) -> Node {
        Node {
            key: Key::of(key),
            owner: "App".into(),
            binding: ResolvedBinding::Declared(Arc::new(BindingDeclaration::provision(
                "App",
                Key::of(key),
                DeclarationSite::new("AppModule", site),
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

    fn keys(graph: &BindingGraph, order: &[NodeId]) -> Vec<String> {
        order
            .iter()
            .map(|id| graph.node(*id).key.to_string())
            .collect()
    }

    #[test]
    fn dependencies_come_first() {
        let mut graph = BindingGraph::new("App".into(), None, None);
        graph.add_node(node("CoffeeApp", "a", vec![edge(Key::of("Heater").into(), 1)]));
        graph.add_node(node("Heater", "z", vec![]));

        let order = plan(&graph).unwrap();
        assert_eq!(keys(&graph, &order), vec!["Heater", "CoffeeApp"]);
    }

    #[test]
    fn ties_follow_declaration_sites() {
        let mut graph = BindingGraph::new("App".into(), None, None);
        graph.add_node(node("C", "c", vec![]));
        graph.add_node(node("A", "a", vec![]));
        graph.add_node(node("B", "b", vec![]));

        let order = plan(&graph).unwrap();
        assert_eq!(keys(&graph, &order), vec!["A", "B", "C"]);
    }

    #[test]
    fn indirect_edges_impose_no_order() {
        let mut graph = BindingGraph::new("App".into(), None, None);
        graph.add_node(node("A", "a", vec![edge(DependencyRequest::lazy(Key::of("B")), 1)]));
        graph.add_node(node("B", "b", vec![edge(Key::of("A").into(), 0)]));

        let order = plan(&graph).unwrap();
        assert_eq!(keys(&graph, &order), vec!["A", "B"]);
    }

    #[test]
    fn leftover_cycles_are_an_invariant_violation() {
        let mut graph = BindingGraph::new("App".into(), None, None);
        graph.add_node(node("A", "a", vec![edge(Key::of("B").into(), 1)]));
        graph.add_node(node("B", "b", vec![edge(Key::of("A").into(), 0)]));

        assert!(matches!(plan(&graph), Err(ResolveError::Invariant { .. })));
    }
}
