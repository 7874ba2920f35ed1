use std::sync::Arc;

use serde::Serialize;

use crate::{
    declarations::{BindingDeclaration, EntryPoint},
    multibinding::SyntheticMultibinding,
    types::{ComponentId, DeclarationSite, DependencyRequest, Key, Scope},
};

/// Index of a node inside its [BindingGraph]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// The binding a node was resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ResolvedBinding {
    Declared(Arc<BindingDeclaration>),
    Multibinding(SyntheticMultibinding),
}
impl ResolvedBinding {
    pub fn dependencies(&self) -> &[DependencyRequest] {
        match self {
            ResolvedBinding::Declared(declaration) => &declaration.dependencies,
            ResolvedBinding::Multibinding(multibinding) => &multibinding.dependencies,
        }
    }

    pub fn scope(&self) -> Option<&Scope> {
        match self {
            ResolvedBinding::Declared(declaration) => declaration.scope.as_ref(),
            ResolvedBinding::Multibinding(_) => None,
        }
    }

    /// Site deciding the position among otherwise unordered nodes
    pub fn canonical_site(&self) -> Option<&DeclarationSite> {
        match self {
            ResolvedBinding::Declared(declaration) => Some(&declaration.site),
            ResolvedBinding::Multibinding(multibinding) => multibinding.first_site(),
        }
    }
}

/// Dependency of a node on another node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub request: DependencyRequest,
    /// `None` only for optional requests without a binding
    pub target: Option<NodeId>,
}
impl Edge {
    /// Indirect edges don't constrain construction order
    pub fn is_indirect(&self) -> bool {
        self.request.is_indirect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub key: Key,
    /// Component holding the instance, the resolving component or one of its ancestors
    pub owner: ComponentId,
    pub binding: ResolvedBinding,
    pub edges: Vec<Edge>,
}
impl Node {
    /// Edges which must be constructed before this node
    pub fn direct_targets(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.edges
            .iter()
            .filter(|edge| !edge.is_indirect())
            .filter_map(|edge| edge.target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEntryPoint {
    pub entry_point: EntryPoint,
    pub target: Option<NodeId>,
}

/// Validated graph of one component
///
/// Holds every node reachable from the component's entry points, including
/// nodes owned by ancestors, and the order in which they have to be emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingGraph {
    pub component: ComponentId,
    pub parent: Option<ComponentId>,
    pub scope: Option<Scope>,
    pub entry_points: Vec<ResolvedEntryPoint>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) order: Vec<NodeId>,
}
impl BindingGraph {
    pub(crate) fn new(
        component: ComponentId,
        parent: Option<ComponentId>,
        scope: Option<Scope>,
    ) -> Self {
        BindingGraph {
            component,
            parent,
            scope,
            entry_points: Vec::new(),
            nodes: Vec::new(),
            order: Vec::new(),
        }
    }

    pub(crate) fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Emission order, every direct dependency comes before its dependent
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn ordered_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.iter().map(|id| self.node(*id))
    }

    /// Keys in emission order
    pub fn ordered_keys(&self) -> Vec<&Key> {
        self.ordered_nodes().map(|node| &node.key).collect()
    }

    /// First node in emission order providing `key`
    pub fn find(&self, key: &Key) -> Option<&Node> {
        self.ordered_nodes().find(|node| &node.key == key)
    }
}

/// The validated graphs of all components, parents before children
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedGraph {
    pub components: Vec<BindingGraph>,
}
impl ResolvedGraph {
    pub fn component(&self, id: &ComponentId) -> Option<&BindingGraph> {
        self.components.iter().find(|graph| &graph.component == id)
    }
}
