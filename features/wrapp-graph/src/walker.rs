use std::collections::HashMap;

use crate::{
    catalog::BindingId,
    components::ComponentIdx,
    context::ResolutionContext,
    errors::Diagnostic,
    graph::{BindingGraph, Edge, Node, NodeId, ResolvedBinding, ResolvedEntryPoint},
    multibinding::MultibindingMerger,
    types::{DeclarationSite, DependencyRequest, Key},
    validator,
};

/// Outcome of resolving a key in a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Resolved(NodeId),
    /// No binding, but only optional requests asked so far
    Unbound,
    /// Already reported, don't expand again
    Failed,
}

/// What the lookup of a key turned up
enum Candidate {
    Declared(BindingId),
    Multibinding(Vec<BindingId>),
}

/// Builds the [BindingGraph] of one component
///
/// Walks from the entry points through the dependencies of every resolved binding.
/// Each (component, key) pair is only expanded once, shared dependencies point to the same node.
/// Problems are collected and the walk continues past them.
pub(crate) struct GraphWalker<'a> {
    ctx: &'a ResolutionContext,
    graph: BindingGraph,
    /// Nodes by owning component and key
    nodes: HashMap<(ComponentIdx, Key), NodeId>,
    /// Results by requesting component and key
    requests: HashMap<(ComponentIdx, Key), Resolution>,
    entry_point: String,
    /// Keys requested on the way to the current request
    trace: Vec<Key>,
    /// Sites of the requesters on the way, starting with the entry point
    requested_at: Vec<DeclarationSite>,
    diagnostics: Vec<Diagnostic>,
}
impl<'a> GraphWalker<'a> {
    pub fn new(ctx: &'a ResolutionContext, component: ComponentIdx) -> Self {
        let declaration = ctx.tree.get(component);
        let parent = declaration.parent.map(|p| ctx.component_id(p).clone());
        GraphWalker {
            ctx,
            graph: BindingGraph::new(declaration.id.clone(), parent, declaration.scope.clone()),
            nodes: HashMap::new(),
            requests: HashMap::new(),
            entry_point: String::new(),
            trace: Vec::new(),
            requested_at: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Resolves all entry points of the component
    ///
    /// Returns the graph and all problems found in it
    pub fn walk(mut self, component: ComponentIdx) -> (BindingGraph, Vec<Diagnostic>) {
        let entry_points = self.ctx.tree.get(component).entry_points.clone();
        tracing::debug!(
            "Resolving {} entry points of {}",
            entry_points.len(),
            self.graph.component
        );

        for entry_point in entry_points {
            self.entry_point = entry_point.name.clone();
            self.requested_at = vec![DeclarationSite::entry_point(
                &self.graph.component,
                &entry_point.name,
            )];
            let target = self.resolve(component, &entry_point.request);
            self.graph.entry_points.push(ResolvedEntryPoint {
                entry_point,
                target,
            });
        }

        let cycles = validator::find_cycles(&self.graph);
        self.diagnostics.extend(cycles);

        tracing::debug!(
            "Resolved {} nodes for {} with {} problems",
            self.graph.nodes().len(),
            self.graph.component,
            self.diagnostics.len()
        );
        (self.graph, self.diagnostics)
    }

    fn resolve(&mut self, component: ComponentIdx, request: &DependencyRequest) -> Option<NodeId> {
        let key = &request.key;
        let request_key = (component, key.clone());

        match self.requests.get(&request_key).copied() {
            Some(Resolution::Resolved(node)) => return Some(node),
            Some(Resolution::Failed) => return None,
            Some(Resolution::Unbound) if request.optional => return None,
            Some(Resolution::Unbound) => {
                self.report_unbound(component, key);
                self.requests.insert(request_key, Resolution::Failed);
                return None;
            }
            None => {}
        }

        let candidate = match self.lookup(component, key) {
            Some(candidate) => candidate,
            None if request.optional => {
                tracing::trace!("Optional {} is not bound", key);
                self.requests.insert(request_key, Resolution::Unbound);
                return None;
            }
            None => {
                self.report_unbound(component, key);
                self.requests.insert(request_key, Resolution::Failed);
                return None;
            }
        };

        let resolved = match candidate {
            Ok(candidate) => self.bind(component, key, candidate),
            Err(diagnostic) => Err(vec![diagnostic]),
        };
        let (owner, binding) = match resolved {
            Ok(resolved) => resolved,
            Err(diagnostics) => {
                self.diagnostics.extend(diagnostics);
                self.requests.insert(request_key, Resolution::Failed);
                return None;
            }
        };

        // Reached before through another component of the lineage
        if let Some(node) = self.nodes.get(&(owner, key.clone())).copied() {
            self.requests.insert(request_key, Resolution::Resolved(node));
            return Some(node);
        }

        let node = self.graph.add_node(Node {
            key: key.clone(),
            owner: self.ctx.component_id(owner).clone(),
            binding,
            edges: Vec::new(),
        });
        self.nodes.insert((owner, key.clone()), node);
        self.requests.insert(request_key, Resolution::Resolved(node));
        tracing::trace!(
            "Bound {} in {} for {}",
            key,
            self.ctx.component_id(owner),
            self.graph.component
        );

        // Dependencies are resolved where the instance lives
        let binding = &self.graph.node(node).binding;
        let dependencies = binding.dependencies().to_vec();
        let requester = binding.canonical_site().cloned();
        let pushed_site = requester.is_some();
        self.trace.push(key.clone());
        self.requested_at.extend(requester);
        let edges: Vec<Edge> = dependencies
            .into_iter()
            .map(|request| {
                let target = self.resolve(owner, &request);
                Edge { request, target }
            })
            .collect();
        self.trace.pop();
        if pushed_site {
            self.requested_at.pop();
        }

        self.graph.node_mut(node).edges = edges;
        Some(node)
    }

    /// Finds the binding candidates for a key
    ///
    /// Returns `None` if nothing is visible, an error for conflicting unique bindings.
    fn lookup(
        &self,
        component: ComponentIdx,
        key: &Key,
    ) -> Option<Result<Candidate, Diagnostic>> {
        let visible = self.ctx.catalog.lookup(&self.ctx.tree, component, key);
        if visible.is_empty() {
            return None;
        }

        let (multibindings, unique): (Vec<BindingId>, Vec<BindingId>) = visible
            .iter()
            .copied()
            .partition(|id| self.ctx.catalog.binding(*id).kind.is_multibinding());

        let candidate = match (unique.as_slice(), multibindings.is_empty()) {
            ([single], true) => Ok(Candidate::Declared(*single)),
            ([], false) => Ok(Candidate::Multibinding(multibindings)),
            _ => {
                let mut sites: Vec<_> = visible
                    .iter()
                    .map(|id| self.ctx.catalog.binding(*id).site.clone())
                    .collect();
                sites.sort();
                Err(Diagnostic::DuplicateBinding {
                    key: key.clone(),
                    component: self.ctx.component_id(component).clone(),
                    sites,
                })
            }
        };
        Some(candidate)
    }

    /// Turns a candidate into the binding of a node and the component owning it
    fn bind(
        &self,
        component: ComponentIdx,
        key: &Key,
        candidate: Candidate,
    ) -> Result<(ComponentIdx, ResolvedBinding), Vec<Diagnostic>> {
        match candidate {
            Candidate::Declared(id) => {
                let owner = validator::resolve_owner(self.ctx, component, id).map_err(|d| vec![d])?;
                let declaration = self.ctx.catalog.binding(id).clone();
                Ok((owner, ResolvedBinding::Declared(declaration)))
            }
            Candidate::Multibinding(ids) => {
                // Owned where requested, so contributions of this component are seen
                let merged = MultibindingMerger::new(&self.ctx.catalog).merge(
                    key,
                    self.ctx.component_id(component),
                    &ids,
                )?;
                Ok((component, ResolvedBinding::Multibinding(merged)))
            }
        }
    }

    fn report_unbound(&mut self, component: ComponentIdx, key: &Key) {
        let catalog = &self.ctx.catalog;
        let invisible: Vec<ComponentIdx> = catalog
            .declaring_components(key)
            .filter(|declaring| !self.ctx.tree.is_in_lineage(component, *declaring))
            .collect();

        let diagnostic = if invisible.is_empty() {
            let requested_at = match self.requested_at.last() {
                Some(site) => site.clone(),
                None => DeclarationSite::entry_point(&self.graph.component, &self.entry_point),
            };
            Diagnostic::MissingBinding {
                key: key.clone(),
                component: self.ctx.component_id(component).clone(),
                entry_point: self.entry_point.clone(),
                trace: self.trace.clone(),
                requested_at,
            }
        } else {
            let mut sites: Vec<DeclarationSite> = invisible
                .iter()
                .flat_map(|declaring| catalog.bindings_in(*declaring, key))
                .map(|id| catalog.binding(*id).site.clone())
                .collect();
            sites.sort();
            Diagnostic::InvisibleBinding {
                key: key.clone(),
                component: self.ctx.component_id(component).clone(),
                declared_in: invisible
                    .iter()
                    .map(|declaring| self.ctx.component_id(*declaring).clone())
                    .collect(),
                sites,
            }
        };
        self.diagnostics.push(diagnostic);
    }
}

/// Resolves the graph of a single component
pub(crate) fn walk(
    ctx: &ResolutionContext,
    component: ComponentIdx,
) -> (BindingGraph, Vec<Diagnostic>) {
    GraphWalker::new(ctx, component).walk(component)
}
