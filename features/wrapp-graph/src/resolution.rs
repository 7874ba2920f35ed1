use rayon::prelude::*;
use wrapp_config::ResolverConfig;

use crate::{
    context::ResolutionContext,
    declarations::Declarations,
    errors::{Diagnostic, Diagnostics, ResolutionResult},
    graph::{BindingGraph, ResolvedGraph},
    planner, validator, walker,
};

/// Resolves the graphs of all declared components
///
/// Components are independent once the catalog is populated, so they are walked in parallel
/// unless disabled in the config. Graphs and diagnostics are reported in component pre-order
/// either way.
pub fn resolve(declarations: Declarations, config: &ResolverConfig) -> ResolutionResult {
    let ctx = ResolutionContext::new(declarations, config.clone())?;

    let mut diagnostics = Diagnostics::new();
    diagnostics.extend_unique(validator::check_component_scopes(&ctx));

    let components = ctx.tree.pre_order();
    let walked: Vec<(BindingGraph, Vec<Diagnostic>)> = if ctx.config.parallel {
        components
            .par_iter()
            .map(|component| walker::walk(&ctx, *component))
            .collect()
    } else {
        components
            .iter()
            .map(|component| walker::walk(&ctx, *component))
            .collect()
    };

    let mut graphs = Vec::with_capacity(walked.len());
    for (graph, problems) in walked {
        diagnostics.extend_unique(problems);
        graphs.push(graph);
    }

    diagnostics
        .into_result()
        .inspect_err(|d| tracing::debug!("Resolution failed with {} problems", d.len()))?;

    for graph in &mut graphs {
        validator::check_ownership(&ctx, graph)?;
        graph.order = planner::plan(graph)?;
    }

    tracing::info!("Resolved {} components", graphs.len());
    Ok(ResolvedGraph { components: graphs })
}
