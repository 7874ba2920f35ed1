use thiserror::Error;

use crate::{
    graph::ResolvedGraph,
    types::{ComponentId, DeclarationSite, Key, Scope},
};

/// Result of a resolution request
pub type ResolutionResult = Result<ResolvedGraph, ResolveError>;

/// Errors of a resolution request
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// The declarations describe an invalid graph, all problems found are listed
    #[error(transparent)]
    Invalid(#[from] Diagnostics),
    /// The declaration list itself is malformed
    #[error(transparent)]
    Malformed(#[from] DeclarationError),
    /// An internal invariant was broken
    #[error("Internal resolver invariant broken: {message}")]
    Invariant { message: String },
}
impl ResolveError {
    /// Returns the diagnostics if the graph was invalid
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            ResolveError::Invalid(diagnostics) => Some(diagnostics),
            _ => None,
        }
    }
}

/// Contract violations of the declaration list
///
/// These are not user fixable dependency problems, the declaration front-end handed over data
/// it must never produce.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("Component '{0}' is declared twice")]
    DuplicateComponent(ComponentId),
    #[error("Component '{component}' names unknown parent '{parent}'")]
    UnknownParent {
        component: ComponentId,
        parent: ComponentId,
    },
    #[error("Components {0:?} form a parent cycle")]
    ParentCycle(Vec<ComponentId>),
    #[error("Binding '{site}' is installed in unknown component '{component}'")]
    UnknownComponent {
        site: DeclarationSite,
        component: ComponentId,
    },
    #[error("Binding '{site}' for '{key}' is malformed: {reason}")]
    MalformedBinding {
        site: DeclarationSite,
        key: Key,
        reason: &'static str,
    },
}

/// A single problem of the binding graph
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Diagnostic {
    #[error("'{key}' is missing in '{component}', requested by {}", self::trace(.entry_point, .trace))]
    MissingBinding {
        key: Key,
        component: ComponentId,
        /// Entry point the walk started at
        entry_point: String,
        /// Keys requested on the way, ending with the direct requester
        trace: Vec<Key>,
        /// Site of the direct requester, the binding or the entry point
        requested_at: DeclarationSite,
    },
    #[error("'{key}' is bound multiple times in '{component}': {}", format_sites(.sites))]
    DuplicateBinding {
        key: Key,
        component: ComponentId,
        sites: Vec<DeclarationSite>,
    },
    #[error("A Circular Dependency exists in '{component}' through {}", format_cycle(.cycle))]
    IllegalCycle {
        component: ComponentId,
        /// Keys forming the cycle, the first key is repeated at the end
        cycle: Vec<Key>,
        /// Sites of the bindings on the cycle
        sites: Vec<DeclarationSite>,
    },
    #[error("Map '{key}' has multiple entries for map key '{map_key}': {}", format_sites(.sites))]
    DuplicateMultibindingKey {
        key: Key,
        map_key: String,
        sites: Vec<DeclarationSite>,
    },
    #[error("'{component}' may not use '{key}' scoped with {scope} declared at '{site}'")]
    ScopeMismatch {
        key: Key,
        component: ComponentId,
        scope: Scope,
        site: DeclarationSite,
    },
    #[error("'{key}' in '{component}' is only bound in {declared_in:?}, which it can't see")]
    InvisibleBinding {
        key: Key,
        component: ComponentId,
        declared_in: Vec<ComponentId>,
        /// Sites of the bindings it can't see
        sites: Vec<DeclarationSite>,
    },
    #[error("'{component}' repeats the scope {scope} of its ancestor '{ancestor}'")]
    RepeatedScope {
        component: ComponentId,
        ancestor: ComponentId,
        scope: Scope,
        site: DeclarationSite,
    },
    #[error("{scope} can't be applied to component '{component}'")]
    ReusableComponent {
        component: ComponentId,
        scope: Scope,
        site: DeclarationSite,
    },
}
impl Diagnostic {
    /// Checks whether both diagnostics describe the same problem
    ///
    /// Walks of different components may reach the same problem on different paths.
    /// Missing bindings ignore the path, duplicates ignore the requesting component
    /// and cycles compare regardless of their starting key.
    pub fn same_problem(&self, other: &Diagnostic) -> bool {
        match (self, other) {
            (
                Diagnostic::MissingBinding { key, component, .. },
                Diagnostic::MissingBinding {
                    key: other_key,
                    component: other_component,
                    ..
                },
            ) => key == other_key && component == other_component,
            (
                Diagnostic::DuplicateBinding { key, sites, .. },
                Diagnostic::DuplicateBinding {
                    key: other_key,
                    sites: other_sites,
                    ..
                },
            ) => key == other_key && sites == other_sites,
            (
                Diagnostic::IllegalCycle {
                    component, cycle, ..
                },
                Diagnostic::IllegalCycle {
                    component: other_component,
                    cycle: other_cycle,
                    ..
                },
            ) => component == other_component && same_cycle(cycle, other_cycle),
            _ => self == other,
        }
    }

    /// Declaration sites involved, for message formatting by the generator
    pub fn sites(&self) -> &[DeclarationSite] {
        match self {
            Diagnostic::DuplicateBinding { sites, .. }
            | Diagnostic::DuplicateMultibindingKey { sites, .. }
            | Diagnostic::IllegalCycle { sites, .. }
            | Diagnostic::InvisibleBinding { sites, .. } => sites,
            Diagnostic::MissingBinding { requested_at: site, .. }
            | Diagnostic::ScopeMismatch { site, .. }
            | Diagnostic::RepeatedScope { site, .. }
            | Diagnostic::ReusableComponent { site, .. } => std::slice::from_ref(site),
        }
    }
}

fn same_cycle(a: &[Key], b: &[Key]) -> bool {
    // Drop the closing key, compare as rotations
    let (a, b) = (&a[..a.len().saturating_sub(1)], &b[..b.len().saturating_sub(1)]);
    if a.len() != b.len() {
        return false;
    }
    if a.is_empty() {
        return true;
    }
    (0..a.len()).any(|shift| a.iter().cycle().skip(shift).take(a.len()).eq(b.iter()))
}

fn trace(entry_point: &str, keys: &[Key]) -> String {
    let mut parts = vec![entry_point.to_string()];
    parts.extend(keys.iter().map(Key::to_string));
    parts.join(" -> ")
}

fn format_cycle(cycle: &[Key]) -> String {
    let keys = cycle.iter().map(Key::to_string).collect::<Vec<_>>().join(" -> ");
    format!("{keys} - Consider using `Provider` or `Lazy`")
}

fn format_sites(sites: &[DeclarationSite]) -> String {
    sites
        .iter()
        .map(DeclarationSite::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// All problems found during one resolution
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub errors: Vec<Diagnostic>,
}
impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The binding graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}
impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the diagnostic unless the same problem was already reported
    ///
    /// Returns true if it was added
    pub fn push_unique(&mut self, diagnostic: Diagnostic) -> bool {
        if self.errors.iter().any(|e| e.same_problem(&diagnostic)) {
            return false;
        }
        self.errors.push(diagnostic);
        true
    }

    pub fn extend_unique(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push_unique(diagnostic);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.errors.iter()
    }

    /// Ok if nothing was reported
    pub fn into_result(self) -> Result<(), Diagnostics> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}
