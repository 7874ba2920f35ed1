//! Wrapp Graph resolves compile time dependency injection declarations into validated binding
//! graphs.
//!
//! A front-end hands over a flat list of [ComponentDeclaration]s and [BindingDeclaration]s.
//! The resolver then:
//! 1. Builds the component tree and the binding catalog
//! 2. Walks every component from its entry points, merging multibinding contributions on the way
//! 3. Reports every missing, duplicate, invisible or mis-scoped binding and every illegal cycle
//! 4. Plans a deterministic emission order for each valid component graph
//!
//! # Examples
//!
//! ```rust
//! use wrapp_graph::{
//!     resolve, BindingDeclaration, ComponentDeclaration, DeclarationSite, Declarations, Key,
//!     ResolverConfig,
//! };
//!
//! let site = |element: &str| DeclarationSite::new("CoffeeModule", element);
//! let declarations = Declarations {
//!     components: vec![
//!         ComponentDeclaration::new("CoffeeShop").entry_point("maker", Key::of("CoffeeMaker")),
//!     ],
//!     bindings: vec![
//!         BindingDeclaration::injection("CoffeeShop", Key::of("CoffeeMaker"), site("CoffeeMaker"))
//!             .depends_on(Key::of("Heater")),
//!         BindingDeclaration::provision("CoffeeShop", Key::of("Heater"), site("provideHeater")),
//!     ],
//! };
//!
//! let graph = resolve(declarations, &ResolverConfig::default()).unwrap();
//! let shop = graph.component(&"CoffeeShop".into()).unwrap();
//! let order: Vec<String> = shop.ordered_keys().iter().map(|k| k.to_string()).collect();
//! assert_eq!(order, vec!["Heater", "CoffeeMaker"]);
//! ```
//!
//! Wrapp Graph consists of the following components:
//!
//! 1. Types & Declarations - keys, scopes, requests and the declaration input
//! 2. Components & Catalog - the component tree and the bindings visible from each component
//! 3. Multibinding - merging of set and map contributions
//! 4. Walker - builds the graph of a single component
//! 5. Validator - scope, cycle and ownership checks
//! 6. Planner - emission order of a validated graph
//! 7. Builder - chained declaration api on top of [resolve]

pub mod builder;
pub mod catalog;
pub mod components;
pub mod context;
pub mod declarations;
pub mod errors;
pub mod graph;
pub mod multibinding;
pub mod planner;
pub mod resolution;
pub mod types;
pub mod validator;
mod walker;

pub use builder::WiringBuilder;
pub use declarations::{
    BindingDeclaration, BindingKind, ComponentDeclaration, Declarations, EntryPoint,
    MultibindingType,
};
pub use errors::{DeclarationError, Diagnostic, Diagnostics, ResolutionResult, ResolveError};
pub use graph::{
    BindingGraph, Edge, Node, NodeId, ResolvedBinding, ResolvedEntryPoint, ResolvedGraph,
};
pub use multibinding::SyntheticMultibinding;
pub use planner::plan;
pub use resolution::resolve;
pub use types::{ComponentId, DeclarationSite, DependencyRequest, Key, RequestKind, Scope};
pub use wrapp_config::{ResolverConfig, ValidationLevel};
