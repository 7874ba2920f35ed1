use std::{error::Error, process::ExitCode};

use wrapp_graph::{
    BindingDeclaration, ComponentDeclaration, DeclarationSite, Declarations, DependencyRequest,
    Diagnostics, Key, ResolvedGraph, ResolverConfig, WiringBuilder,
};

/// Resolves a declaration file, or a small coffee shop when no file is given
///
/// Usage: `wrapp-graph [declarations.json] [wrapp.option=value ...]`
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let builder = match load(std::env::args().skip(1).collect()) {
        Ok(builder) => builder,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match builder.resolve() {
        Ok(graph) => {
            print_graph(&graph);
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.diagnostics() {
                Some(diagnostics) => print_diagnostics(diagnostics),
                None => eprintln!("{e}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn load(args: Vec<String>) -> Result<WiringBuilder, Box<dyn Error>> {
    let (options, files): (Vec<String>, Vec<String>) =
        args.into_iter().partition(|arg| arg.contains('='));

    let config = ResolverConfig::from_options(
        options
            .iter()
            .filter_map(|option| option.split_once('=')),
    )?;

    let declarations = match files.first() {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => coffee_shop(),
    };

    Ok(WiringBuilder::from_declarations(declarations).with_config(config))
}

fn print_graph(graph: &ResolvedGraph) {
    for component in &graph.components {
        match &component.parent {
            Some(parent) => println!("{} (child of {})", component.component, parent),
            None => println!("{}", component.component),
        }
        for node in component.ordered_nodes() {
            match node.binding.scope() {
                Some(scope) => println!("  {} [{}] {}", node.key, node.owner, scope),
                None => println!("  {} [{}]", node.key, node.owner),
            }
        }
    }
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    eprintln!("Resolution had {} errors", diagnostics.len());
    for diagnostic in diagnostics.iter() {
        eprintln!("  {diagnostic}");
        for site in diagnostic.sites() {
            eprintln!("    at {site}");
        }
    }
}

fn coffee_shop() -> Declarations {
    let site = |module: &str, element: &str| DeclarationSite::new(module, element);

    Declarations {
        components: vec![
            ComponentDeclaration::new("CoffeeShop")
                .scoped("Singleton")
                .entry_point("maker", Key::of("CoffeeMaker")),
            ComponentDeclaration::new("Order")
                .child_of("CoffeeShop")
                .entry_point("toppings", Key::of("Set<Topping>"))
                .entry_point("maker", Key::of("CoffeeMaker")),
        ],
        bindings: vec![
            BindingDeclaration::injection(
                "CoffeeShop",
                Key::of("CoffeeMaker"),
                site("CoffeeMaker", "<init>"),
            )
            .depends_on(DependencyRequest::lazy(Key::of("Heater")))
            .depends_on(Key::of("Pump")),
            BindingDeclaration::provision(
                "CoffeeShop",
                Key::of("Heater"),
                site("DripCoffeeModule", "provideHeater"),
            )
            .scoped("Singleton"),
            BindingDeclaration::provision(
                "CoffeeShop",
                Key::of("Pump"),
                site("PumpModule", "providePump"),
            )
            .depends_on(Key::of("Heater")),
            BindingDeclaration::into_set(
                "CoffeeShop",
                Key::of("Set<Topping>"),
                site("ToppingModule", "milk"),
            ),
            BindingDeclaration::into_set(
                "Order",
                Key::of("Set<Topping>"),
                site("OrderModule", "sugar"),
            ),
        ],
    }
}
