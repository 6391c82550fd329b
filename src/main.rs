use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use simscope::config::{load_model, LoadedModel};
use simscope::model::{ModelTree, NodeId, Tree};
use simscope::scope::{parent_zone, Scope};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "simscope")]
#[command(about = "Resolve components in scope within a simulation model tree", long_about = None)]
#[command(version)]
struct Cli {
    /// Model file (defaults to $SIMSCOPE_MODEL)
    #[arg(short, long, global = true)]
    model: Option<PathBuf>,

    /// Log cache and traversal activity
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the nearest node in scope by name or type
    Find {
        /// Path of the node to search from, e.g. .Simulation.Field
        #[arg(short, long)]
        from: String,

        /// Exact node name
        #[arg(short, long, conflicts_with = "type_name", required_unless_present = "type_name")]
        name: Option<String>,

        /// Type name; subtypes match too
        #[arg(short = 't', long = "type")]
        type_name: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every node in scope, nearest first
    FindAll {
        /// Path of the node to search from
        #[arg(short, long)]
        from: String,

        /// Restrict to a type (and its subtypes)
        #[arg(short = 't', long = "type")]
        type_name: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the zone enclosing a node
    Zone {
        /// Path of the node
        #[arg(short, long)]
        from: String,
    },

    /// Print the model tree
    Tree,

    /// Validate the model file
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let model_path = resolve_model_path(cli.model)?;

    match cli.command {
        Commands::Find {
            from,
            name,
            type_name,
            json,
        } => cmd_find(&model_path, &from, name, type_name, json),

        Commands::FindAll {
            from,
            type_name,
            json,
        } => cmd_find_all(&model_path, &from, type_name, json),

        Commands::Zone { from } => cmd_zone(&model_path, &from),

        Commands::Tree => cmd_tree(&model_path),

        Commands::Check => cmd_check(&model_path),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the model file path
///
/// Priority order:
/// 1. Explicit --model flag
/// 2. SIMSCOPE_MODEL environment variable
fn resolve_model_path(cli_model: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_model {
        return Ok(path);
    }

    if let Ok(env_path) = env::var("SIMSCOPE_MODEL") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path);
        }
        eprintln!(
            "{}",
            format!(
                "Warning: SIMSCOPE_MODEL is set but path doesn't exist: {}",
                env_path
            )
            .yellow()
        );
    }

    anyhow::bail!(
        "{}\n{}\n  {}\n  {}",
        "No model file given.".red(),
        "Try one of:".bold(),
        "1. Specify explicitly: simscope --model farm.toml find --from .Simulation --name Clock",
        "2. Set environment variable: export SIMSCOPE_MODEL=/path/to/farm.toml"
    )
}

fn open_model(path: &Path) -> Result<LoadedModel> {
    Ok(load_model(path)?)
}

fn locate(tree: &Tree, path: &str) -> Result<NodeId> {
    tree.find_by_path(path)
        .with_context(|| format!("no node at path '{path}'"))
}

#[derive(Serialize)]
struct MatchReport {
    path: String,
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    zone: bool,
}

impl MatchReport {
    fn new(tree: &Tree, node: NodeId) -> Self {
        Self {
            path: tree.full_path(node),
            name: tree.name(node).to_string(),
            type_name: tree.type_name(node).to_string(),
            zone: tree.is_zone(node),
        }
    }
}

fn print_matches(tree: &Tree, matches: &[NodeId], json: bool) -> Result<()> {
    if json {
        let reports: Vec<MatchReport> = matches
            .iter()
            .map(|&node| MatchReport::new(tree, node))
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for &node in matches {
        println!(
            "{} {} {}",
            "✓".green(),
            tree.full_path(node),
            format!("({})", tree.type_name(node)).dimmed()
        );
    }
    Ok(())
}

/// Names visible from `from` that are close to `wanted`, best first.
fn suggest_names(scope: &mut Scope<Tree>, tree: &Tree, from: NodeId, wanted: &str) -> Vec<String> {
    let mut scored: Vec<(f64, String)> = scope
        .find_all(tree, from, None)
        .into_iter()
        .map(|node| tree.name(node).to_string())
        .map(|name| (strsim::jaro_winkler(wanted, &name), name))
        .filter(|(score, _)| *score >= 0.8)
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    scored.dedup_by(|a, b| a.1 == b.1);
    scored.into_iter().take(3).map(|(_, name)| name).collect()
}

fn cmd_find(
    model_path: &Path,
    from: &str,
    name: Option<String>,
    type_name: Option<String>,
    json: bool,
) -> Result<()> {
    let model = open_model(model_path)?;
    let tree = &model.tree;
    let start = locate(tree, from)?;
    let mut scope = Scope::with_settings(model.settings());

    let found = match (&name, &type_name) {
        (Some(name), _) => scope.find_by_name(tree, start, name),
        (None, Some(type_name)) => {
            let ty = tree.types().require(type_name)?;
            scope.find_by_type(tree, start, ty)
        }
        (None, None) => anyhow::bail!("either --name or --type is required"),
    };

    match found {
        Some(node) => print_matches(tree, &[node], json),
        None => {
            let wanted = name.as_deref().or(type_name.as_deref()).unwrap_or_default();
            if json {
                println!("[]");
            } else {
                eprintln!("{} nothing named or typed '{}' in scope of {}", "✗".red(), wanted, from);
                if let Some(name) = &name {
                    let suggestions = suggest_names(&mut scope, tree, start, name);
                    if !suggestions.is_empty() {
                        eprintln!("  Did you mean: {}", suggestions.join(", ").yellow());
                    }
                }
            }
            std::process::exit(1);
        }
    }
}

fn cmd_find_all(
    model_path: &Path,
    from: &str,
    type_name: Option<String>,
    json: bool,
) -> Result<()> {
    let model = open_model(model_path)?;
    let tree = &model.tree;
    let start = locate(tree, from)?;
    let mut scope = Scope::with_settings(model.settings());

    let ty = type_name
        .as_deref()
        .map(|name| tree.types().require(name))
        .transpose()?;
    let matches = scope.find_all(tree, start, ty);

    print_matches(tree, &matches, json)?;
    if !json {
        println!();
        println!("{} {} in scope", "Summary:".bold(), matches.len());
    }
    Ok(())
}

fn cmd_zone(model_path: &Path, from: &str) -> Result<()> {
    let model = open_model(model_path)?;
    let tree = &model.tree;
    let start = locate(tree, from)?;

    match parent_zone(tree, start) {
        Ok(zone) => {
            println!("{} {}", "✓".green(), tree.full_path(zone));
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            std::process::exit(1);
        }
    }
}

fn cmd_tree(model_path: &Path) -> Result<()> {
    let model = open_model(model_path)?;
    let tree = &model.tree;

    let mut stack = vec![(model.root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        let mut markers = Vec::new();
        if tree.is_boundary_root(node) {
            markers.push("boundary".cyan().to_string());
        }
        if tree.is_zone(node) {
            markers.push("zone".yellow().to_string());
        }
        let markers = if markers.is_empty() {
            String::new()
        } else {
            format!(" [{}]", markers.join(", "))
        };

        println!(
            "{}{} {}{}",
            "  ".repeat(depth),
            tree.name(node).bold(),
            format!("({})", tree.type_name(node)).dimmed(),
            markers
        );

        stack.extend(tree.children(node).iter().rev().map(|&child| (child, depth + 1)));
    }
    Ok(())
}

fn cmd_check(model_path: &Path) -> Result<()> {
    let model = open_model(model_path)?;
    let tree = &model.tree;

    println!("{} {}", "✓".green(), model_path.display());
    if !model.config.meta.name.is_empty() {
        println!("  Name: {}", model.config.meta.name);
    }
    if let Some(description) = &model.config.meta.description {
        println!("  Description: {}", description);
    }
    println!("  Nodes: {}", tree.len());
    println!("  Types: {}", tree.types().len());
    match tree.owning_root_identity(model.root) {
        Some(session) => println!("  Session: {}", session),
        None => println!(
            "  {}",
            "No session root: lookups will not be cached".yellow()
        ),
    }
    Ok(())
}
