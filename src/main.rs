//! Phylocount CLI
//!
//! Inspects trees and the per-edge family size distributions of rate models.

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use phylocount::config::Config;
use phylocount::model::{IndexedTree, Phylogeny};
use phylocount::model::traversal::post_order;
use phylocount::newick::{NewickFormat, NewickParser};
use phylocount::parser::{ByteParser, InMemoryByteSource};
use phylocount::rates::transient::{transient0, transient1};
use phylocount::rates::{BirthDeathModel, RateDimension, RateVariation, read_rates_file};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "phylocount")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Phylogenies and birth-death models of gene family sizes", long_about = None)]
struct Args {
    /// TOML configuration for Newick parsing and writing
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a tree and print it as Newick
    Show {
        /// Newick file; the first tree is used
        tree: PathBuf,

        /// Reroot at the internal node with this name
        #[arg(long)]
        reroot: Option<String>,

        /// Draw the tree with node indices instead of printing Newick
        #[arg(long)]
        draw: bool,
    },
    /// Print the transient distributions of every edge
    Transients {
        /// Newick file; the first tree is used
        tree: PathBuf,

        /// Rate file matching the tree
        rates: PathBuf,

        /// Rate class
        #[arg(long, default_value = "0")]
        class: usize,

        /// Probability that a copy at the end of an edge leaves no observed descendants
        #[arg(long, default_value = "0.0")]
        extinction: f64,
    },
    /// Print the rate class table
    Classes {
        /// Newick file; the first tree is used
        tree: PathBuf,

        /// Rate file matching the tree
        rates: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_target(false)
        .init();

    let config = match &args.config {
        Some(path) => Config::from_file(path).with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    debug!(?config, "Configuration");

    match args.command {
        Command::Show { tree, reroot, draw } => show(&config, &tree, reroot.as_deref(), draw),
        Command::Transients {
            tree,
            rates,
            class,
            extinction,
        } => transients(&config, &tree, &rates, class, extinction),
        Command::Classes { tree, rates } => classes(&config, &tree, &rates),
    }
}

/// First tree of a Newick file, parsed with the configured options.
fn read_tree(config: &Config, path: &Path) -> Result<Phylogeny> {
    let source =
        InMemoryByteSource::from_file(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut trees = NewickParser::from_config(&config.newick).into_iter(ByteParser::new(source));
    let tree = trees
        .next()
        .ok_or_else(|| anyhow!("No tree in {}", path.display()))?
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    info!(
        path = %path.display(),
        leaves = tree.num_leaves(),
        nodes = tree.num_nodes(),
        "Read tree"
    );
    Ok(tree)
}

fn read_variation(config: &Config, tree_path: &Path, rates_path: &Path) -> Result<RateVariation> {
    let tree = read_tree(config, tree_path)?;
    read_rates_file(rates_path, tree).with_context(|| format!("Failed to read rates {}", rates_path.display()))
}

fn show(config: &Config, path: &Path, reroot: Option<&str>, draw: bool) -> Result<()> {
    let mut tree = read_tree(config, path)?;
    if let Some(name) = reroot {
        let index = tree
            .index_of_name(name)
            .ok_or_else(|| anyhow!("No node named '{}'", name))?;
        tree.reroot(index).with_context(|| format!("Cannot reroot at '{}'", name))?;
    }

    println!("leaves\t{}", tree.num_leaves());
    println!("nodes\t{}", tree.num_nodes());
    println!("edges\t{}", tree.num_edges());
    if tree.has_length() {
        println!("length\t{}", tree.total_length());
    }
    if draw {
        print!("{}", tree);
    } else {
        println!("{}", tree.to_newick(&NewickFormat::from_config(&config.format)));
    }
    Ok(())
}

fn transients(config: &Config, tree: &Path, rates: &Path, class: usize, extinction: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&extinction) {
        bail!("Extinction probability must be in [0, 1], got {}", extinction);
    }
    let variation = read_variation(config, tree, rates)?;
    let model = variation.class_model(class)?;
    let tree = model.tree();

    println!("# class {}: {}", class, model.scaling());
    println!("node\tname\tlength\ttransient0\ttransient1");
    for edge in post_order(tree).filter(|&index| !tree.is_root(index)) {
        let xenologs = transient0(&model, edge, extinction)?;
        let inparalogs = transient1(&model, edge, extinction)?;
        println!(
            "{}\t{}\t{}\t{}\t{}",
            edge,
            tree.name(edge).unwrap_or(""),
            model.edge_length(edge),
            xenologs,
            inparalogs
        );
    }
    Ok(())
}

fn classes(config: &Config, tree: &Path, rates: &Path) -> Result<()> {
    let variation = read_variation(config, tree, rates)?;

    for dimension in RateDimension::FILE_ORDER {
        println!(
            "# {}: {} categories, alpha {}, forbidden {}, multipliers {:?}",
            dimension,
            variation.num_gamma_categories(dimension),
            variation.alpha(dimension),
            variation.forbidden(dimension),
            variation.multipliers(dimension)
        );
    }
    println!("class\tduplication\tloss\tgain\tlength\tprobability");
    for class in 0..variation.num_classes() {
        let indices = variation.class_indices(class)?;
        let scaling = variation.class_scaling(class)?;
        println!(
            "{}\t{}:{:.4}\t{}:{:.4}\t{}:{:.4}\t{}:{:.4}\t{}",
            class,
            indices.duplication,
            scaling.duplication,
            indices.loss,
            scaling.loss,
            indices.gain,
            scaling.gain,
            indices.length,
            scaling.length,
            variation.class_probability(class)?
        );
    }
    Ok(())
}
