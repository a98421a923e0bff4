//! Concord CLI
//!
//! - `glom`: cluster crawler equivalence groups into the synonym cache
//! - `model`: inspect the concept model
//! - `graph build`: build a TypeGraph snapshot from transition records
//! - `transitions`: enumerate conversion programs for a typed query

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use concord_glom::{dump, JsonFileCache, LabeledId, Partition};
use concord_model::ConceptModel;
use concord_typegraph::{MemoryGraphStore, TransitionQuery, TypeGraph};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

mod config;

use config::ConcordConfig;

#[derive(Parser)]
#[command(name = "concord")]
#[command(author, version, about = "Concord: identifier equivalence and typed translation graph")]
struct Cli {
    /// Configuration file (defaults to ./concord.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge equivalence groups and dump the classes into the synonym cache.
    ///
    /// Inputs are JSON files holding an array of groups, each an array of
    /// identifiers. Directories are walked for `*.json`.
    Glom {
        inputs: Vec<PathBuf>,
        /// Extra unique prefixes on top of the configured ones
        #[arg(long = "unique-prefix")]
        unique_prefixes: Vec<String>,
    },

    /// Print the concept model: roots, leaves and the prefix table.
    Model {
        #[arg(long)]
        json: bool,
    },

    /// TypeGraph snapshot commands.
    Graph {
        #[command(subcommand)]
        command: GraphCommands,
    },

    /// Print the programs matching a query such as `disease,gene,*`.
    Transitions {
        query: String,
        /// Snapshot to read (defaults to `graph_path`)
        #[arg(long)]
        graph: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum GraphCommands {
    /// Build a snapshot from a JSON array of transition records.
    Build {
        edges: PathBuf,
        /// Output snapshot (defaults to `graph_path`)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// One transition as read by `graph build`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TransitionRecord {
    from: String,
    to: String,
    #[serde(default = "default_rel_name")]
    rel_name: String,
    predicate: String,
    op: String,
}

fn default_rel_name() -> String {
    "translation".to_string()
}

#[derive(Serialize)]
struct ModelSummary<'a> {
    name: &'a str,
    roots: Vec<&'a str>,
    leaves: Vec<&'a str>,
    prefixes: Vec<(&'a str, &'a str)>,
    relationships: Vec<(&'a str, &'a str)>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConcordConfig::resolve(cli.config.as_deref())?;
    init_logging(&config, cli.verbose)?;

    match cli.command {
        Commands::Glom {
            inputs,
            unique_prefixes,
        } => cmd_glom(&config, &inputs, &unique_prefixes),
        Commands::Model { json } => cmd_model(&config, json),
        Commands::Graph { command } => match command {
            GraphCommands::Build { edges, out } => {
                let out = out.unwrap_or_else(|| config.graph_path.clone());
                cmd_graph_build(&config, &edges, &out)
            }
        },
        Commands::Transitions { query, graph } => {
            let graph = graph.unwrap_or_else(|| config.graph_path.clone());
            cmd_transitions(&config, &query, &graph)
        }
    }
}

fn init_logging(config: &ConcordConfig, verbose: bool) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        config.log_level()?
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_model(config: &ConcordConfig) -> Result<ConceptModel> {
    ConceptModel::load(&config.model.name, &config.loader_registry())
        .with_context(|| format!("failed to load model `{}`", config.model.name))
}

// ============================================================================
// glom
// ============================================================================

fn cmd_glom(config: &ConcordConfig, inputs: &[PathBuf], extra_prefixes: &[String]) -> Result<()> {
    if inputs.is_empty() {
        bail!("no input files given");
    }
    let mut prefixes = config.unique_prefixes();
    prefixes.extend(extra_prefixes.iter().map(String::as_str));

    let mut cache: JsonFileCache<LabeledId> = JsonFileCache::open(&config.cache_path)?;
    let (partition, written) = glom_files(&mut cache, &group_files(inputs)?, &prefixes)?;
    cache.flush()?;
    println!(
        "{} {} classes / {} keys -> {}",
        "wrote".green().bold(),
        partition.class_count(),
        written,
        config.cache_path.display().to_string().bold()
    );
    Ok(())
}

/// Merge the groups in `files` on top of the classes already in `cache`
/// and write the result back. Returns the partition and the number of keys
/// written.
///
/// Cached classes are seeded first, so identifiers from earlier runs take
/// part in joins and unique-prefix checks.
fn glom_files(
    cache: &mut JsonFileCache<LabeledId>,
    files: &[PathBuf],
    prefixes: &[&str],
) -> Result<(Partition<LabeledId>, usize)> {
    let mut partition: Partition<LabeledId> = Partition::new();
    let seeded = partition.merge(cache.classes(), &[]);
    tracing::debug!(classes = seeded.accepted, "seeded partition from cache");

    for file in files {
        let text = fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let groups: Vec<Vec<String>> = serde_json::from_str(&text)
            .with_context(|| format!("{} is not a JSON array of groups", file.display()))?;
        let groups = groups
            .into_iter()
            .map(|group| group.into_iter().map(LabeledId::new));
        let report = partition.merge(groups, prefixes);
        println!(
            "{} {} ({} accepted, {} rejected, {} empty)",
            "Merged".green().bold(),
            file.display(),
            report.accepted,
            report.rejected,
            report.empty
        );
    }

    let written = dump(&partition, cache)?;
    Ok((partition, written))
}

/// Input files in argument order; directories contribute their `*.json`
/// files sorted by path.
fn group_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            out.push(input.clone());
            continue;
        }
        let mut found = Vec::new();
        for entry in WalkDir::new(input).follow_links(false) {
            let entry = entry.with_context(|| format!("failed to walk {}", input.display()))?;
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
                found.push(path.to_path_buf());
            }
        }
        found.sort();
        out.extend(found);
    }
    Ok(out)
}

// ============================================================================
// model
// ============================================================================

fn cmd_model(config: &ConcordConfig, json: bool) -> Result<()> {
    let model = load_model(config)?;
    let summary = ModelSummary {
        name: model.name(),
        roots: model.get_roots().into_iter().map(|c| c.name.as_str()).collect(),
        leaves: model.get_leaves().into_iter().map(|c| c.name.as_str()).collect(),
        prefixes: model
            .items()
            .iter()
            .flat_map(|c| c.id_prefixes.iter().map(|p| (p.as_str(), c.name.as_str())))
            .collect(),
        relationships: model
            .relationships()
            .iter()
            .map(|r| (r.name.as_str(), r.identifier.as_str()))
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{} {}", "Model".green().bold(), summary.name.bold());
    println!("  {} {}", "roots:".cyan(), summary.roots.join(", "));
    println!("  {} {}", "leaves:".cyan(), summary.leaves.join(", "));
    println!("  {}", "prefixes:".cyan());
    for (prefix, concept) in &summary.prefixes {
        println!("    {prefix:<12} {concept}");
    }
    println!("  {}", "relationships:".cyan());
    for (name, identifier) in &summary.relationships {
        println!("    {name:<32} {identifier}");
    }
    Ok(())
}

// ============================================================================
// graph / transitions
// ============================================================================

fn cmd_graph_build(config: &ConcordConfig, edges: &Path, out: &Path) -> Result<()> {
    let model = Arc::new(load_model(config)?);
    let text = fs::read_to_string(edges)
        .with_context(|| format!("failed to read {}", edges.display()))?;
    let records: Vec<TransitionRecord> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of transitions", edges.display()))?;

    let mut graph = TypeGraph::new(model);
    for record in &records {
        graph
            .add_edge(&record.from, &record.to, &record.rel_name, &record.predicate, &record.op)
            .with_context(|| format!("adding {} -> {} ({})", record.from, record.to, record.op))?;
    }
    graph.store().save(out)?;
    println!(
        "{} {} nodes / {} edges -> {}",
        "wrote".green().bold(),
        graph.store().node_count(),
        graph.store().edge_count(),
        out.display().to_string().bold()
    );
    Ok(())
}

fn cmd_transitions(config: &ConcordConfig, query: &str, graph_path: &Path) -> Result<()> {
    let query: TransitionQuery = query
        .parse()
        .with_context(|| format!("malformed query `{query}`"))?;
    let store = MemoryGraphStore::load(graph_path)
        .with_context(|| format!("failed to load snapshot {}", graph_path.display()))?;
    let graph = TypeGraph::with_store(store, Arc::new(load_model(config)?));

    let programs = graph.try_get_transitions(&query)?;
    if programs.is_empty() {
        eprintln!("{} no programs for {}", "info:".yellow().bold(), query);
    }
    println!("{}", serde_json::to_string_pretty(&programs)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_glom::SynonymCache;

    #[test]
    fn test_group_files_walks_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("b.json"), "[]").unwrap();
        fs::write(nested.join("a.json"), "[]").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let single = dir.path().join("b.json");
        let files = group_files(&[single.clone(), dir.path().to_path_buf()]).unwrap();
        assert_eq!(files, vec![single.clone(), single, nested.join("a.json")]);
    }

    fn class_of(cache: &JsonFileCache<LabeledId>, key: &str) -> Vec<String> {
        cache
            .get(key)
            .unwrap()
            .unwrap_or_default()
            .into_iter()
            .map(|id| id.identifier)
            .collect()
    }

    #[test]
    fn test_second_glom_run_extends_cached_classes() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("synonyms.json");
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");
        fs::write(&first, r#"[["MONDO:1","DOID:1"],["HGNC:1","NCBIGene:1"]]"#).unwrap();
        fs::write(&second, r#"[["DOID:1","UMLS:1"],["NCBIGene:1","HGNC:2"]]"#).unwrap();

        let mut cache = JsonFileCache::open(&cache_path).unwrap();
        glom_files(&mut cache, &[first], &["HGNC"]).unwrap();
        cache.flush().unwrap();

        let mut cache = JsonFileCache::open(&cache_path).unwrap();
        let (partition, _) = glom_files(&mut cache, &[second], &["HGNC"]).unwrap();
        cache.flush().unwrap();
        assert_eq!(partition.class_count(), 2);

        let cache: JsonFileCache<LabeledId> = JsonFileCache::open(&cache_path).unwrap();
        let disease = vec!["DOID:1", "MONDO:1", "UMLS:1"];
        assert_eq!(class_of(&cache, "MONDO:1"), disease);
        assert_eq!(class_of(&cache, "UMLS:1"), disease);
        assert_eq!(class_of(&cache, "NCBIGENE:1"), vec!["HGNC:1", "NCBIGene:1"]);
        assert_eq!(class_of(&cache, "HGNC:1"), vec!["HGNC:1", "NCBIGene:1"]);
        assert!(class_of(&cache, "HGNC:2").is_empty());
    }

    #[test]
    fn test_transition_record_rel_name_defaults() {
        let record: TransitionRecord = serde_json::from_str(
            r#"{"from": "HGNC", "to": "UniProtKB", "predicate": "gene_to_gene_product", "op": "hgnc.get_uniprot"}"#,
        )
        .unwrap();
        assert_eq!(record.rel_name, "translation");
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["concord", "graph", "build", "edges.json", "-o", "g.bin"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Graph {
                command: GraphCommands::Build { .. }
            }
        ));
        let cli = Cli::try_parse_from(["concord", "-v", "transitions", "disease,gene"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Transitions { .. }));
    }
}
