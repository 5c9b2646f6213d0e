//! CLI entry point for capdesc
//!
//! Provides a command-line interface for classifying commands, encoding
//! and decoding descriptors, and compressing command families.

use clap::{Parser, Subcommand};
use colored::*;
use capdesc::classifier::{Classification, RiskClassifier, RuleLayer, RuleSet};
use capdesc::codec::{risk_or_conservative, CommandDescriptor, DescriptorCodec, ProtocolVersion};
use capdesc::core::{CommandName, RiskLevel};
use capdesc::family::{compress_family, group_families, CommandFamily};
use capdesc::store::{DescriptorStore, DocumentationProvider, ManPageProvider, RetryPolicy};
use log::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "capdesc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Extra rule layer (TOML) applied on top of the built-in rules
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Use the enhanced rule set
    #[arg(long, global = true)]
    enhanced: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a command from its documentation
    Classify {
        /// Command name, e.g. "rm" or "git push"
        command: String,

        /// Read documentation from a file instead of the man page
        #[arg(short, long)]
        doc: Option<PathBuf>,
    },

    /// Resolve a command and print its descriptor bytes
    Encode {
        /// Command name, e.g. "rm" or "git push"
        command: String,

        /// Protocol version (v1, v2, v3)
        #[arg(short, long, default_value = "v2")]
        protocol: String,
    },

    /// Decode a hex descriptor
    Decode {
        /// Descriptor bytes as hex; the version is taken from the length
        hex: String,
    },

    /// Group commands into families and compress each,
    /// e.g. `capdesc family "git status" "git log" "docker ps"`
    Family {
        /// Commands to group by root tool
        #[arg(required = true)]
        commands: Vec<String>,

        /// Protocol version (v1, v2, v3)
        #[arg(short, long, default_value = "v2")]
        protocol: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else if cli.quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Warn
    };
    // RUST_LOG still wins over the flags
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let classifier = RiskClassifier::new(load_rules(cli.rules.as_deref(), cli.enhanced)?);

    match cli.command {
        Commands::Classify { command, doc } => classify(&classifier, &command, doc.as_deref()).await?,
        Commands::Encode { command, protocol } => encode(classifier, &command, &protocol).await?,
        Commands::Decode { hex } => decode(&hex)?,
        Commands::Family { commands, protocol } => family(classifier, &commands, &protocol).await?,
    }

    Ok(())
}

/// Built-in rules plus an optional TOML layer
fn load_rules(rules: Option<&Path>, enhanced: bool) -> anyhow::Result<RuleSet> {
    let base = if enhanced { RuleSet::enhanced() } else { RuleSet::base() };
    let Some(path) = rules else {
        return Ok(base);
    };

    let path = expand_path(path)?;
    let layer = RuleLayer::from_file(&path)?;
    println!("{} Loaded rule layer: {}", "→".cyan(), path.display());
    Ok(base.with_layer(layer)?)
}

/// Expands `~` in a user-supplied path
fn expand_path(path: &Path) -> anyhow::Result<PathBuf> {
    let expanded = shellexpand::tilde(
        path.to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid path encoding"))?,
    );
    Ok(PathBuf::from(expanded.as_ref()))
}

fn parse_protocol(name: &str) -> anyhow::Result<ProtocolVersion> {
    ProtocolVersion::from_name(name).ok_or_else(|| anyhow::anyhow!("Unknown protocol version: {} (expected v1, v2 or v3)", name))
}

fn colour_risk(risk: RiskLevel) -> ColoredString {
    let label = risk.to_string();
    match risk {
        RiskLevel::Safe => label.green().bold(),
        RiskLevel::LowRisk => label.green(),
        RiskLevel::MediumRisk => label.yellow(),
        RiskLevel::HighRisk => label.red(),
        RiskLevel::Critical => label.red().bold(),
    }
}

/// Classify a single command and print the reasoning
async fn classify(classifier: &RiskClassifier, command: &str, doc: Option<&Path>) -> anyhow::Result<()> {
    let name = CommandName::parse(command)?;

    let documentation = match doc {
        Some(path) => {
            let path = expand_path(path)?;
            let content = fs::read_to_string(&path)
                .map_err(|e| anyhow::anyhow!("Failed to read file: {}", e))?;
            println!("{} Reading documentation: {}", "→".cyan(), path.display());
            Some(content)
        }
        None => {
            println!("{} Fetching man page for {}", "→".cyan(), name.as_str().bold());
            let provider = ManPageProvider::new();
            RetryPolicy::default()
                .fetch(&provider as &dyn DocumentationProvider, name.as_str())
                .await
        }
    };

    let classification = classifier.classify(&name, documentation.as_deref());
    print_classification(&classification);
    Ok(())
}

fn print_classification(classification: &Classification) {
    println!(
        "\n{} {}  {}",
        classification.command.as_str().cyan().bold(),
        colour_risk(classification.risk),
        format!("({})", classification.risk.agent_action()).dimmed()
    );

    if !classification.is_verified() {
        println!("{}", "⚠ No documentation available: tier is an assumption".yellow());
    }

    println!("  {} {}", "capabilities:".dimmed(), classification.capabilities);
    println!("  {} {}", "rationale:".dimmed(), classification.rationale);

    for (risk, keywords) in classification.matched_keywords.iter().rev() {
        if keywords.is_empty() {
            continue;
        }
        println!("  {} {} → {}", "matched".dimmed(), colour_risk(*risk), keywords.join(", "));
    }

    for option in &classification.dangerous_options {
        println!("  {} {}", "option:".dimmed(), option.magenta());
    }
}

/// Resolve a command through the store and print its bytes
async fn encode(classifier: RiskClassifier, command: &str, protocol: &str) -> anyhow::Result<()> {
    let version = parse_protocol(protocol)?;
    let store = DescriptorStore::new(classifier, version);

    let bytes = store.get_or_create(command, Arc::new(ManPageProvider::new())).await?;
    let descriptor = store.codec().decode(&bytes)?;

    println!("{} {}", "✓".green(), descriptor);
    println!("{}", bytes.to_hex().bold());
    Ok(())
}

/// Decode a hex descriptor; a failure reports the conservative tier
fn decode(input: &str) -> anyhow::Result<()> {
    let bytes = hex::decode(input.trim()).map_err(|e| anyhow::anyhow!("Invalid hex: {}", e))?;

    let Some(version) = ProtocolVersion::from_size(bytes.len()) else {
        println!(
            "{} No protocol version is {} bytes long",
            "✗".red().bold(),
            bytes.len()
        );
        println!("Treat as {}", colour_risk(RiskLevel::MOST_CONSERVATIVE));
        std::process::exit(1);
    };

    let result = DescriptorCodec::new(version).decode(&bytes);
    let risk = risk_or_conservative(&result);

    match result {
        Ok(descriptor) => {
            println!("{} {}", "✓".green(), descriptor);
            println!("  {} {}", "action:".dimmed(), risk.agent_action());
            println!("  {} {:#010x}", "checksum:".dimmed(), descriptor.checksum());
        }
        Err(err) => {
            println!("{} {}", "✗".red().bold(), err);
            println!("Treat as {}", colour_risk(risk));
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Group commands by root tool, then resolve and compress each family
async fn family(classifier: RiskClassifier, commands: &[String], protocol: &str) -> anyhow::Result<()> {
    let version = parse_protocol(protocol)?;
    let store = DescriptorStore::new(classifier, version);
    let provider: Arc<dyn DocumentationProvider> = Arc::new(ManPageProvider::new());

    let names = commands
        .iter()
        .map(|command| CommandName::parse(command))
        .collect::<Result<Vec<_>, _>>()?;
    let families = group_families(&names);

    let mut saved = 0;
    for (root, members) in &families {
        let family = resolve_family(&store, &provider, root, members).await?;
        saved += family.space_saved();

        println!(
            "{} Family {} with {} member{}",
            "✓".green(),
            root.cyan().bold(),
            family.len(),
            if family.len() == 1 { "" } else { "s" }
        );
        for (member, descriptor) in members.iter().zip(family.expand()) {
            println!("  {} {} {}", member, colour_risk(descriptor.risk()), descriptor.capabilities());
        }
        println!(
            "  {} {} bytes (vs {} individually, ratio {:.2}, {} saved)",
            "encoded:".dimmed(),
            family.encoded_size(),
            family.uncompressed_size(),
            family.compression_ratio(),
            family.space_saved()
        );
        println!("  {} {}", "risk floor:".dimmed(), colour_risk(family.risk_floor()));
        println!("  {} {}", "common:".dimmed(), family.common_capabilities());
        println!("  {}\n", hex::encode(family.to_bytes()).dimmed());
    }

    println!(
        "{} {} famil{}, {} bytes saved",
        "✓".green().bold(),
        families.len(),
        if families.len() == 1 { "y" } else { "ies" },
        saved
    );
    Ok(())
}

/// Resolves a root tool and its members concurrently, then compresses them
async fn resolve_family(
    store: &DescriptorStore,
    provider: &Arc<dyn DocumentationProvider>,
    root: &str,
    members: &[CommandName],
) -> anyhow::Result<CommandFamily> {
    let mut names = vec![root.to_string()];
    names.extend(members.iter().map(|member| member.as_str().to_string()));

    let handles: Vec<_> = names
        .into_iter()
        .map(|name| {
            let store = store.clone();
            let provider = Arc::clone(provider);
            tokio::spawn(async move { store.get_or_create(&name, provider).await })
        })
        .collect();

    let mut descriptors: Vec<CommandDescriptor> = Vec::with_capacity(handles.len());
    for handle in handles {
        let bytes = handle.await??;
        descriptors.push(store.codec().decode(&bytes)?);
    }

    let (parent, children) = descriptors
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("Family {} has no parent", root))?;
    Ok(compress_family(parent, children)?)
}
