// Compression measurement tool for family encoding
// Prints descriptor and family sizes for a few well-known command families

use capdesc::classifier::RiskClassifier;
use capdesc::codec::ProtocolVersion;
use capdesc::core::CommandName;
use capdesc::family::{compress_family, group_families};
use capdesc::store::{DescriptorStore, DocumentationProvider, StaticProvider};
use std::sync::Arc;

const DOCS: &[(&str, &str)] = &[
    ("git", "git - the stupid content tracker"),
    ("git status", "git-status - show the working tree status of files"),
    ("git log", "git-log - show commit logs"),
    ("git push", "git-push - update remote refs over the network via ssh or http"),
    ("git clean", "git-clean - remove untracked files; delete and destroy with --force"),
    ("docker", "docker - a self-sufficient runtime for containers"),
    ("docker ps", "docker-ps - list containers"),
    ("docker rm", "docker-rm - remove one or more containers, force with -f"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let provider: Arc<dyn DocumentationProvider> = Arc::new(DOCS.iter().copied().collect::<StaticProvider>());
    let commands = DOCS
        .iter()
        .map(|(command, _)| CommandName::parse(command))
        .collect::<Result<Vec<_>, _>>()?;
    let families = group_families(&commands);

    println!("=== Family Compression Measurements ===\n");

    for version in ProtocolVersion::ALL {
        println!("## Protocol {} ({} bytes per descriptor)", version, version.layout().size());
        for (root, members) in &families {
            measure(version, &provider, root, members).await?;
        }
        println!();
    }

    Ok(())
}

async fn measure(
    version: ProtocolVersion,
    provider: &Arc<dyn DocumentationProvider>,
    root: &str,
    members: &[CommandName],
) -> anyhow::Result<()> {
    let store = DescriptorStore::new(RiskClassifier::default(), version);
    let codec = store.codec();

    let parent = codec.decode(&store.get_or_create(root, Arc::clone(provider)).await?)?;
    let mut children = Vec::with_capacity(members.len());
    for member in members {
        children.push(codec.decode(&store.get_or_create(member.as_str(), Arc::clone(provider)).await?)?);
    }

    let family = compress_family(&parent, &children)?;
    println!(
        "{:<8} | members: {} | individual: {:>4} B | family: {:>4} B | saved: {:>4} B | ratio: {:.2} | floor: {}",
        root,
        family.len(),
        family.uncompressed_size(),
        family.encoded_size(),
        family.space_saved(),
        family.compression_ratio(),
        family.risk_floor()
    );
    Ok(())
}
