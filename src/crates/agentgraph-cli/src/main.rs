use agentgraph_checkpoint::{CheckpointStore, FileCheckpointStore, InMemoryCheckpointStore};
use agentgraph_cli::{flows, Cli, Commands};
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let model = llm::from_env().context("failed to configure the chat model")?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Chat { input } => flows::chat(model, &input, &mut out).await?,
        Commands::Tools { input } => flows::tools(model, &input, &mut out).await?,
        Commands::React { input } => flows::react(model, &input, &mut out).await?,
        Commands::Memory {
            session_id,
            store_dir,
            first,
            second,
        } => {
            let store: Arc<dyn CheckpointStore> = match store_dir {
                Some(dir) => Arc::new(FileCheckpointStore::new(dir)),
                None => Arc::new(InMemoryCheckpointStore::new()),
            };
            let session_id = session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            tracing::info!(%session_id, "starting session");
            flows::memory(model, store, &session_id, &[&first, &second], &mut out).await?;
        }
        Commands::Handoff { input } => {
            flows::handoff(model, &input, &mut out).await?;
        }
    }

    Ok(())
}
