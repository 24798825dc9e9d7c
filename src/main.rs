//! msv2-inference binary entry point.
//!
//! `serve` runs the HTTP service; `embed` runs the pipeline once on a local
//! file and prints the JSON record the service would return.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use msv2_inference::inference::OnnxEngine;
use msv2_inference::settings::ServeSettings;
use msv2_inference::{EmbeddingPipeline, FeatureConfig, VERSION};

/// Audio embedding service
#[derive(Parser, Debug)]
#[command(name = "msv2-inference")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP service
    Serve(ServeSettings),

    /// Embed a local audio file and print the result as JSON
    Embed {
        /// Audio file to embed
        file: PathBuf,

        /// Path to the ONNX model
        #[arg(short, long, env = "MODEL_LOCAL_PATH")]
        model: PathBuf,

        /// Request the CUDA execution provider
        #[arg(long, env = "USE_GPU", default_value_t = false, action = ArgAction::Set)]
        use_gpu: bool,
    },
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    info!("msv2-inference v{}", VERSION);

    match cli.command {
        Commands::Serve(settings) => msv2_inference::server::serve(settings).await,
        Commands::Embed {
            file,
            model,
            use_gpu,
        } => {
            let embedding = tokio::task::spawn_blocking(move || -> Result<_> {
                let engine = OnnxEngine::new(&model, use_gpu, &FeatureConfig::OPENL3)?;
                let pipeline = EmbeddingPipeline::new(Arc::new(engine));
                pipeline
                    .run(&file)
                    .with_context(|| format!("failed to embed {}", file.display()))
            })
            .await??;

            println!("{}", serde_json::to_string(&embedding)?);
            Ok(())
        }
    }
}
