mod config;
mod terminal_output;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use docforge_agent::ExtractionPipeline;
use docforge_config::DocForgeConfig;
use docforge_gateway::{start_server, GatewayState};
use docforge_ocr::OcrService;
use docforge_planner::provider_from_config;

use terminal_output::{section, status_line, truncate, OCR_PREVIEW_CHARS};

#[derive(Parser)]
#[command(name = "docforge")]
#[command(about = "docforge: OCR + LLM document extraction")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.docforge/config.yaml)
    #[arg(long, global = true, env = "DOCFORGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP upload server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run OCR only and print the extracted items as JSON
    Ocr {
        image: PathBuf,
        /// OCR backend to use instead of the configured one
        #[arg(short, long)]
        backend: Option<String>,
    },
    /// Run the full extraction agent on one image
    Extract {
        image: PathBuf,
        /// What to extract, e.g. "invoice total, currency and number"
        #[arg(short, long)]
        prompt: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load(cli.config).await?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.gateway.port = Some(port);
            }
            let _guard = docforge_logging::init_logger(config.logging.dir(), config.logging.level())?;
            config::log_loaded_config(&config);
            run_server(config).await?;
        }
        Commands::Ocr { image, backend } => {
            docforge_logging::init_console_logger(config.logging.level());
            config::log_loaded_config(&config);
            if let Some(backend) = backend {
                config.ocr.backend = Some(backend);
            }
            let ocr = OcrService::from_config(&config.ocr)?;
            let outcome = ocr.extract(&image).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Extract { image, prompt } => {
            docforge_logging::init_console_logger(config.logging.level());
            config::log_loaded_config(&config);
            let pipeline = build_pipeline(&config)?;
            let report = pipeline.run(&image, prompt.as_deref()).await;

            println!("{}", section("OCR OUTPUT"));
            println!("{}\n", truncate(&report.ocr_output, OCR_PREVIEW_CHARS));
            println!("{}", section("LLM RESULT"));
            println!("{}\n", report.llm_output);
            println!("status: {}", status_line(report.success));
        }
    }

    Ok(())
}

fn build_pipeline(config: &DocForgeConfig) -> Result<ExtractionPipeline> {
    let ocr = Arc::new(OcrService::from_config(&config.ocr)?);
    let provider = provider_from_config(&config.llm)?;
    Ok(ExtractionPipeline::new(ocr, provider, &config.llm))
}

async fn run_server(config: DocForgeConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.gateway.bind(), config.gateway.port())
        .parse()
        .context("Invalid gateway bind address")?;

    let pipeline = Arc::new(build_pipeline(&config)?);
    info!(
        %addr,
        ocr_backend = %pipeline.ocr().kind(),
        llm_provider = config.llm.provider(),
        model = config.llm.model(),
        upload_dir = %config.gateway.upload_dir().display(),
        "Starting docforge gateway"
    );

    let state = GatewayState::new(pipeline, config.gateway.upload_dir());
    start_server(addr, state, config.gateway.max_upload_bytes()).await
}
