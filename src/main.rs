use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use xray_diagnosis::{config::Config, config::DEFAULT_MODEL_PATH, web::serve};

#[derive(Parser)]
#[command(name = "xray-diagnosis")]
#[command(about = "Chest X-ray multi-label disease classification service")]
struct Args {
    /// Server bind address
    #[arg(long, env = "XRAY_BIND", default_value = "0.0.0.0:8501")]
    bind: String,

    /// Path to the ONNX model file
    #[arg(long, env = "XRAY_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    model_path: String,

    /// Number of worker threads
    #[arg(long, env = "XRAY_WORKERS")]
    workers: Option<usize>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, env = "XRAY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// Load the model at startup instead of on the first request
    #[arg(long)]
    preload: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting X-ray diagnosis service...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Model path: {}", args.model_path);

    let config = Config::new(
        args.bind,
        args.model_path,
        args.workers,
        args.dev,
        args.preload,
    )?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()?;

    runtime.block_on(serve(config))?;

    Ok(())
}
