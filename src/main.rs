use anyhow::Result;
use clap::Parser;
use structured_reasoner::app::{render_report, App};
use structured_reasoner::models::Config;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "structured-reasoner")]
#[command(about = "Ask a model for step-by-step math reasoning as typed JSON")]
struct CliArgs {
    /// Question to send to the model.
    #[arg(value_name = "PROMPT")]
    prompt: String,

    /// Model id; overrides OPENAI_MODEL.
    #[arg(long)]
    model: Option<String>,

    /// Dump request and response bodies.
    #[arg(long)]
    debug: bool,

    /// Ask the endpoint for strict schema enforcement.
    #[arg(long)]
    strict: bool,
}

fn default_filter(debug: bool) -> &'static str {
    if debug {
        "structured_reasoner=debug"
    } else {
        "structured_reasoner=info"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(args.debug).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match Config::from_env() {
        Ok(config) => config.with_debug(args.debug).with_strict(args.strict),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(model) = args.model {
        config = config.with_model(model);
    }

    let app = match App::new(&config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    match app.run(&args.prompt).await {
        Ok(extraction) => {
            render_report(
                &extraction,
                &mut std::io::stdout().lock(),
                &mut std::io::stderr().lock(),
            )?;
            info!("Done");
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
