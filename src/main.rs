use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use archprompt::{Config, Driver, OpenAiProvider, TerminalInput, Transcript};

/// Ask an LLM for a software architecture as JSON, then keep chatting about it.
///
/// Reads OPENAI_API_KEY (and optionally OPENAI_BASE_URL) from the environment
/// or a `.env` file.
#[derive(Parser)]
#[command(name = "archprompt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML file overriding the built-in model catalog, prompts, and limits
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model to use; must be in the catalog
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum number of messages in the conversation, prompts and replies included
    #[arg(long)]
    max_messages: Option<usize>,

    /// Re-indent JSON replies
    #[arg(long)]
    pretty: bool,

    /// No ANSI bold in section headers
    #[arg(long)]
    plain: bool,

    /// Print the model catalog and exit
    #[arg(long)]
    list_models: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env is normal; the key may come from the real environment.
    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    let config = build_config(&cli)?;

    if cli.list_models {
        print_models(&config);
        return Ok(());
    }

    let provider = OpenAiProvider::from_env(config.request_timeout())
        .context("cannot set up the completion provider")?;
    let input = TerminalInput::new()?;

    let mut transcript = Transcript::new(std::io::stdout()).pretty_json(cli.pretty);
    if cli.plain {
        transcript = transcript.plain();
    }

    info!(
        model = %config.chosen_model().name,
        endpoint = provider.url(),
        max_messages = config.max_messages(),
        "starting conversation"
    );

    let mut driver = Driver::new(&config, &provider, input, transcript);
    let reason = driver.run().await.context("conversation aborted")?;

    info!(?reason, turns = driver.conversation().len(), "conversation finished");
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Logs go to stderr; stdout carries only the transcript.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(model) = &cli.model {
        config = config.with_chosen_model(model.as_str())?;
    }
    if let Some(max_messages) = cli.max_messages {
        config = config.with_max_messages(max_messages)?;
    }

    Ok(config)
}

fn print_models(config: &Config) {
    let chosen = &config.chosen_model().name;
    for model in config.models() {
        let marker = if &model.name == chosen { "*" } else { " " };
        println!(
            "{marker} {:<24} input ${}/1K tokens  output ${}/1K tokens",
            model.name, model.input_price, model.output_price
        );
    }
}
