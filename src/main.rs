use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ghostreply::generator::ReplyGenerator;
use ghostreply::session::{LineSource, ReaderInput, Readline};
use ghostreply::sink::ReplySink;
use ghostreply::{
    AppleScriptSink, Blocklist, ChatDb, Config, DryRunSink, OpenAiGenerator, Overrides,
    SessionController, SessionState,
};

/// ghostreply - draft and send iMessage replies with a language model
#[derive(Parser)]
#[command(name = "ghostreply", version, about)]
struct Cli {
    /// Correspondent phone number or e-mail handle
    #[arg(short, long, env = "TARGET_PHONE_NUMBER")]
    target: Option<String>,

    /// Correspondent name used in prompts
    #[arg(short, long, env = "FRIEND_NAME")]
    name: Option<String>,

    /// Path to the Messages database
    #[arg(long, env = "CHAT_DB_PATH")]
    chat_db: Option<PathBuf>,

    /// Default completion model
    #[arg(short, long, env = "GHOSTREPLY_MODEL")]
    model: Option<String>,

    /// Default number of recent messages to include
    #[arg(long, env = "GHOSTREPLY_MAX_MESSAGES")]
    max_messages: Option<u32>,

    /// Default text appended to every prompt
    #[arg(long, env = "GHOSTREPLY_PROMPT_EXTENSION")]
    prompt_extension: Option<String>,

    /// `OpenAI` API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// `OpenAI` organization ID
    #[arg(long, env = "OPENAI_ORGANIZATION_ID")]
    organization: Option<String>,

    /// OpenAI-compatible API root
    #[arg(long, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,

    /// File with extra blocked words, one per line
    #[arg(long, env = "GHOSTREPLY_BLOCKLIST")]
    blocklist: Option<PathBuf>,

    /// Seconds allowed for one send
    #[arg(long, env = "GHOSTREPLY_SEND_TIMEOUT")]
    send_timeout: Option<u64>,

    /// Log replies instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Config file (defaults to ~/.config/ghostreply/config.toml)
    #[arg(short, long, env = "GHOSTREPLY_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            correspondent_id: self.target.clone(),
            correspondent_name: self.name.clone(),
            chat_db_path: self.chat_db.clone(),
            model: self.model.clone(),
            max_messages: self.max_messages,
            prompt_extension: self.prompt_extension.clone(),
            api_key: self.api_key.clone(),
            organization: self.organization.clone(),
            base_url: self.base_url.clone(),
            blocklist_path: self.blocklist.clone(),
            send_timeout_secs: self.send_timeout,
            dry_run: self.dry_run,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,ghostreply=info",
        1 => "info,ghostreply=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            eprintln!("ghostreply: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.overrides(), cli.config.as_deref())?;
    tracing::debug!(?config, "loaded configuration");

    let mut blocklist = Blocklist::embedded();
    if let Some(path) = &config.blocklist_path {
        blocklist.extend_from_file(path)?;
    }

    let store = ChatDb::open(&config.chat_db_path)?;

    let generator: Arc<dyn ReplyGenerator> = Arc::new(OpenAiGenerator::new(
        config.api_key,
        Some(config.base_url.clone()),
        config.organization.clone(),
        config.request_timeout,
    )?);

    let sink: Arc<dyn ReplySink> = if config.dry_run {
        tracing::info!("dry run enabled, replies will not be sent");
        Arc::new(DryRunSink)
    } else {
        Arc::new(AppleScriptSink::new(
            &config.correspondent.id,
            config.send_timeout,
        ))
    };

    let state = SessionState::new(
        config.model.clone(),
        config.max_messages,
        config.prompt_extension.clone(),
    );

    println!(
        "Talking with {} ({}). Type `help` for commands.",
        config.correspondent.name, config.correspondent.id
    );

    let mut controller = SessionController::new(
        config.correspondent,
        state,
        blocklist,
        Arc::new(store),
        generator,
        sink,
    );

    let mut input: Box<dyn LineSource> = if std::io::stdin().is_terminal() {
        Box::new(Readline::new()?)
    } else {
        Box::new(ReaderInput::new(std::io::stdin().lock()))
    };

    controller
        .run(&mut input, &mut std::io::stdout())
        .await?;

    Ok(())
}
