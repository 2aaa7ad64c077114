mod fixture;
mod serve;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::BufReader;
use tunepick_bridge::{BridgeSettings, MethodCall, PickerBridge, ScriptedPlatform, UiThread};
use tunepick_core::{init_logging, AppDirs, Config};

#[derive(Debug, Parser)]
#[command(name = "tunepick", version, about = "Native media picker bridge")]
struct Cli {
    /// Language for the picker prompt and error messages (overrides config)
    #[arg(long, global = true)]
    locale: Option<String>,
    /// Read config.toml from this directory instead of the platform default
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Answer method calls read as JSON lines from stdin
    Serve(ServeCommand),
    /// Run a single pick and print the response
    Pick(PickCommand),
}

#[derive(Debug, Parser, Clone)]
struct ServeCommand {
    /// Scripted device fixture (JSON)
    #[arg(long)]
    fixture: PathBuf,
    /// Seconds to wait for open pickers after stdin closes
    #[arg(long, default_value_t = 30)]
    grace: u64,
}

#[derive(Debug, Parser, Clone)]
struct PickCommand {
    /// Scripted device fixture (JSON)
    #[arg(long)]
    fixture: PathBuf,
}

impl Cli {
    fn dirs(&self) -> Result<AppDirs> {
        match &self.config_dir {
            Some(dir) => Ok(AppDirs::rooted_at(dir)),
            None => Ok(AppDirs::discover()?),
        }
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(locale) = &self.locale {
            config.picker.locale = Some(locale.clone());
        }
    }
}

fn fixture_bridge(path: &Path, config: &Config) -> Result<PickerBridge> {
    let script = fixture::load_script(path)?;
    let ui = UiThread::spawn("ui-main").context("failed to start UI thread")?;
    let platform = ScriptedPlatform::new(script, ui.clone());
    Ok(platform.bridge(ui, BridgeSettings::from_config(&config.picker)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = cli.dirs()?;
    let mut config = Config::load_or_default(&dirs)?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    let _logging = init_logging(&config.logging, &dirs)?;

    match &cli.command {
        Command::Serve(args) => {
            let bridge = fixture_bridge(&args.fixture, &config)?;
            tracing::info!(
                channel = %bridge.settings().channel,
                fixture = %args.fixture.display(),
                "serving method channel on stdin/stdout"
            );
            let (_, stats) = serve::serve(
                &bridge,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
                Duration::from_secs(args.grace),
            )
            .await?;
            tracing::info!(
                calls = stats.calls,
                replies = stats.replies,
                malformed = stats.malformed,
                abandoned = stats.abandoned,
                unfinished = stats.unfinished,
                "method channel closed"
            );
        }
        Command::Pick(args) => {
            let bridge = fixture_bridge(&args.fixture, &config)?;
            let response = bridge
                .call(&MethodCall::new(1, "pick"))
                .await
                .context("pick finished without a response")?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
