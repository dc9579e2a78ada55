//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use hotdogjobs_api::{AppState, JobQuery};
use hotdogjobs_core::{FanoutSink, JsonLinesSink, LogSink, Pipeline, PipelineReport};
use hotdogjobs_shared::{AppConfig, config_file_path, init_config, load_config, load_config_from};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// hotdogjobs: an event-driven hot-dog job pipeline.
#[derive(Parser)]
#[command(
    name = "hotdogjobs",
    version,
    about = "Generate hot-dog jobs, enrich them through staged workers, and serve the results.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.hotdogjobs/hotdogjobs.toml.
    #[arg(long, global = true, env = "HOTDOGJOBS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the pipeline, the job generator, and the query server until Ctrl-C.
    Run(RunArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `run`. Each one overrides the matching config file value.
#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Seconds between generated jobs.
    #[arg(long)]
    pub interval: Option<u64>,

    /// Do not start the job generator; only accept jobs over HTTP.
    #[arg(long)]
    pub no_generator: bool,

    /// Capacity of each inter-stage channel.
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Address to bind the query server to.
    #[arg(long)]
    pub host: Option<String>,

    /// Port for the query server.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Append every finished job to this JSON-lines file.
    #[arg(long)]
    pub sink: Option<PathBuf>,
}

impl RunArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(interval) = self.interval {
            config.generator.interval_secs = interval;
        }
        if self.no_generator {
            config.generator.enabled = false;
        }
        if let Some(capacity) = self.capacity {
            config.pipeline.channel_capacity = capacity;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(sink) = &self.sink {
            config.sink.path = Some(sink.clone());
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "hotdogjobs=info",
        1 => "hotdogjobs=debug,tower_http=debug",
        _ => "hotdogjobs=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(cli.config.as_deref(), &args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()),
        },
    }
}

fn resolve_config(path: Option<&std::path::Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

fn build_sink(config: &AppConfig) -> Result<FanoutSink> {
    let mut sink = FanoutSink::new().with(LogSink);
    if let Some(path) = &config.sink.path {
        let file = JsonLinesSink::open(path)
            .wrap_err_with(|| format!("cannot open sink file {}", path.display()))?;
        info!(path = %path.display(), "writing finished jobs to file");
        sink = sink.with(file);
    }
    Ok(sink)
}

async fn cmd_run(config_path: Option<&std::path::Path>, args: &RunArgs) -> Result<()> {
    let mut config = resolve_config(config_path)?;
    args.apply(&mut config);
    config.validate()?;
    let addr = config.server.addr()?;

    let sink = build_sink(&config)?;
    let mut pipeline = Pipeline::start(&config.pipeline, Box::new(sink));
    pipeline.spawn_generator(&config.generator)?;

    let state = AppState::new(JobQuery::new(pipeline.store()), pipeline.submitter());
    let stop_server = CancellationToken::new();
    let mut server = tokio::spawn(hotdogjobs_api::serve(
        addr,
        state,
        stop_server.clone().cancelled_owned(),
    ));

    let server_result = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.wrap_err("failed to listen for Ctrl-C")?;
            info!("shutdown requested, draining pipeline");
            stop_server.cancel();
            server.await
        }
        finished = &mut server => finished,
    };

    let report = pipeline.shutdown().await;
    print_summary(&report);

    match server_result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.into()),
        Err(e) => {
            warn!(error = %e, "query server task failed");
            Err(eyre!("query server task failed: {e}"))
        }
    }
}

fn print_summary(report: &PipelineReport) {
    println!();
    println!("  Pipeline drained.");
    println!("  Generated:    {}", report.generated);
    println!("  Materialized: {}", report.materialized());
    println!("  Dropped:      {}", report.dropped());
    for stage in &report.stages {
        println!(
            "    {:<10} forwarded {:>6}  dropped {:>4}",
            stage.stage.name(),
            stage.forwarded,
            stage.dropped
        );
    }
    println!();
}

fn cmd_config_init() -> Result<()> {
    let path = config_file_path()?;
    if path.exists() {
        return Err(eyre!("config file already exists at {}", path.display()));
    }
    let path = init_config()?;
    println!("Created {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&std::path::Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let rendered = toml::to_string_pretty(&config).wrap_err("failed to render config")?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_override_config() {
        let cli = Cli::parse_from([
            "hotdogjobs",
            "run",
            "--interval",
            "2",
            "--no-generator",
            "--port",
            "9000",
            "--capacity",
            "8",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };

        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.generator.interval_secs, 2);
        assert!(!config.generator.enabled);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.pipeline.channel_capacity, 8);
        assert!(config.sink.path.is_none());
    }

    #[test]
    fn run_without_flags_keeps_config() {
        let mut config = AppConfig::default();
        RunArgs::default().apply(&mut config);
        assert_eq!(config.generator.interval_secs, 5);
        assert!(config.generator.enabled);
    }

    #[test]
    fn global_flags_parse() {
        let cli = Cli::parse_from(["hotdogjobs", "-vv", "--log-format", "json", "config", "show"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Show
            }
        ));
    }
}
