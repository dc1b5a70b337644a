//! ptepg - XMLTV guide generator for Portuguese IPTV providers.

/// Application configuration (TOML).
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use ptepg_collect::{FeedCollector, MeoCatalog, Source, collect_all};
use ptepg_core::{Guide, NormalizeReport, normalize, write_guide};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, SourceConfig, resolve_config_path};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Collect, normalize and write the XMLTV guide.
    Generate(GenerateArgs),
    /// List the normalized channel lineup.
    Channels(SourceArgs),
}

/// Source selection shared by all subcommands.
#[derive(clap::Args)]
struct SourceArgs {
    /// Number of days to cover, starting today (default: config `guide.days`).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=31))]
    days: Option<u32>,

    /// Extra feed source, path or http(s) URL. Repeatable.
    #[arg(long = "feed")]
    feeds: Vec<String>,

    /// Skip the built-in MEO lineup.
    #[arg(long)]
    no_catalog: bool,
}

/// Arguments for the `generate` subcommand.
#[derive(clap::Args)]
struct GenerateArgs {
    /// Source selection.
    #[command(flatten)]
    sources: SourceArgs,

    /// Output file (default: config `guide.output`).
    #[arg(long, short)]
    output: Option<PathBuf>,
}

/// Builds the source list from config and CLI flags.
///
/// # Errors
///
/// Returns an error if a feed location is invalid, a collector fails to
/// build, or no source remains.
fn build_sources(config: &AppConfig, args: &SourceArgs) -> Result<Vec<Source>> {
    let cli_feeds = args.feeds.iter().map(|location| SourceConfig::Feed {
        location: location.clone(),
        title_style: None,
    });

    let mut sources = Vec::new();
    for entry in config.sources.iter().cloned().chain(cli_feeds) {
        match entry {
            SourceConfig::Meo if args.no_catalog => {}
            SourceConfig::Meo => sources.push(Source::Meo(MeoCatalog::new())),
            SourceConfig::Feed {
                location,
                title_style,
            } => {
                let mut builder = FeedCollector::builder()
                    .location(
                        location
                            .parse()
                            .with_context(|| format!("invalid feed location {location:?}"))?,
                    )
                    .user_agent(concat!(
                        env!("CARGO_PKG_NAME"),
                        "/",
                        env!("CARGO_PKG_VERSION")
                    ));
                if let Some(style) = title_style {
                    builder = builder.title_style(style);
                }
                let collector = builder
                    .build()
                    .with_context(|| format!("failed to build feed collector for {location}"))?;
                tracing::debug!(location = %collector.location(), "feed source configured");
                sources.push(Source::Feed(collector));
            }
        }
    }

    if sources.is_empty() {
        bail!("no sources configured; add a [[sources]] entry or pass --feed");
    }
    Ok(sources)
}

/// Loads config, collects every source and normalizes the result.
///
/// # Errors
///
/// Returns an error if config is invalid, a source fails, or normalization
/// yields no channels.
async fn build_guide(
    config: &AppConfig,
    args: &SourceArgs,
) -> Result<(Guide, NormalizeReport)> {
    let options = config.normalize_options(args.days)?;
    let sources = build_sources(config, args)?;
    tracing::info!(
        sources = sources.len(),
        first_day = %options.horizon.first_day(),
        days = options.horizon.days(),
        "collecting"
    );

    let batches = collect_all(&sources, &options.horizon).await?;
    normalize(&batches, &options)
}

/// Logs the normalization counters.
fn log_report(report: &NormalizeReport) {
    tracing::info!(
        channels = report.channels,
        programs = report.programs,
        placeholders = report.placeholders,
        duplicates = report.duplicates,
        lone_episode_numbers = report.lone_episode_numbers,
        skipped = report.total_skipped(),
        "normalization finished"
    );
    for (reason, count) in report.skips() {
        tracing::info!(%reason, count, "records skipped");
    }
}

/// Runs the `generate` subcommand.
///
/// # Errors
///
/// Returns an error if the guide cannot be built or written.
#[instrument(skip_all)]
async fn run_generate(args: &GenerateArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(dir)?;
    let config = AppConfig::load(&config_path)?;

    let (guide, report) = build_guide(&config, &args.sources).await?;
    log_report(&report);

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.guide.output.clone());
    write_guide(&output, &guide, &config.generator_info())?;
    tracing::info!(path = %output.display(), "guide written");

    Ok(())
}

/// Runs the `channels` subcommand.
///
/// # Errors
///
/// Returns an error if the guide cannot be built.
#[instrument(skip_all)]
async fn run_channels(args: &SourceArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(dir)?;
    let config = AppConfig::load(&config_path)?;

    let (guide, _) = build_guide(&config, args).await?;

    tracing::info!("No.\tID\t\tPrograms\tName");
    for channel in &guide.channels {
        tracing::info!(
            "{}\t{}\t\t{}\t\t{}",
            channel
                .number
                .map_or_else(|| String::from("-"), |n| n.to_string()),
            channel.id,
            guide.programs_for(&channel.id).count(),
            channel.display_name,
        );
    }
    tracing::info!("Total: {} channels", guide.channels.len());

    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => run_generate(&args, cli.dir.as_ref()).await,
        Commands::Channels(args) => run_channels(&args, cli.dir.as_ref()).await,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use clap::CommandFactory;

    use super::*;

    fn source_args(feeds: &[&str], no_catalog: bool) -> SourceArgs {
        SourceArgs {
            days: None,
            feeds: feeds.iter().map(|f| String::from(*f)).collect(),
            no_catalog,
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_sources_default_is_catalog() {
        // Arrange
        let config = AppConfig::default();

        // Act
        let sources = build_sources(&config, &source_args(&[], false)).unwrap();

        // Assert
        assert_eq!(sources.len(), 1);
        assert!(matches!(sources.first(), Some(Source::Meo(_))));
    }

    #[test]
    fn test_build_sources_appends_cli_feeds() {
        // Arrange
        let config = AppConfig::default();

        // Act
        let sources = build_sources(
            &config,
            &source_args(&["feeds/nos.json", "https://example.org/epg.json"], true),
        )
        .unwrap();

        // Assert
        let locations: Vec<String> = sources
            .iter()
            .map(|s| match s {
                Source::Feed(feed) => feed.location().to_string(),
                Source::Meo(_) => String::from("meo"),
            })
            .collect();
        assert_eq!(
            locations,
            vec!["feeds/nos.json", "https://example.org/epg.json"]
        );
    }

    #[test]
    fn test_build_sources_none_left() {
        // Arrange
        let config = AppConfig::default();

        // Act
        let result = build_sources(&config, &source_args(&[], true));

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_build_sources_rejects_empty_location() {
        // Arrange
        let config = AppConfig::default();

        // Act
        let result = build_sources(&config, &source_args(&[""], false));

        // Assert
        assert!(result.is_err());
    }
}
