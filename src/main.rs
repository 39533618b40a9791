use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lecture_graph::graph::ConceptIndex;
use lecture_graph::{Config, LectureGraphClient, UploadPipeline, UploadProgress};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("Lecture Graph")
        .version(env!("CARGO_PKG_VERSION"))
        .author("TigreRoll")
        .about("Lecture video knowledge graphs: API server and upload client")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (default: search standard locations, then environment)")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("serve").about("Run the HTTP API").arg(
                Arg::new("port")
                    .short('p')
                    .long("port")
                    .value_name("PORT")
                    .value_parser(clap::value_parser!(u16))
                    .help("Override the configured listen port"),
            ),
        )
        .subcommand(
            Command::new("upload")
                .about("Upload a lecture video and register it for processing")
                .arg(
                    Arg::new("file")
                        .value_name("FILE")
                        .help("Video file to upload")
                        .required(true),
                )
                .arg(
                    Arg::new("title")
                        .short('t')
                        .long("title")
                        .value_name("TITLE")
                        .help("Lecture title (default: file name)"),
                )
                .arg(server_arg()),
        )
        .subcommand(
            Command::new("show")
                .about("Print a lecture's concepts with the active one marked")
                .arg(
                    Arg::new("id")
                        .value_name("ID")
                        .help("Lecture record id")
                        .required(true),
                )
                .arg(
                    Arg::new("at")
                        .long("at")
                        .value_name("SECONDS")
                        .value_parser(clap::value_parser!(f64))
                        .allow_negative_numbers(true)
                        .default_value("0")
                        .help("Playback time used to pick the active concept"),
                )
                .arg(server_arg()),
        )
        .get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::from_file(path)?,
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };

    init_logging(&config, matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("serve", sub)) => serve(config, sub).await,
        Some(("upload", sub)) => {
            apply_server_override(&mut config, sub);
            upload(config, sub).await
        }
        Some(("show", sub)) => {
            apply_server_override(&mut config, sub);
            show(config, sub).await
        }
        _ => unreachable!("subcommand_required is set"),
    }
}

fn server_arg() -> Arg {
    Arg::new("server")
        .short('s')
        .long("server")
        .value_name("URL")
        .help("Lecture-graph API base URL")
}

fn init_logging(config: &Config, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    tracing_subscriber::fmt()
        .with_target(verbose)
        .with_env_filter(filter)
        .init();
}

fn apply_server_override(config: &mut Config, matches: &ArgMatches) {
    if let Some(server) = matches.get_one::<String>("server") {
        config.upload.server_url = server.clone();
    }
}

#[cfg(feature = "api")]
async fn serve(mut config: Config, matches: &ArgMatches) -> Result<()> {
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }
    config.validate()?;
    info!("{}", config.summary());

    let server = lecture_graph::api::ApiServer::from_config(config).await?;
    server.start().await
}

#[cfg(not(feature = "api"))]
async fn serve(_config: Config, _matches: &ArgMatches) -> Result<()> {
    anyhow::bail!("this build has no HTTP API; rebuild with --features api")
}

async fn upload(config: Config, matches: &ArgMatches) -> Result<()> {
    let file = PathBuf::from(
        matches
            .get_one::<String>("file")
            .ok_or_else(|| anyhow::anyhow!("missing FILE"))?,
    );
    if !file.is_file() {
        anyhow::bail!("Video file does not exist: {}", file.display());
    }
    let title = matches.get_one::<String>("title").cloned();

    info!("📤 Uploading {} via {}", file.display(), config.upload.server_url);
    let pipeline = UploadPipeline::new(&config.upload)?;
    let (progress_tx, mut progress_rx) = watch::channel(UploadProgress::default());

    let reporter = tokio::spawn(async move {
        let mut last = 0;
        while progress_rx.changed().await.is_ok() {
            let percent = progress_rx.borrow_and_update().percent();
            if percent >= last + 10 || (percent == 100 && last != 100) {
                info!("⏳ {}%", percent);
                last = percent;
            }
        }
    });

    let outcome = pipeline.run(&file, title, progress_tx).await;
    // sender dropped with the pipeline future, so the reporter ends
    let _ = reporter.await;

    match outcome {
        Ok(outcome) => {
            info!("✅ Registered lecture {} ({} bytes)", outcome.record_id, outcome.bytes);
            println!("{}", outcome.record_id);
            Ok(())
        }
        Err(e) => {
            warn!("Upload failed: {}", e);
            Err(e.into())
        }
    }
}

async fn show(config: Config, matches: &ArgMatches) -> Result<()> {
    let id = matches
        .get_one::<String>("id")
        .ok_or_else(|| anyhow::anyhow!("missing ID"))?;
    let at = matches.get_one::<f64>("at").copied().unwrap_or(0.0);

    let client = LectureGraphClient::new(
        &config.upload.server_url,
        Duration::from_secs(config.upload.request_timeout_seconds),
    )?;
    let record = client.get_lecture(id).await?;

    println!("{} ({} concepts)", record.title, record.concepts.len());
    if let Some(url) = &record.url {
        println!("{}", url);
    }

    let index = ConceptIndex::new(&record.concepts);
    for entry in index.entries("", at) {
        let marker = if entry.active { "▶" } else { " " };
        println!("{} {} [{}] {}", marker, entry.ordinal, entry.display_time, entry.label);
    }
    if !record.relationships.is_empty() {
        println!("{} relationships", record.relationships.len());
    }

    Ok(())
}
