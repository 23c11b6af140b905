use std::{net::SocketAddr, path::PathBuf};

use clap::{Parser, Subcommand};
use url::Url;
use uuid::Uuid;

use crate::config::primitives::{LogFormat, Targets};

const DEFAULT_TOKEN_HOURS: u64 = 24;

impl Args {
    pub(super) fn into_output(self) -> Output {
        let Args {
            config_file,
            log_format,
            log_targets,
            opentelemetry_url,
            opentelemetry_service_name,
            opentelemetry_targets,
            save_to,
            command,
        } = self;

        let tracing = Tracing {
            logging: Logging {
                format: log_format,
                targets: log_targets,
            },
            opentelemetry: OpenTelemetry {
                url: opentelemetry_url,
                service_name: opentelemetry_service_name,
                targets: opentelemetry_targets,
            },
        };

        match command {
            Command::Run(Run {
                address,
                max_upload_size,
                temporary_directory,
                metrics_prometheus_address,
                media_ffprobe_path,
                media_ffmpeg_path,
                media_process_timeout,
                media_process_concurrency,
                store,
            }) => {
                let server = Server {
                    address,
                    max_upload_size,
                    temporary_directory,
                };

                let metrics = Metrics {
                    prometheus_address: metrics_prometheus_address,
                };

                let media = Media {
                    ffprobe_path: media_ffprobe_path,
                    ffmpeg_path: media_ffmpeg_path,
                    process_timeout: media_process_timeout,
                    process_concurrency: media_process_concurrency,
                };

                let (store, repo) = match store {
                    Some(RunStore::Filesystem(RunFilesystem { system, repo })) => {
                        (Some(Store::Filesystem(system)), repo)
                    }
                    Some(RunStore::ObjectStorage(RunObjectStorage { storage, repo })) => {
                        (Some(Store::ObjectStorage(storage)), repo)
                    }
                    None => (None, None),
                };

                Output {
                    config_format: ConfigFormat {
                        server,
                        tracing,
                        metrics,
                        media,
                        repo,
                        store,
                    },
                    operation: Operation::Run,
                    save_to,
                    config_file,
                }
            }
            Command::IssueToken(IssueToken {
                user_id,
                valid_for,
            }) => Output {
                config_format: ConfigFormat {
                    tracing,
                    ..Default::default()
                },
                operation: Operation::IssueToken {
                    user_id,
                    valid_for: valid_for.unwrap_or(DEFAULT_TOKEN_HOURS),
                },
                save_to,
                config_file,
            },
        }
    }
}

pub(super) struct Output {
    pub(super) config_format: ConfigFormat,
    pub(super) operation: Operation,
    pub(super) save_to: Option<PathBuf>,
    pub(super) config_file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub(crate) enum Operation {
    Run,
    IssueToken {
        user_id: Uuid,
        /// Hours
        valid_for: u64,
    },
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub(super) struct ConfigFormat {
    server: Server,
    tracing: Tracing,
    metrics: Metrics,
    media: Media,
    #[serde(skip_serializing_if = "Option::is_none")]
    repo: Option<Repo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    store: Option<Store>,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Server {
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<SocketAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_upload_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temporary_directory: Option<PathBuf>,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Tracing {
    logging: Logging,
    opentelemetry: OpenTelemetry,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Logging {
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<LogFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    targets: Option<Targets>,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct OpenTelemetry {
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    targets: Option<Targets>,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Metrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    prometheus_address: Option<SocketAddr>,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Media {
    #[serde(skip_serializing_if = "Option::is_none")]
    ffprobe_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ffmpeg_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    process_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    process_concurrency: Option<usize>,
}

/// Run the reelhouse video ingestion service
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(super) struct Args {
    /// Path to the reelhouse configuration file
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// Format of logs printed to stdout
    #[arg(long)]
    log_format: Option<LogFormat>,
    /// Log levels to print to stdout, respects RUST_LOG formatting
    #[arg(long)]
    log_targets: Option<Targets>,

    /// URL to send OpenTelemetry traces
    #[arg(long)]
    opentelemetry_url: Option<Url>,
    /// Service Name to use for OpenTelemetry
    #[arg(long)]
    opentelemetry_service_name: Option<String>,
    /// Log levels to use for OpenTelemetry, respects RUST_LOG formatting
    #[arg(long)]
    opentelemetry_targets: Option<Targets>,

    /// File to save the current configuration for reproducible runs
    #[arg(long)]
    save_to: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Runs the reelhouse web server
    Run(Run),

    /// Prints a bearer token for the given user, signed with the configured secret
    IssueToken(IssueToken),
}

#[derive(Debug, Parser)]
struct Run {
    /// The address and port to bind the reelhouse web server
    #[arg(short, long)]
    address: Option<SocketAddr>,

    /// The maximum size, in megabytes, of an uploaded video
    ///
    /// This number defaults to 1024
    #[arg(long)]
    max_upload_size: Option<usize>,

    /// The directory uploads are buffered in while they are processed
    #[arg(long)]
    temporary_directory: Option<PathBuf>,

    /// Whether to enable the prometheus scrape endpoint
    #[arg(long)]
    metrics_prometheus_address: Option<SocketAddr>,

    /// Path or name of the ffprobe binary
    #[arg(long)]
    media_ffprobe_path: Option<PathBuf>,

    /// Path or name of the ffmpeg binary
    #[arg(long)]
    media_ffmpeg_path: Option<PathBuf>,

    /// Timeout, in seconds, for any single ffprobe or ffmpeg invocation
    #[arg(long)]
    media_process_timeout: Option<u64>,

    /// How many ffprobe or ffmpeg processes may run at once
    #[arg(long)]
    media_process_concurrency: Option<usize>,

    #[command(subcommand)]
    store: Option<RunStore>,
}

#[derive(Debug, Parser)]
struct IssueToken {
    /// The user the token identifies
    #[arg(long)]
    user_id: Uuid,

    /// How many hours the token stays valid
    ///
    /// This number defaults to 24
    #[arg(long)]
    valid_for: Option<u64>,
}

#[derive(Debug, Subcommand)]
// allow large enum variant - this is an instantiated-once config
#[allow(clippy::large_enum_variant)]
enum RunStore {
    /// Run reelhouse with filesystem storage
    Filesystem(RunFilesystem),

    /// Run reelhouse with object storage
    ObjectStorage(RunObjectStorage),
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
// allow large enum variant - this is an instantiated-once config
#[allow(clippy::large_enum_variant)]
enum Store {
    Filesystem(Filesystem),

    ObjectStorage(crate::config::primitives::ObjectStorage),
}

/// Run reelhouse with the provided filesystem storage
#[derive(Debug, Parser)]
struct RunFilesystem {
    #[command(flatten)]
    system: Filesystem,

    #[command(subcommand)]
    repo: Option<Repo>,
}

/// Run reelhouse with the provided object storage
#[derive(Debug, Parser)]
struct RunObjectStorage {
    #[command(flatten)]
    storage: crate::config::primitives::ObjectStorage,

    #[command(subcommand)]
    repo: Option<Repo>,
}

/// Configuration for data repositories
#[derive(Debug, Subcommand, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
enum Repo {
    /// Run reelhouse with the provided sled-backed data repository
    Sled(Sled),
}

/// Configuration for filesystem video storage
#[derive(Clone, Debug, Parser, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub(super) struct Filesystem {
    /// The path to store published videos in
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) path: Option<PathBuf>,

    /// Base URL that published keys are resolved against
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) public_endpoint: Option<Url>,
}

/// Configuration for the sled-backed data repository
#[derive(Debug, Parser, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Sled {
    /// The path to store the sled database
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,

    /// The cache capacity, in bytes, allowed to sled for in-memory operations
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_capacity: Option<u64>,
}
