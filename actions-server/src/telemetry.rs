use std::sync::Once;

use clap::ValueEnum;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

static INIT: Once = Once::new();

/// Used when `RUST_LOG` is unset or blank. Http client internals stay quiet
/// unless asked for.
pub const DEFAULT_LOG_DIRECTIVES: &str = "info,hyper=warn,reqwest=warn,warp=warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Hourly rotated log files are written here. Stdout only when unset.
    pub log_dir: Option<String>,
    pub format: LogFormat,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

pub fn log_directives(rust_log: Option<&str>) -> &str {
    match rust_log.map(str::trim) {
        Some(directives) if !directives.is_empty() => directives,
        _ => DEFAULT_LOG_DIRECTIVES,
    }
}

fn env_filter() -> EnvFilter {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = log_directives(rust_log.as_deref());
    EnvFilter::try_new(directives).unwrap_or_else(|e| {
        eprintln!(
            "Warning: invalid log directives {:?}: {}. Using {:?}.",
            directives, e, DEFAULT_LOG_DIRECTIVES
        );
        EnvFilter::new(DEFAULT_LOG_DIRECTIVES)
    })
}

fn fmt_layer<W>(writer: W, format: LogFormat, ansi: bool) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::Layer::new().with_writer(writer);
    match format {
        LogFormat::Text => layer.with_ansi(ansi).with_filter(env_filter()).boxed(),
        LogFormat::Json => layer.json().with_filter(env_filter()).boxed(),
    }
}

fn file_appender(log_dir: &str) -> Option<RollingFileAppender> {
    match RollingFileAppender::builder()
        .rotation(Rotation::HOURLY)
        .filename_prefix("actions-server")
        .filename_suffix("log")
        .max_log_files(48)
        .build(log_dir)
    {
        Ok(appender) => Some(appender),
        Err(e) => {
            eprintln!(
                "Warning: Failed to create log file appender in {}: {}. Logging to stdout only.",
                log_dir, e
            );
            None
        }
    }
}

/// Installs the global subscriber on the first call.
pub fn setup_telemetry(config: &TelemetryConfig) {
    INIT.call_once(|| {
        let mut layers = vec![fmt_layer(std::io::stdout, config.format, true)];
        let mut guard = None;
        if let Some(appender) = config.log_dir.as_deref().and_then(file_appender) {
            let (non_blocking, worker_guard) = tracing_appender::non_blocking(appender);
            layers.push(fmt_layer(non_blocking, config.format, false));
            guard = Some(worker_guard);
        }
        if let Err(e) = tracing_subscriber::registry().with(layers).try_init() {
            eprintln!("Warning: A global subscriber is already installed: {}", e);
        }
        // Flushes on drop, the process keeps it for its lifetime.
        std::mem::forget(guard);
    });
}
