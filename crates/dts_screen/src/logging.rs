use std::path::Path;

use color_eyre::eyre::eyre;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging to standard error, plus an optional log file.
///
/// Standard output is reserved for the forwarded driver output. The level can
/// be controlled via the `level` parameter or the `RUST_LOG` environment
/// variable. The returned guard must be held until exit so buffered file
/// output is flushed.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> color_eyre::Result<Option<WorkerGuard>> {
    // Build filter from RUST_LOG env var or use provided level
    let default_filter = format!("dts_screen={level},dts_screen_core={level}");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| eyre!("log file path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(dir)?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()?;

    tracing::debug!(
        log_file = ?log_file.map(|p| p.display().to_string()),
        "dts-screen logging initialized"
    );
    Ok(guard)
}
