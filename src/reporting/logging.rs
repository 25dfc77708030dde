use crate::config::Config;
use log::{debug, error, info, warn};
use std::path::Path;
use std::time::Duration;

/// Initialize the logger with appropriate level based on verbosity
pub fn init_logger(verbose: bool, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Off
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_module_path(false)
        .format_target(false)
        .init();

    debug!("Logger initialized with level: {level:?}");
}

/// Log the effective server configuration
pub fn log_config_info(config: &Config) {
    let program = config.analyzer_program.as_deref().unwrap_or("?");
    let args = config.analyzer_args.clone().unwrap_or_default().join(" ");
    let timeout = config.analyzer_timeout_duration().as_secs();
    let keep_uploads = config.keep_uploads.unwrap_or(true);
    let retain_artifacts = config.retain_artifacts.unwrap_or(false);

    info!("Analyzer: {program} {args} (timeout={timeout}s)");
    info!("Outputs: {}", config.output_names().join(", "));
    info!(
        "Directories: uploads={}, work={}, graphs={}, public={}",
        config.uploads_path().display(),
        config.work_path().display(),
        config.graphs_path().display(),
        config.public_path().display()
    );
    info!("Lifecycle: keep_uploads={keep_uploads}, retain_artifacts={retain_artifacts}");
    match config.max_upload_bytes {
        Some(limit) => info!("Upload limit: {limit} bytes"),
        None => debug!("Upload limit: none"),
    }
}

/// Log that the listener is up
pub fn log_server_start(address: &str) {
    info!("Server running at http://{address}/");
}

/// Log a capture written to the staging directory
pub fn log_upload_staged(original_name: &str, staged: &Path, size: u64) {
    info!(
        "Staged '{original_name}' as {} ({size} bytes)",
        staged.display()
    );
}

/// Log the full analyzer command line before it runs
pub fn log_analyzer_start(argv: &[String], working_dir: &Path) {
    info!("Running analyzer in {}", working_dir.display());
    debug!("  argv: {}", argv.join(" "));
}

/// Log a finished analyzer run, with its captured streams in debug mode
pub fn log_analyzer_finish(elapsed: Duration, stdout: &str, stderr: &str) {
    info!("Analyzer finished in {}ms", elapsed.as_millis());
    for line in stdout.lines().filter(|line| !line.trim().is_empty()) {
        debug!("  [stdout] {line}");
    }
    for line in stderr.lines().filter(|line| !line.trim().is_empty()) {
        debug!("  [stderr] {line}");
    }
}

/// Log the size of an assembled payload
pub fn log_payload_assembled(datasets: usize, images: usize) {
    info!("Report assembled: {datasets} dataset(s), {images} image(s)");
}

/// Log error information
pub fn log_error(message: &str, source: Option<&dyn std::error::Error>) {
    match source {
        Some(err) => error!("{message}: {err}"),
        None => error!("{message}"),
    }
}

/// Log warning information
pub fn log_warning(message: &str) {
    warn!("{message}");
}
