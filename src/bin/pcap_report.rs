use clap::Parser;
use pcap_report::config::{CliConfig, Config};
use pcap_report::reporting::logging;
use pcap_report::server::{self, ReportPipeline};
use pcap_report::ui::cli::request_timeout_seconds;
use pcap_report::ui::{Cli, Commands, cli_to_config};
use pcap_report::{
    HtmlReport, ReportClient, ReportError, ReportPayload, ReportSession, ReportView,
};

use std::path::Path;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Entry point logic extracted from main() for testing
pub async fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cli_config = cli_to_config(cli);
    let config = load_and_merge_config(&cli_config)?;
    config.validate()?;

    logging::init_logger(config.verbose.unwrap_or(false), cli_config.quiet);

    match &cli.command {
        None | Some(Commands::Serve) => server::serve(&config).await?,
        Some(Commands::Submit {
            capture,
            server,
            output,
            request_timeout,
        }) => {
            let timeout = Duration::from_secs(request_timeout_seconds(*request_timeout));
            submit_capture(server, timeout, capture, output).await?;
        }
        Some(Commands::Render {
            payload,
            output,
            image_base,
        }) => render_payload(payload, image_base, output)?,
        Some(Commands::Analyze { capture, output }) => {
            analyze_capture(&config, capture, output).await?;
        }
    }
    Ok(())
}

/// Load configuration from file or standard locations and merge with CLI config
pub fn load_and_merge_config(cli_config: &CliConfig) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if cli_config.no_config {
        Config::default()
    } else if let Some(ref config_file) = cli_config.config_file {
        Config::load_from_file(config_file).inspect_err(|e| {
            logging::log_error(
                &format!("Could not load config file '{config_file}'"),
                Some(e),
            );
        })?
    } else {
        Config::load_from_standard_locations()
    };

    // Merge CLI arguments with configuration (CLI takes precedence)
    config.merge_with_cli(cli_config);
    Ok(config)
}

/// Upload to a running server and write whatever it returns as a page
pub async fn submit_capture(
    server_url: &str,
    timeout: Duration,
    capture: &Path,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = ReportClient::new(server_url, timeout)?;
    let session = ReportSession::new();
    client.submit_to(&session, capture).await?;

    HtmlReport::write_page(&session.snapshot(), client.base_url().as_str(), output)?;
    println!("Report written to {}", output.display());
    Ok(())
}

/// Draw a saved payload
pub fn render_payload(
    payload: &Path,
    image_base: &str,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(payload)?;
    let payload = ReportPayload::from_json(&text).map_err(ReportError::from)?;

    let mut view = ReportView::new();
    view.apply(&payload);
    HtmlReport::write_page(&view, image_base, output)?;
    println!("Report written to {}", output.display());
    Ok(())
}

/// Run the whole pipeline in-process; images point at their published files
pub async fn analyze_capture(
    config: &Config,
    capture: &Path,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = ReportPipeline::from_config(config);
    let mut payload = pipeline.process_file(capture).await?;

    payload.images = payload
        .images
        .iter()
        .map(|reference| {
            pipeline
                .assembler()
                .local_image_path(reference)
                .and_then(|path| std::path::absolute(path).ok())
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| reference.clone())
        })
        .collect();

    let mut view = ReportView::new();
    view.apply(&payload);
    HtmlReport::write_page(&view, "", output)?;
    println!("Report written to {}", output.display());
    Ok(())
}
