use std::path::Path;
use std::process::ExitCode;

use highlight_extract::config::load_settings;
use highlight_extract::config::settings::Settings;
use highlight_extract::pipeline::document_runner::extract_document;
use highlight_extract::server;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "\
Usage: highlight_extract serve [settings.yaml]
       highlight_extract extract <document.pdf> [settings.yaml]
  serve    Run the HTTP extraction service.
  extract  Print per-page highlights and masked images of a PDF as JSON.";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("{USAGE}");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("highlight_extract {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    match args[0].as_str() {
        "serve" => run_serve(args.get(1).map(Path::new)),
        "extract" => {
            let Some(input) = args.get(1) else {
                eprintln!("ERROR: extract requires a PDF path");
                eprintln!("{USAGE}");
                return ExitCode::FAILURE;
            };
            run_extract(Path::new(input), args.get(2).map(Path::new))
        }
        other => {
            eprintln!("ERROR: unknown command '{other}'");
            eprintln!("{USAGE}");
            ExitCode::FAILURE
        }
    }
}

/// Load settings and install the tracing subscriber. `RUST_LOG` takes
/// precedence over `log_level` from the settings file.
fn init(settings_path: Option<&Path>) -> Option<Settings> {
    let settings = match load_settings(settings_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("ERROR: Failed to load settings: {e}");
            return None;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_str()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Some(settings)
}

fn run_serve(settings_path: Option<&Path>) -> ExitCode {
    let Some(settings) = init(settings_path) else {
        return ExitCode::FAILURE;
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("ERROR: Failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(server::serve(settings)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_extract(input: &Path, settings_path: Option<&Path>) -> ExitCode {
    let Some(settings) = init(settings_path) else {
        return ExitCode::FAILURE;
    };

    let bytes = match std::fs::read(input) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("ERROR: Failed to read {}: {e}", input.display());
            return ExitCode::FAILURE;
        }
    };

    let pages = match extract_document(&bytes, &settings) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("ERROR: {}: {e}", input.display());
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string(&pages) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ERROR: Failed to serialize result: {e}");
            ExitCode::FAILURE
        }
    }
}
