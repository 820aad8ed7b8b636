use std::path::PathBuf;

use markup3d_lib::command::execute_json_batch;
use markup3d_lib::harness::TestHarness;
use markup3d_lib::state::EditorSettings;

struct Args {
    settings: Option<PathBuf>,
    script: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "markup3d=info,markup3d_lib=info".into()),
        )
        .init();

    let args = parse_args();
    let Some(script) = args.script else {
        eprintln!("usage: markup3d [--settings <path>] <script.json>");
        std::process::exit(2);
    };

    let settings = match &args.settings {
        Some(path) => EditorSettings::load_or_default(path),
        None => EditorSettings::load(),
    };

    let json = match std::fs::read_to_string(&script) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to read script {}: {e}", script.display());
            std::process::exit(1);
        }
    };

    let mut harness = TestHarness::with_settings(settings);
    match execute_json_batch(&mut harness, &json) {
        Ok(responses) => {
            tracing::info!("Executed {} commands from {}", responses.len(), script.display());
            match serde_json::to_string_pretty(&responses) {
                Ok(out) => println!("{out}"),
                Err(e) => {
                    tracing::error!("Failed to serialize responses: {e}");
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    }
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        settings: None,
        script: None,
    };
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--settings" && i + 1 < args.len() {
            parsed.settings = Some(PathBuf::from(&args[i + 1]));
            i += 2;
            continue;
        }
        parsed.script = Some(PathBuf::from(&args[i]));
        i += 1;
    }
    parsed
}
