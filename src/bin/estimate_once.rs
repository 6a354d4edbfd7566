//! Run a single estimation from the command line, without the HTTP server
//!
//! Usage: `estimate_once <params_path> <output_path> [--debug]`
//!
//! Uses the same environment configuration as the service.

use std::env;
use std::process::ExitCode;
use training_estimator::config::Config;
use training_estimator::credentials;
use training_estimator::estimation::{EstimationRequest, Provider};
use training_estimator::state::AppState;

const USAGE: &str = "usage: estimate_once <params_path> <output_path> [--debug]";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let debug = args.iter().any(|a| a == "--debug");
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    let (params_path, output_path) = match positional.as_slice() {
        [params, output] => (params.to_string(), output.to_string()),
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    let config = Config::from_env();
    let api_key = match credentials::load_api_key(&config).await {
        Ok(key) => key,
        Err(e) => {
            eprintln!("✗ Could not load the Gemini API key: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::from_config(config, Some(api_key.clone())) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("✗ Could not build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let script_content = match state.store.read_text(&params_path).await {
        Ok(content) => content,
        Err(e) => {
            eprintln!("✗ Could not read {}: {}", params_path, e);
            return ExitCode::FAILURE;
        }
    };

    let estimation = &state.config.estimation;
    let request = EstimationRequest {
        provider: Some(Provider::Gemini),
        script_content,
        output_path: output_path.clone(),
        debug,
        api_key,
        model_id: estimation.model.clone(),
        system_prompt_path: estimation.system_prompt_path.clone(),
        user_prompt_template_path: estimation.user_prompt_template_path.clone(),
    };

    let outcome = state.pipeline.run(request).await;
    if outcome.is_success() {
        println!(
            "✓ Wrote {} record(s) to {} in {:.1}s",
            outcome.records,
            output_path,
            outcome.elapsed.as_secs_f64()
        );
        ExitCode::SUCCESS
    } else {
        eprintln!(
            "✗ Estimation failed at {}: {}",
            outcome.failed_at.map(|s| s.to_string()).unwrap_or_default(),
            outcome.cause().unwrap_or_default()
        );
        ExitCode::FAILURE
    }
}
