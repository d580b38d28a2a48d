use std::process::ExitCode;

use tracing::{
    error,
    info
};
use tracing_subscriber::EnvFilter;

use riskcurve::configuration::ModelParameters;
use riskcurve::modelerror::ModelError;
use riskcurve::pipeline::RiskModelSession;

fn load_parameters() -> Result<ModelParameters, ModelError> {
    match std::env::args().nth(1) {
        Some(path) => {
            info!(%path, "loading model parameters");
            ModelParameters::from_reader(path)
        }
        None => {
            info!("no parameter file given, using defaults");
            Ok(ModelParameters::default())
        }
    }
}

fn run() -> Result<(), ModelError> {
    let mut session = RiskModelSession::new(load_parameters()?);
    let result = session.recompute()?;

    println!("baseline fatalities:        {:.1}", result.baseline_fatalities);
    println!("pre-mitigation fatalities:  {:.1}", result.pre_mitigation_fatalities);
    println!("post-mitigation fatalities: {:.1}", result.post_mitigation_fatalities);
    println!("mitigated fraction:         {:.3}", result.mitigated_fraction);

    let report = serde_json::json!({
        "parameters": session.parameters(),
        "result": session.last_result(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, validation = err.is_validation(), "model evaluation failed");
            ExitCode::FAILURE
        }
    }
}
