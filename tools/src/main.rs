//! churn-runner: headless churn scoring and retention-scenario runner.
//!
//! Usage:
//!   churn-runner predict --data-dir ./data --input customer.json --user alice --db churn.db
//!   churn-runner history --user alice --db churn.db --limit 20
//!   churn-runner --ipc-mode --data-dir ./data --db churn.db

use anyhow::Result;
use churn_core::{
    attributes::CustomerAttributes,
    audit::PredictionSink,
    config::ChurnConfig,
    explain::FeatureImpact,
    model::TreeEnsemble,
    predictor::{ChurnPredictor, PredictionResult},
    simulator::ScenarioOutcome,
    store::{AuditStore, HistoryEntry},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Predict {
        #[serde(default)]
        user: Option<String>,
        attributes: CustomerAttributes,
        #[serde(default)]
        explain: usize,
    },
    History {
        user: String,
        #[serde(default = "default_history_limit")]
        limit: usize,
    },
    Quit,
}

fn default_history_limit() -> usize {
    20
}

#[derive(serde::Serialize)]
struct PredictResponse {
    result: PredictionResult,
    explanation: Vec<FeatureImpact>,
}

#[derive(serde::Serialize)]
struct HistoryResponse {
    user: String,
    entries: Vec<HistoryEntry>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let user = flag_value(&args, "--user");

    let store = AuditStore::open(db)?;
    store.migrate()?;

    if ipc_mode {
        let predictor = build_predictor(data_dir)?;
        return run_ipc_loop(&predictor, &store);
    }

    match args.get(1).map(String::as_str) {
        Some("predict") => {
            let input = flag_value(&args, "--input")
                .ok_or_else(|| anyhow::anyhow!("predict needs --input <customer.json>"))?;
            let top = parse_arg(&args, "--explain", 10usize);
            let predictor = build_predictor(data_dir)?;
            let content = std::fs::read_to_string(input)
                .map_err(|e| anyhow::anyhow!("Cannot read {input}: {e}"))?;
            let attrs: CustomerAttributes = serde_json::from_str(&content)?;
            let response = predict(&predictor, &store, user, &attrs, top)?;
            print_prediction(&response);
        }
        Some("history") => {
            let user = user.ok_or_else(|| anyhow::anyhow!("history needs --user <name>"))?;
            let limit = parse_arg(&args, "--limit", default_history_limit());
            print_history(&store.history_for(user, limit)?);
        }
        _ => {
            eprintln!("usage: churn-runner <predict|history> [options] | --ipc-mode");
            std::process::exit(2);
        }
    }
    Ok(())
}

fn build_predictor(data_dir: &str) -> Result<ChurnPredictor<TreeEnsemble>> {
    let config = ChurnConfig::load(data_dir)?;
    let model_path = config
        .model_path
        .clone()
        .ok_or_else(|| anyhow::anyhow!("{data_dir}/model.json not found. Train your model first"))?;
    let model = TreeEnsemble::load(&model_path)?;
    Ok(ChurnPredictor::new(config, model)?)
}

fn predict(
    predictor: &ChurnPredictor<TreeEnsemble>,
    sink: &dyn PredictionSink,
    user: Option<&str>,
    attrs: &CustomerAttributes,
    top: usize,
) -> Result<PredictResponse> {
    let result = match user {
        Some(u) => predictor.predict_and_record(u, attrs, sink)?,
        None => predictor.predict(attrs)?,
    };
    let mut explanation = predictor.explain(attrs, predictor.scorer())?;
    explanation.truncate(top);
    Ok(PredictResponse { result, explanation })
}

fn run_ipc_loop(predictor: &ChurnPredictor<TreeEnsemble>, store: &AuditStore) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Predict { user, attributes, explain } => {
                predict(predictor, store, user.as_deref(), &attributes, explain)
                    .and_then(|r| Ok(serde_json::to_string(&r)?))
            }
            IpcCommand::History { user, limit } => store
                .history_for(&user, limit)
                .map_err(anyhow::Error::from)
                .and_then(|entries| Ok(serde_json::to_string(&HistoryResponse { user, entries })?)),
        };

        match reply {
            Ok(line) => writeln!(stdout, "{line}")?,
            Err(e) => {
                log::warn!("ipc: request failed: {e}");
                write_error(&mut stdout, &e.to_string())?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn write_error(out: &mut impl Write, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(out, "{err_json}")?;
    out.flush()?;
    Ok(())
}

fn print_prediction(response: &PredictResponse) {
    let r = &response.result;
    println!("=== PREDICTION ===");
    println!("  churn probability: {:.2}%", r.probability * 100.0);
    println!("  churn prediction:  {}", if r.will_churn { "yes" } else { "no" });
    println!("  risk level:        {}", r.risk);
    if let Some(total) = r.total_charges {
        println!("  total charges:     ${total:.2}");
    }

    println!();
    println!("=== FEATURE IMPACT (log-odds) ===");
    for f in &response.explanation {
        println!("  {:<40} {:+.4}   value={}", f.feature, f.impact, f.value);
    }

    println!();
    println!("=== RETENTION SCENARIOS ===");
    for o in &r.scenarios {
        match o {
            ScenarioOutcome::Scored { scenario, new_probability, reduction, .. } => println!(
                "  {:<30} new={:>6.2}%  improvement={:>6.2}%",
                scenario,
                new_probability * 100.0,
                reduction * 100.0
            ),
            ScenarioOutcome::Failed { scenario, reason } => {
                println!("  {scenario:<30} FAILED: {reason}")
            }
        }
    }
    match &r.recommendation {
        Some(name) => println!("\n  Recommendation: {name}"),
        None => println!("\n  Recommendation: none of the scenarios lowers risk"),
    }
}

fn print_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("  (No predictions recorded yet)");
        return;
    }
    for e in entries {
        println!(
            "  {} | {:>6.2}% | {:<12} | total=${:.2}",
            e.created_at,
            e.probability * 100.0,
            e.risk,
            e.total_charges.unwrap_or(0.0)
        );
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
