use crate::defaults::{resolve_default_params, RequestContext};
use crate::mapper::extract_parameters;
use crate::model::{FieldMetadata, SubmittedRecord};
use crate::reconciler::FieldReconciler;
use crate::store::JsonFileFormStore;
use crate::{HandlerConfiguration, HandlerError, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::info;

/// Command-line arguments for the offline handler tool.
#[derive(Parser, Debug)]
#[command(author, version, about = "Form processor webform handler", long_about = None)]
struct Args {
    /// Handler configuration (JSON).
    #[arg(long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the handler summary.
    Summary,
    /// Reconcile a form file with the configured field selection.
    Reconcile {
        /// Form elements (JSON array). Created when missing.
        #[arg(long)]
        form: PathBuf,
        /// Field descriptions, as the `values` of a getfields response.
        #[arg(long)]
        metadata: Option<PathBuf>,
    },
    /// Print the call parameters for a saved submission.
    Extract {
        /// Submitted values (JSON object).
        #[arg(long)]
        record: PathBuf,
        /// Identifier of the submitting actor.
        #[arg(long)]
        actor_id: Option<String>,
    },
    /// Print the parameters of the defaults lookup for a request.
    Defaults {
        /// Query parameter of the request, as key=value. Repeatable.
        #[arg(long = "query", value_parser = parse_query_pair)]
        query: Vec<(String, String)>,
        /// Identifier of the current actor.
        #[arg(long)]
        actor_id: Option<String>,
    },
}

/// Runs the handler tool.
///
/// # Arguments
///
/// * `args` - Optional command-line arguments (defaults to std::env::args())
pub fn run(args: Option<Vec<String>>) -> Result<()> {
    let args = if let Some(args) = args {
        Args::parse_from(args)
    } else {
        Args::parse()
    };

    let config = HandlerConfiguration::from_path(&args.config)?;

    match args.command {
        Command::Summary => {
            println!("{}", config.summary());
            Ok(())
        }
        Command::Reconcile { form, metadata } => reconcile(&config, &form, metadata.as_deref()),
        Command::Extract { record, actor_id } => {
            let record: SubmittedRecord = read_json(&record)?;
            let actor_id = actor_id.map(Value::String);
            let params = extract_parameters(
                &record,
                &config.form_processor_fields,
                config.current_contact_key(),
                actor_id.as_ref(),
            );
            println!("{}", serde_json::to_string_pretty(&params)?);
            Ok(())
        }
        Command::Defaults { query, actor_id } => {
            let request = RequestContext {
                query: query.into_iter().collect(),
                actor_id: actor_id.map(Value::String),
            };
            let params = resolve_default_params(&config.form_processor_params, &request);
            println!("{}", serde_json::to_string_pretty(&params)?);
            Ok(())
        }
    }
}

fn reconcile(config: &HandlerConfiguration, form: &Path, metadata: Option<&Path>) -> Result<()> {
    let metadata = match metadata {
        Some(path) => FieldMetadata::from_values(&read_json::<Map<String, Value>>(path)?),
        None => FieldMetadata::new(),
    };

    let mut store = JsonFileFormStore::open(form)?;
    let outcome =
        FieldReconciler::new(&mut store).reconcile(&config.form_processor_fields, &metadata)?;

    info!("Wrote {}", store.path().display());
    println!("added: {}", outcome.added.join(", "));
    println!("removed: {}", outcome.removed.join(", "));
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        HandlerError::InvalidInput(format!("cannot read {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&raw)?)
}

fn parse_query_pair(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}
