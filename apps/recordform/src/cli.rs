//! # CLI
//!
//! Command-line front end over the form controller and the records client.
//!
//! | Command  | Does                                                  |
//! |----------|-------------------------------------------------------|
//! | `fields` | Print the projection a layout requests                |
//! | `show`   | Load a form (add or edit) and print it                |
//! | `submit` | Load a form, bind values from a JSON file, save it    |
//! | `list`   | Paged list query                                      |
//! | `delete` | Delete one record                                     |
//!
//! Every `cmd_*` returns the text to print, so tests can call them directly.

use crate::config::{AppConfig, ConfigError, ConnectionArgs};
use crate::controller::{FormContext, FormController, FormError, SubmitOutcome};
use crate::notify::ConsoleNotifier;
use crate::teardown::Teardown;
use clap::{Args, Parser, Subcommand};
use recordform_client::{LayoutSource, ListQuery, SortOrder};
use recordform_core::mapping::{DATE_FORMAT, DATE_TIME_FORMAT};
use recordform_core::text::{camel_to_sentence_case, render_value};
use recordform_core::{DataType, FieldNode, Record, get_fields};
use serde_json::Value;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "recordform", version, about = "Metadata-driven clinical record forms")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the columns a layout projects
    Fields {
        #[arg(long)]
        entity: String,
        #[arg(long, default_value = "Edit")]
        view: String,
    },
    /// Load and print a form
    Show {
        #[arg(long)]
        entity: String,
        /// Existing record; omit for a blank add form
        #[arg(long)]
        id: Option<String>,
        /// Show related display text instead of ids
        #[arg(long)]
        preview: bool,
        /// Print the populated layout as JSON
        #[arg(long)]
        json: bool,
    },
    /// Bind values from a JSON object file and save the form
    Submit {
        #[arg(long)]
        entity: String,
        #[arg(long)]
        id: Option<String>,
        #[arg(long, value_name = "PATH")]
        values: PathBuf,
    },
    /// List records
    List(ListArgs),
    /// Delete a record
    Delete {
        #[arg(long)]
        entity: String,
        #[arg(long)]
        id: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub entity: String,
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = 10)]
    pub size: u32,
    #[arg(long)]
    pub sort: Option<String>,
    /// asc or desc (default asc)
    #[arg(long)]
    pub order: Option<SortOrder>,
    /// JSON array of filter objects
    #[arg(long)]
    pub filters: Option<String>,
}

impl ListArgs {
    pub fn query(&self) -> Result<ListQuery, CliError> {
        let mut query = ListQuery::default().page(self.page, self.size);
        if let Some(term) = &self.search {
            query = query.search(term.clone());
        }
        if let Some(field) = &self.sort {
            query = query.sort(field.clone(), self.order.or(Some(SortOrder::Asc)));
        }
        if let Some(raw) = &self.filters {
            query = query.filters(parse_filters(raw)?);
        }
        Ok(query)
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Client(#[from] recordform_client::Error),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Parse flags, install Ctrl-C teardown and run one command.
pub async fn run(cli: Cli) -> Result<String, CliError> {
    let config = AppConfig::from_args(&cli.connection)?;

    let teardown = Teardown::new();
    let on_signal = teardown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, closing form");
            on_signal.fire();
        }
    });

    match cli.command {
        Commands::Fields { entity, view } => cmd_fields(&config, &entity, &view).await,
        Commands::Show {
            entity,
            id,
            preview,
            json,
        } => cmd_show(&config, &teardown, &entity, id.as_deref(), preview, json).await,
        Commands::Submit { entity, id, values } => {
            cmd_submit(&config, &teardown, &entity, id.as_deref(), &values).await
        }
        Commands::List(args) => cmd_list(&config, &args.entity, &args.query()?).await,
        Commands::Delete { entity, id } => cmd_delete(&config, &entity, &id).await,
    }
}

/// One column per line.
pub async fn cmd_fields(config: &AppConfig, entity: &str, view: &str) -> Result<String, CliError> {
    let layout = config.layouts()?.fetch_layout(entity, view).await?;
    Ok(get_fields(&layout).join("\n"))
}

pub async fn cmd_show(
    config: &AppConfig,
    teardown: &Teardown,
    entity: &str,
    id: Option<&str>,
    preview: bool,
    json: bool,
) -> Result<String, CliError> {
    let mut controller = open_form(config, teardown, entity, id)?.with_preview(preview);
    controller.load().await?;
    controller.attach_lookups().await?;

    if json {
        return Ok(serde_json::to_string_pretty(controller.layout())?);
    }
    Ok(render_layout(controller.layout()))
}

pub async fn cmd_submit(
    config: &AppConfig,
    teardown: &Teardown,
    entity: &str,
    id: Option<&str>,
    values_path: &Path,
) -> Result<String, CliError> {
    let values = read_values(values_path)?;

    let mut controller = open_form(config, teardown, entity, id)?
        .with_notifier(Arc::new(ConsoleNotifier));
    controller.load().await?;
    if let Some(form) = controller.form_mut() {
        form.apply(&values).map_err(FormError::from)?;
    }

    match controller.submit().await? {
        SubmitOutcome::Saved(response) => Ok(serde_json::to_string_pretty(&response)?),
        SubmitOutcome::NotSaved(response) => {
            Err(CliError::Invalid(format!("server did not save the record: {}", response)))
        }
        SubmitOutcome::Invalid(violations) => {
            let lines: Vec<String> = violations.iter().map(ToString::to_string).collect();
            Err(CliError::Invalid(lines.join("\n")))
        }
    }
}

pub async fn cmd_list(config: &AppConfig, entity: &str, query: &ListQuery) -> Result<String, CliError> {
    let records = config.client()?.get_records(entity, query).await?;
    Ok(serde_json::to_string_pretty(&records)?)
}

pub async fn cmd_delete(config: &AppConfig, entity: &str, id: &str) -> Result<String, CliError> {
    let response = config.client()?.delete_record_by_id(entity, id).await?;
    info!(entity, id, "record deleted");
    Ok(serde_json::to_string_pretty(&response)?)
}

fn open_form(
    config: &AppConfig,
    teardown: &Teardown,
    entity: &str,
    id: Option<&str>,
) -> Result<FormController<recordform_client::Layouts>, CliError> {
    let mut context = FormContext::new(entity).with_tenant(&config.tenant_id);
    if let Some(id) = id {
        context = context.with_id(id);
    }
    Ok(FormController::new(context, config.client()?, config.layouts()?).with_teardown(teardown.clone()))
}

// =============================================================================
// HELPERS
// =============================================================================

/// Read a JSON object of `field -> value`.
pub fn read_values(path: &Path) -> Result<Record, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match serde_json::from_str(&raw)? {
        Value::Object(values) => Ok(values),
        _ => Err(CliError::Invalid(format!("{} must hold a JSON object", path.display()))),
    }
}

pub fn parse_filters(raw: &str) -> Result<Vec<Value>, CliError> {
    match serde_json::from_str(raw)? {
        Value::Array(filters) => Ok(filters),
        _ => Err(CliError::Invalid("--filters must be a JSON array".to_string())),
    }
}

/// Indented text view of a populated layout.
pub fn render_layout(layout: &[FieldNode]) -> String {
    let mut out = String::new();
    render_nodes(layout, 0, &mut out);
    out
}

fn render_nodes(nodes: &[FieldNode], depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for node in nodes {
        if node.is_container() {
            let title = node.label.clone().unwrap_or_else(|| camel_to_sentence_case(&node.field_name));
            let _ = writeln!(out, "{}[{}] {}", indent, node.data_type.as_str(), title.trim());
            render_nodes(&node.fields, depth + 1, out);
            continue;
        }

        let name = node.label.clone().unwrap_or_else(|| camel_to_sentence_case(&node.field_name));
        let format = node.format.as_deref().or(match node.data_type {
            DataType::Date => Some(DATE_FORMAT),
            DataType::DateTime => Some(DATE_TIME_FORMAT),
            _ => None,
        });
        let value = node
            .value
            .as_ref()
            .map(|value| render_value(value, format))
            .unwrap_or_default();
        let _ = write!(out, "{}{}: {}", indent, name, value);
        if let Some(options) = &node.data_source {
            let _ = write!(out, " ({} options)", options.len());
        }
        out.push('\n');

        if let (Some(view), Some(template)) = (&node.lookup_view, &node.lookup_view_template) {
            let _ = writeln!(out, "{}  ↳ {} ({} fields)", indent, view, template.len());
        }
    }
}
