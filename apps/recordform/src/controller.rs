//! # Form Controller
//!
//! Drives one record form through its lifecycle:
//!
//! ```text
//! Loading ──► Populating ──► Ready ──► Submitting ──► Closed
//!                              ▲            │
//!                              └── failure ─┘
//! ```
//!
//! - **Loading**: fetch the layout for `(entity, "Add" | "Edit")`. In edit
//!   mode the record is fetched with the layout's projection, flattened
//!   and mapped onto the tree. Lookup views are fetched on a background
//!   task that `load` never waits for.
//! - **Populating**: every entity-backed dropdown gets its option list.
//! - **Ready**: values are bound to a [`FormModel`]. Lookup templates that
//!   arrive later are stitched in by [`FormController::attach_lookups`].
//! - **Submitting**: validated values are rebuilt into a nested record and
//!   sent as a create (add) or a root-level JSON Patch (edit).
//!
//! Every remote call is raced against the form's [`Teardown`]. Closing or
//! dropping the controller cancels whatever is still in flight.

use crate::notify::{LogNotifier, Notifier};
use crate::teardown::Teardown;
use futures_util::future::join_all;
use recordform_client::{EntityClient, LayoutSource, ListQuery};
use recordform_core::{
    CompanionLookup, CoreError, FieldNode, FormModel, Layout, LookupKey, LookupTemplates,
    NestedIds, Record, ValueMapper, Violation, apply_dropdown_sources, attach_lookup_templates,
    find_dropdown_fields, find_nodes_with_lookup_view, flatten_object, get_fields,
    root_level_patch, unflatten_object, unique_lookup_keys,
};
use recordform_core::text::entity_display_name;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// View loaded for a new record.
pub const ADD_VIEW: &str = "Add";

/// View loaded for an existing record.
pub const EDIT_VIEW: &str = "Edit";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit,
}

impl FormMode {
    pub fn view_name(self) -> &'static str {
        match self {
            FormMode::Add => ADD_VIEW,
            FormMode::Edit => EDIT_VIEW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Loading,
    Populating,
    Ready,
    Submitting,
    Closed,
}

/// What a form is editing.
#[derive(Debug, Clone, Default)]
pub struct FormContext {
    pub entity_name: String,
    /// Present for an existing record.
    pub id: Option<String>,
    pub tenant_id: String,
}

impl FormContext {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into()).filter(|id: &String| !id.is_empty());
        self
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = tenant_id.into();
        self
    }

    pub fn mode(&self) -> FormMode {
        match self.id {
            Some(_) => FormMode::Edit,
            None => FormMode::Add,
        }
    }
}

/// Raised to subscribers after a successful save.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    Saved { id: Option<String>, response: Value },
}

/// Result of [`FormController::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Nothing was sent.
    Invalid(Vec<Violation>),
    /// The server acknowledged the save.
    Saved(Value),
    /// The server answered with an empty or falsy body.
    NotSaved(Value),
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Client(#[from] recordform_client::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("form was closed")]
    Cancelled,

    #[error("cannot {action} while {state:?}")]
    InvalidState { action: &'static str, state: FormState },
}

// =============================================================================
// CONTROLLER
// =============================================================================

pub struct FormController<L> {
    context: FormContext,
    client: EntityClient,
    layouts: L,
    notifier: Arc<dyn Notifier>,
    teardown: Teardown,
    events: Option<mpsc::UnboundedSender<FormEvent>>,
    preview: bool,
    companion: CompanionLookup,
    state: FormState,
    layout: Layout,
    record: Option<Record>,
    form: Option<FormModel>,
    lookups: Option<JoinHandle<LookupTemplates>>,
}

impl<L> FormController<L>
where
    L: LayoutSource + Clone + Send + Sync + 'static,
{
    pub fn new(context: FormContext, client: EntityClient, layouts: L) -> Self {
        Self {
            context,
            client,
            layouts,
            notifier: Arc::new(LogNotifier),
            teardown: Teardown::new(),
            events: None,
            preview: false,
            companion: CompanionLookup::default(),
            state: FormState::Loading,
            layout: Layout::new(),
            record: None,
            form: None,
            lookups: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Share an externally owned teardown signal (e.g. Ctrl-C).
    pub fn with_teardown(mut self, teardown: Teardown) -> Self {
        self.teardown = teardown;
        self
    }

    /// Map guid fields to their companion display text.
    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn with_companion_lookup(mut self, companion: CompanionLookup) -> Self {
        self.companion = companion;
        self
    }

    /// Receive [`FormEvent`]s. A new subscription replaces the previous one.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<FormEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn context(&self) -> &FormContext {
        &self.context
    }

    pub fn mode(&self) -> FormMode {
        self.context.mode()
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn teardown(&self) -> Teardown {
        self.teardown.clone()
    }

    /// The mapped, populated layout. Empty until loaded.
    pub fn layout(&self) -> &[FieldNode] {
        &self.layout
    }

    /// The flattened record being edited.
    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    pub fn form(&self) -> Option<&FormModel> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut FormModel> {
        self.form.as_mut()
    }

    /// Cancel in-flight work and close the form.
    pub fn close(&mut self) {
        self.teardown.fire();
        self.state = FormState::Closed;
    }

    // -------------------------------------------------------------------------
    // Load
    // -------------------------------------------------------------------------

    /// Loading → Populating → Ready.
    pub async fn load(&mut self) -> Result<(), FormError> {
        self.expect_state("load", FormState::Loading)?;
        let result = self.load_inner().await;
        if matches!(result, Err(FormError::Cancelled)) {
            self.state = FormState::Closed;
        }
        result
    }

    async fn load_inner(&mut self) -> Result<(), FormError> {
        let entity = self.context.entity_name.clone();
        let view = self.mode().view_name();
        info!(entity = %entity, view, "loading form");

        let layout = self.guard(self.layouts.fetch_layout(&entity, view)).await??;

        let keys = unique_lookup_keys(&find_nodes_with_lookup_view(&layout));
        if !keys.is_empty() {
            self.lookups = Some(tokio::spawn(fetch_lookup_templates(
                self.layouts.clone(),
                keys,
                self.teardown.clone(),
            )));
        }

        let (record, mapped) = self.map_record(&layout).await?;
        self.record = record;

        self.state = FormState::Populating;
        let populated = self.populate_dropdowns(&mapped).await?;

        self.form = Some(FormModel::from_layout(&populated));
        self.layout = populated;
        self.state = FormState::Ready;
        debug!(entity = %entity, pending_lookups = self.has_pending_lookups(), "form ready");

        if self.lookups.as_ref().is_some_and(JoinHandle::is_finished) {
            self.attach_lookups().await?;
        }
        Ok(())
    }

    /// Whether lookup views requested by `load` have not been attached yet.
    pub fn has_pending_lookups(&self) -> bool {
        self.lookups.is_some()
    }

    /// Wait for the lookup views started by `load` and stitch them onto the
    /// layout. Returns how many distinct views were attached.
    pub async fn attach_lookups(&mut self) -> Result<usize, FormError> {
        let Some(handle) = self.lookups.take() else {
            return Ok(0);
        };

        let templates = match self.guard(handle).await? {
            Ok(templates) => templates,
            Err(err) => {
                warn!(error = %err, "lookup task failed");
                return Ok(0);
            }
        };

        self.layout = attach_lookup_templates(&self.layout, &templates);
        debug!(lookups = templates.len(), "lookup views attached");
        Ok(templates.len())
    }

    async fn map_record(&self, layout: &[FieldNode]) -> Result<(Option<Record>, Layout), FormError> {
        let Some(id) = &self.context.id else {
            return Ok((None, self.mapper(None).map(layout)));
        };

        let fields = get_fields(layout);
        let fetched = self
            .guard(self.client.get_record_by_id(&self.context.entity_name, id, &fields))
            .await??;
        let record = match fetched {
            Value::Object(map) => flatten_object(&map),
            _ => Record::new(),
        };
        let mapped = self.mapper(Some(&record)).map(layout);
        Ok((Some(record), mapped))
    }

    fn mapper<'a>(&'a self, record: Option<&'a Record>) -> ValueMapper<'a> {
        ValueMapper::new(record)
            .preview(self.preview)
            .base_url(self.client.base_url())
            .companion_lookup(self.companion)
    }

    /// One unfiltered list fetch per dropdown field, all in flight together.
    async fn populate_dropdowns(&self, layout: &[FieldNode]) -> Result<Layout, FormError> {
        let fields = find_dropdown_fields(layout);
        if fields.is_empty() {
            return Ok(layout.to_vec());
        }

        let query = ListQuery::default();
        let fetches = fields.iter().map(|field| {
            let query = &query;
            async move {
                let result = self.client.get_records(&field.entity_name, query).await;
                (field, result)
            }
        });
        let results = self.guard(join_all(fetches)).await?;

        let mut sources = BTreeMap::new();
        for (field, result) in results {
            match result {
                Ok(Value::Array(items)) => {
                    sources.insert(field.path.clone(), items);
                }
                Ok(_) => debug!(entity = %field.entity_name, "dropdown response is not a list"),
                // Already logged by the client.
                Err(_) => {}
            }
        }
        Ok(apply_dropdown_sources(layout, &sources))
    }

    // -------------------------------------------------------------------------
    // Submit
    // -------------------------------------------------------------------------

    /// Validate and save. Invalid forms send nothing.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, FormError> {
        self.expect_state("submit", FormState::Ready)?;

        let violations = self.form.as_ref().map(FormModel::validate).unwrap_or_default();
        if !violations.is_empty() {
            debug!(count = violations.len(), "form is invalid");
            return Ok(SubmitOutcome::Invalid(violations));
        }

        self.state = FormState::Submitting;
        match self.send().await {
            Ok(response) if is_truthy(&response) => {
                let verb = match self.mode() {
                    FormMode::Add => "added",
                    FormMode::Edit => "updated",
                };
                let message = format!(
                    "{} has been {}.",
                    entity_display_name(&self.context.entity_name),
                    verb
                );
                self.notifier.success(&message);
                self.emit(FormEvent::Saved {
                    id: self.context.id.clone(),
                    response: response.clone(),
                });
                self.state = FormState::Closed;
                Ok(SubmitOutcome::Saved(response))
            }
            Ok(response) => {
                self.state = FormState::Ready;
                Ok(SubmitOutcome::NotSaved(response))
            }
            Err(FormError::Cancelled) => {
                self.state = FormState::Closed;
                Err(FormError::Cancelled)
            }
            Err(err) => {
                self.state = FormState::Ready;
                Err(err)
            }
        }
    }

    async fn send(&self) -> Result<Value, FormError> {
        let entity = &self.context.entity_name;
        let tenant_id = &self.context.tenant_id;
        let values = self.form.as_ref().map(FormModel::value).cloned().unwrap_or_default();

        match &self.context.id {
            Some(id) => {
                let original = self.record.clone().unwrap_or_default();
                let mut data = unflatten_object(&values, tenant_id, NestedIds::Existing(&original));
                data.insert("Id".to_string(), Value::String(id.clone()));
                let patch = root_level_patch(&original, &data);
                info!(entity = %entity, id = %id, operations = patch.len(), "patching record");
                Ok(self.guard(self.client.patch_record_by_id(entity, id, &patch)).await??)
            }
            None => {
                let data = unflatten_object(&values, tenant_id, NestedIds::Fresh);
                info!(entity = %entity, "adding record");
                Ok(self.guard(self.client.add_record(entity, &data)).await??)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, FormError> {
        self.teardown.guard(fut).await.ok_or(FormError::Cancelled)
    }

    fn expect_state(&self, action: &'static str, expected: FormState) -> Result<(), FormError> {
        if self.state != expected {
            return Err(FormError::InvalidState {
                action,
                state: self.state,
            });
        }
        Ok(())
    }

    fn emit(&self, event: FormEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means nobody is listening.
            let _ = tx.send(event);
        }
    }
}

impl<L> Drop for FormController<L> {
    fn drop(&mut self) {
        self.teardown.fire();
    }
}

/// Fetch each distinct lookup view once. Failures leave the view out.
async fn fetch_lookup_templates<L: LayoutSource + Clone>(
    layouts: L,
    keys: Vec<LookupKey>,
    teardown: Teardown,
) -> LookupTemplates {
    let fetches = keys.into_iter().map(|key| {
        let layouts = layouts.clone();
        async move {
            let result = layouts.fetch_layout(&key.entity_name, &key.lookup_view).await;
            (key, result)
        }
    });

    let Some(results) = teardown.guard(join_all(fetches)).await else {
        return LookupTemplates::new();
    };

    results
        .into_iter()
        .filter_map(|(key, result)| match result {
            Ok(layout) => Some((key, Arc::new(layout))),
            Err(err) => {
                warn!(lookup = %key, error = %err, "lookup view unavailable");
                None
            }
        })
        .collect()
}

/// Whether a save response counts as success.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
