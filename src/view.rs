// Dashboard view state and its transitions

use crate::client::ProxyApi;
use crate::error::{FetchError, ViewError};
use crate::filter::Filter;
use crate::profile::DatasetProfile;
use crate::record::{self, FieldValue, Fields, Record};
use crate::stats::Stats;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Source of "now" for statistics and creation stamps
pub type Clock = fn() -> DateTime<Utc>;

/// The cell being edited and its pending value
#[derive(Debug, Clone, PartialEq)]
pub struct StagedEdit {
    pub record_id: String,
    pub field: String,
    pub value: FieldValue,
}

/// Client-side state of the dashboard.
///
/// All mutation goes through the transition methods below. Failures from the
/// proxy never escape a transition as a panic: they are logged, the previous
/// state is kept, and the error is stored in [`Dashboard::last_error`].
///
/// Refresh and save are split into a begin/finish pair so a shared view does
/// not have to stay locked while a request is in flight. Nothing orders
/// concurrent requests; whichever result is applied last wins.
#[derive(Debug)]
pub struct Dashboard {
    profile: DatasetProfile,
    records: Vec<Record>,
    loading: bool,
    filter: Filter,
    edit: Option<StagedEdit>,
    draft: Fields,
    form_open: bool,
    stats: Stats,
    last_error: Option<FetchError>,
    clock: Clock,
}

impl Dashboard {
    pub fn new(profile: DatasetProfile) -> Self {
        let draft = profile.draft_defaults.clone();
        Self {
            profile,
            records: Vec::new(),
            loading: true,
            filter: Filter::default(),
            edit: None,
            draft,
            form_open: false,
            stats: Stats::default(),
            last_error: None,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn profile(&self) -> &DatasetProfile {
        &self.profile
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    // ========================================================================
    // Fetch and normalize
    // ========================================================================

    pub fn begin_refresh(&mut self) {
        self.loading = true;
    }

    /// Give up on an in-flight list call; the list stays as it was
    pub fn abort_refresh(&mut self) {
        self.loading = false;
    }

    /// Apply the outcome of a list call.
    ///
    /// On success the list is replaced wholesale and statistics recomputed.
    /// On failure the previous list stays. Loading is cleared either way.
    pub fn finish_refresh(&mut self, outcome: Result<Value, FetchError>) -> Result<usize, FetchError> {
        let result = outcome.and_then(record::normalize);
        self.loading = false;

        match result {
            Ok(records) => {
                let count = records.len();
                self.records = records;
                self.recompute_stats();
                self.last_error = None;
                debug!(count, "Record list replaced");
                Ok(count)
            }
            Err(e) => Err(self.fail("fetch", e)),
        }
    }

    /// Run one full fetch-and-normalize cycle
    pub async fn refresh(&mut self, api: &dyn ProxyApi) -> Result<usize, FetchError> {
        self.begin_refresh();
        let outcome = api.list().await;
        self.finish_refresh(outcome)
    }

    fn recompute_stats(&mut self) {
        self.stats = Stats::compute(&self.records, &self.profile, (self.clock)());
    }

    fn fail(&mut self, action: &str, e: FetchError) -> FetchError {
        warn!(action, error = %e, "Dashboard request failed");
        self.last_error = Some(e.clone());
        e
    }

    // ========================================================================
    // Search
    // ========================================================================

    pub fn search(&self) -> &str {
        self.filter.term()
    }

    pub fn set_search(&mut self, term: &str) {
        self.filter = Filter::new(term);
    }

    /// Records matching the current search term, in list order
    pub fn filtered(&self) -> Vec<&Record> {
        self.filter.apply(&self.records)
    }

    /// Message shown when nothing is listed
    pub fn empty_message(&self) -> &'static str {
        if self.filter.is_empty() {
            "No records yet. Use \"add\" to create the first one."
        } else {
            "No results found. Try a different search."
        }
    }

    // ========================================================================
    // Inline edit
    // ========================================================================

    pub fn staged_edit(&self) -> Option<&StagedEdit> {
        self.edit.as_ref()
    }

    pub fn is_editing(&self, record_id: &str, field: &str) -> bool {
        self.edit
            .as_ref()
            .is_some_and(|e| e.record_id == record_id && e.field == field)
    }

    /// Start editing one cell, abandoning any other unsaved edit
    pub fn begin_edit(&mut self, record_id: &str, field: &str) -> Result<(), ViewError> {
        let record = self
            .records
            .iter()
            .find(|r| r.id == record_id)
            .ok_or_else(|| ViewError::UnknownRecord(record_id.to_string()))?;

        let value = record.get(field).cloned().unwrap_or_else(|| FieldValue::text(""));
        if let Some(previous) = self.edit.replace(StagedEdit {
            record_id: record_id.to_string(),
            field: field.to_string(),
            value,
        }) {
            debug!(record_id = %previous.record_id, field = %previous.field, "Abandoned unsaved edit");
        }
        Ok(())
    }

    pub fn set_edit_value(&mut self, value: FieldValue) {
        if let Some(edit) = self.edit.as_mut() {
            edit.value = value;
        }
    }

    /// Stage typed input, read according to the kind of value being edited
    pub fn set_edit_input(&mut self, raw: &str) {
        if let Some(edit) = self.edit.as_mut() {
            edit.value = FieldValue::coerce_input(raw, Some(&edit.value));
        }
    }

    /// Drop the staged edit without contacting the proxy
    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    /// Leave the editing state, handing back what was staged
    pub fn take_staged_edit(&mut self) -> Option<StagedEdit> {
        self.edit.take()
    }

    /// Apply the outcome of an update call for a staged edit.
    ///
    /// Success patches that one field of that one record; failure leaves the
    /// list as it was.
    pub fn finish_save(&mut self, edit: StagedEdit, outcome: Result<Value, FetchError>) -> Result<(), FetchError> {
        if let Err(e) = outcome {
            return Err(self.fail("update", e));
        }

        if let Some(record) = self.records.iter_mut().find(|r| r.id == edit.record_id) {
            record.set(edit.field, edit.value);
            self.recompute_stats();
        }
        self.last_error = None;
        Ok(())
    }

    /// Save the staged edit. Does nothing when no edit is staged.
    pub async fn save_edit(&mut self, api: &dyn ProxyApi) -> Result<(), FetchError> {
        let Some(edit) = self.take_staged_edit() else {
            return Ok(());
        };

        let mut fields = Fields::new();
        fields.insert(edit.field.clone(), edit.value.clone());
        let outcome = api.update(&edit.record_id, &fields).await;
        self.finish_save(edit, outcome)
    }

    // ========================================================================
    // Record creation
    // ========================================================================

    pub fn form_open(&self) -> bool {
        self.form_open
    }

    pub fn draft(&self) -> &Fields {
        &self.draft
    }

    pub fn open_create_form(&mut self) {
        self.form_open = true;
    }

    /// Close the form; the draft is kept for the next time it opens
    pub fn close_create_form(&mut self) {
        self.form_open = false;
    }

    pub fn set_draft_field(&mut self, field: impl Into<String>, value: FieldValue) {
        self.draft.insert(field.into(), value);
    }

    /// Set a draft field from typed input. Fields with a default take the
    /// default's kind; any other field is text.
    pub fn set_draft_input(&mut self, field: impl Into<String>, raw: &str) {
        let field = field.into();
        let value = FieldValue::coerce_input(raw, self.profile.draft_defaults.get(&field));
        self.draft.insert(field, value);
    }

    /// Fields sent on creation: the draft plus the creation date and a zeroed
    /// view counter
    pub fn draft_submission(&self, today: NaiveDate) -> Fields {
        let mut fields = self.draft.clone();
        fields.insert(
            self.profile.date_field.clone(),
            FieldValue::Date(today.format("%Y-%m-%d").to_string()),
        );
        if let Some(counter) = &self.profile.view_count_field {
            fields.insert(counter.clone(), FieldValue::int(0));
        }
        fields
    }

    /// Submit the draft.
    ///
    /// On success the form closes, the draft resets and the list is fetched
    /// again so server-assigned fields show up. On failure the form stays open
    /// with the draft intact.
    pub async fn submit_draft(&mut self, api: &dyn ProxyApi) -> Result<(), FetchError> {
        let fields = self.draft_submission((self.clock)().date_naive());
        if let Err(e) = api.create(&fields).await {
            return Err(self.fail("create", e));
        }

        info!(profile = %self.profile.name, "Record created");
        self.form_open = false;
        self.draft = self.profile.draft_defaults.clone();
        // A failed re-fetch is recorded in last_error; the creation itself stands.
        let _ = self.refresh(api).await;
        Ok(())
    }

    /// Delete a record, then fetch the list again
    pub async fn delete_record(&mut self, api: &dyn ProxyApi, record_id: &str) -> Result<(), FetchError> {
        if let Err(e) = api.delete(record_id).await {
            return Err(self.fail("delete", e));
        }

        info!(record_id, "Record deleted");
        let _ = self.refresh(api).await;
        Ok(())
    }

    // ========================================================================
    // Rendering helpers
    // ========================================================================

    /// Colour name for a record's status
    pub fn status_color(&self, record: &Record) -> &str {
        record
            .get_str(&self.profile.status_field)
            .map(|status| self.profile.status_color(status))
            .unwrap_or(self.profile.neutral_color.as_str())
    }
}
