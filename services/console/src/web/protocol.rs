//! services/console/src/web/protocol.rs
//!
//! Defines the JSON protocol between the admin front-end and the console:
//! query parameters, request bodies and response payloads.

use crate::error::{WebError, WebResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use swim_admin_core::detail::WorkoutDetail;
use swim_admin_core::domain::{
    EnrichedItem, EntityKind, FieldValue, Item, ItemId, PlanDraft, Record, WorkoutDraft,
};
use swim_admin_core::error::RecoverableError;
use swim_admin_core::forms::{
    ExerciseForm, PageForm, PlanForm, SaveOutcome, SwimSetForm, WorkoutForm,
};
use swim_admin_core::query::{CategoryFilter, FilterState, Page, SortDirection};
use swim_admin_core::search::SearchHit;
use swim_admin_core::validation::ValidationResult;
use utoipa::{IntoParams, ToSchema};

pub const MAX_PAGE_SIZE: usize = 100;

//=========================================================================================
// Query Parameters
//=========================================================================================

/// Filter, sort and paging parameters of an admin list.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Case-insensitive search over title and description.
    pub q: Option<String>,
    /// Exact category, or `all`.
    pub category: Option<String>,
    /// Field to sort by, e.g. `title`, `createdAt`, `exerciseTitle`.
    pub sort: Option<String>,
    /// `asc` or `desc`.
    pub dir: Option<String>,
    /// Zero-based page index.
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Parameters of the public search page.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    pub q: Option<String>,
    pub category: Option<String>,
    /// Restricts results to one collection, e.g. `workouts`.
    pub kind: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl SearchParams {
    pub fn kind(&self) -> WebResult<Option<EntityKind>> {
        self.kind
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_kind)
            .transpose()
    }

    pub fn to_filter(&self, base: FilterState) -> WebResult<FilterState> {
        build_filter(
            base,
            self.q.as_deref(),
            self.category.as_deref(),
            self.sort.as_deref(),
            self.dir.as_deref(),
            self.page,
            self.page_size,
        )
    }
}

impl ListParams {
    pub fn to_filter(&self, base: FilterState) -> WebResult<FilterState> {
        build_filter(
            base,
            self.q.as_deref(),
            self.category.as_deref(),
            self.sort.as_deref(),
            self.dir.as_deref(),
            self.page,
            self.page_size,
        )
    }
}

/// Applies the parameters through the filter reducers, page last so that
/// the query setters do not reset it.
fn build_filter(
    mut filter: FilterState,
    q: Option<&str>,
    category: Option<&str>,
    sort: Option<&str>,
    dir: Option<&str>,
    page: Option<usize>,
    page_size: Option<usize>,
) -> WebResult<FilterState> {
    if let Some(size) = page_size {
        filter.page_size = NonZeroUsize::new(size)
            .filter(|size| size.get() <= MAX_PAGE_SIZE)
            .ok_or_else(|| {
                WebError::BadRequest(format!("page_size must be between 1 and {}", MAX_PAGE_SIZE))
            })?;
    }
    if let Some(term) = q {
        filter.set_search_term(term.trim());
    }
    if let Some(raw) = category {
        filter.set_category_filter(CategoryFilter::parse(raw));
    }
    if let Some(key) = sort.map(str::trim).filter(|key| !key.is_empty()) {
        filter.sort_key = key.to_string();
    }
    if let Some(raw) = dir {
        filter.sort_direction = parse_direction(raw)?;
    }
    if let Some(page) = page {
        filter.go_to_page(page);
    }
    Ok(filter)
}

fn parse_direction(raw: &str) -> WebResult<SortDirection> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "asc" => Ok(SortDirection::Asc),
        "desc" => Ok(SortDirection::Desc),
        other => Err(WebError::BadRequest(format!(
            "dir must be 'asc' or 'desc', got '{}'",
            other
        ))),
    }
}

/// Resolves a collection path segment such as `swim-sets`.
pub fn parse_kind(segment: &str) -> WebResult<EntityKind> {
    EntityKind::from_segment(segment)
        .ok_or_else(|| WebError::BadRequest(format!("Unknown collection '{}'", segment)))
}

//=========================================================================================
// Response Payloads
//=========================================================================================

/// A record flattened for display, enrichment fields included.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub kind: String,
    pub id: ItemId,
    pub title: String,
    /// Every field of the record by camelCase name, plus derived fields.
    #[schema(value_type = Object)]
    pub fields: BTreeMap<String, Value>,
}

/// Named fields of each kind exposed in `ItemView::fields`.
fn field_keys(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Exercise => &["description", "level", "category", "uploadId", "createdAt"],
        EntityKind::Workout | EntityKind::Plan => &["description", "category", "createdAt"],
        EntityKind::SwimSet => &[
            "workoutId",
            "exerciseId",
            "distance",
            "repetition",
            "restTimeSeconds",
            "createdAt",
        ],
        EntityKind::Page => &["content", "uploadId", "createdAt"],
        EntityKind::Upload => &["filename", "type", "path", "createdAt"],
        EntityKind::User => &["username", "email", "role", "createdAt"],
    }
}

fn field_json(value: Option<FieldValue>) -> Value {
    match value {
        None => Value::Null,
        Some(FieldValue::Text(text)) => Value::String(text),
        Some(FieldValue::Number(n)) => Value::from(n),
        Some(FieldValue::Timestamp(at)) => Value::String(timestamp(at)),
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<&EnrichedItem> for ItemView {
    fn from(enriched: &EnrichedItem) -> Self {
        let mut view = ItemView::from(&enriched.item);
        for (key, value) in &enriched.extras {
            view.fields
                .insert((*key).to_string(), field_json(Some(value.clone())));
        }
        view
    }
}

impl From<&Item> for ItemView {
    fn from(item: &Item) -> Self {
        let kind = item.kind();
        let fields = field_keys(kind)
            .iter()
            .map(|key| ((*key).to_string(), field_json(item.field(key))))
            .collect();
        Self {
            kind: kind.segment().to_string(),
            id: item.id(),
            title: item.title().to_string(),
            fields,
        }
    }
}

/// A degraded part of a response; the rest of the payload is still valid.
#[derive(Debug, Serialize, ToSchema)]
pub struct WarningView {
    /// `ENRICHMENT_FAILED` or `LINK_FAILED`.
    pub code: String,
    pub message: String,
}

impl From<&RecoverableError> for WarningView {
    fn from(err: &RecoverableError) -> Self {
        let code = match err {
            RecoverableError::Enrichment { .. } => "ENRICHMENT_FAILED",
            RecoverableError::Link { .. } => "LINK_FAILED",
        };
        Self {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

pub fn warnings<'a>(errors: impl IntoIterator<Item = &'a RecoverableError>) -> Vec<WarningView> {
    errors.into_iter().map(WarningView::from).collect()
}

/// One page of an admin list.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemPageResponse {
    pub items: Vec<ItemView>,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total: usize,
    pub warnings: Vec<WarningView>,
}

impl ItemPageResponse {
    pub fn new(page: Page<EnrichedItem>, warnings: Vec<WarningView>) -> Self {
        Self {
            items: page.items.iter().map(ItemView::from).collect(),
            page: page.page,
            page_size: page.page_size,
            page_count: page.page_count,
            total: page.total,
            warnings,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchHitView {
    pub kind: String,
    pub id: ItemId,
    pub title: String,
    pub snippet: Option<String>,
    pub category: Option<String>,
    pub created_at: String,
}

impl From<&SearchHit> for SearchHitView {
    fn from(hit: &SearchHit) -> Self {
        Self {
            kind: hit.kind.segment().to_string(),
            id: hit.id,
            title: hit.title.clone(),
            snippet: hit.snippet.clone(),
            category: hit.category.clone(),
            created_at: timestamp(hit.created_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub items: Vec<SearchHitView>,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total: usize,
}

impl From<Page<SearchHit>> for SearchResponse {
    fn from(page: Page<SearchHit>) -> Self {
        Self {
            items: page.items.iter().map(SearchHitView::from).collect(),
            page: page.page,
            page_size: page.page_size,
            page_count: page.page_count,
            total: page.total,
        }
    }
}

/// A workout with its set table.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDetailResponse {
    pub workout: ItemView,
    /// Rows carry `exerciseTitle`, `totalDistance`, `restTime` and `cumulativeDistance`.
    pub sets: Vec<ItemView>,
    pub total_distance: u64,
    pub warnings: Vec<WarningView>,
}

impl From<WorkoutDetail> for WorkoutDetailResponse {
    fn from(detail: WorkoutDetail) -> Self {
        Self {
            workout: ItemView::from(&Item::Workout(detail.workout)),
            sets: detail.sets.iter().map(ItemView::from).collect(),
            total_distance: detail.total_distance,
            warnings: warnings(&detail.warnings),
        }
    }
}

/// The outcome of reconciling one relation during a save.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkReportView {
    /// e.g. `swim-sets`.
    pub member: String,
    pub added: Vec<ItemId>,
    pub removed: Vec<ItemId>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub item: ItemView,
    pub links: Vec<LinkReportView>,
    /// False when some link calls failed; see `warnings`.
    pub converged: bool,
    pub warnings: Vec<WarningView>,
}

impl SaveResponse {
    pub fn from_item(item: &Item) -> Self {
        Self {
            item: ItemView::from(item),
            links: Vec::new(),
            converged: true,
            warnings: Vec::new(),
        }
    }
}

impl From<SaveOutcome> for SaveResponse {
    fn from(outcome: SaveOutcome) -> Self {
        let converged = outcome.is_fully_converged();
        let links = outcome
            .reports
            .iter()
            .map(|(relation, report)| LinkReportView {
                member: relation.member.segment().to_string(),
                added: report.added.clone(),
                removed: report.removed.clone(),
            })
            .collect();
        let warnings = warnings(outcome.reports.iter().flat_map(|(_, r)| &r.failures));
        Self {
            item: ItemView::from(&outcome.item),
            links,
            converged,
            warnings,
        }
    }
}

//=========================================================================================
// Request Bodies
//=========================================================================================

/// Create/update body for a workout. Omitted id lists leave links untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub swim_set_ids: Option<Vec<ItemId>>,
    pub plan_ids: Option<Vec<ItemId>>,
}

impl WorkoutRequest {
    /// Checks the submitted fields on their own, before anything is loaded.
    pub fn validate(&self) -> ValidationResult<WorkoutDraft> {
        WorkoutForm {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            ..Default::default()
        }
        .validate()
    }

    /// Overwrites the loaded form with the submitted values.
    pub fn apply_to(self, form: &mut WorkoutForm) {
        form.title = self.title;
        form.description = self.description;
        form.category = self.category;
        if let Some(ids) = self.swim_set_ids {
            form.swim_sets.set_selected(ids);
        }
        if let Some(ids) = self.plan_ids {
            form.plans.set_selected(ids);
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub workout_ids: Option<Vec<ItemId>>,
}

impl PlanRequest {
    pub fn validate(&self) -> ValidationResult<PlanDraft> {
        PlanForm {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            ..Default::default()
        }
        .validate()
    }

    pub fn apply_to(self, form: &mut PlanForm) {
        form.title = self.title;
        form.description = self.description;
        form.category = self.category;
        if let Some(ids) = self.workout_ids {
            form.workouts.set_selected(ids);
        }
    }
}

/// Swim-set fields arrive as typed by the user; numbers may be JSON numbers
/// or strings and are validated by the form.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwimSetRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "optional_raw")]
    #[schema(value_type = Option<String>)]
    pub workout_id: Option<String>,
    #[serde(default, deserialize_with = "raw")]
    #[schema(value_type = String)]
    pub exercise_id: String,
    #[serde(default, deserialize_with = "raw")]
    #[schema(value_type = String)]
    pub distance: String,
    #[serde(default, deserialize_with = "raw")]
    #[schema(value_type = String)]
    pub repetition: String,
    /// `MM:SS` or seconds.
    #[serde(default, deserialize_with = "raw")]
    #[schema(value_type = String)]
    pub rest_time: String,
}

impl From<SwimSetRequest> for SwimSetForm {
    fn from(request: SwimSetRequest) -> Self {
        SwimSetForm {
            title: request.title,
            workout_id: request.workout_id,
            exercise_id: request.exercise_id,
            distance: request.distance,
            repetition: request.repetition,
            rest_time: request.rest_time,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub level: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "optional_raw")]
    #[schema(value_type = Option<String>)]
    pub upload_id: Option<String>,
}

impl From<ExerciseRequest> for ExerciseForm {
    fn from(request: ExerciseRequest) -> Self {
        ExerciseForm {
            title: request.title,
            description: request.description,
            level: request.level,
            category: request.category,
            upload_id: request.upload_id,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default)]
    pub title: String,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "optional_raw")]
    #[schema(value_type = Option<String>)]
    pub upload_id: Option<String>,
}

impl From<PageRequest> for PageForm {
    fn from(request: PageRequest) -> Self {
        PageForm {
            title: request.title,
            content: request.content,
            upload_id: request.upload_id,
        }
    }
}

/// The body of `POST /admin/{kind}` and `PUT /admin/{kind}/{id}`; the
/// collection in the path decides which shape is expected.
#[derive(ToSchema)]
#[serde(untagged)]
pub enum SaveRequest {
    Workout(WorkoutRequest),
    Plan(PlanRequest),
    SwimSet(SwimSetRequest),
    Exercise(ExerciseRequest),
    Page(PageRequest),
}

/// Decodes a request body into the shape `T`, reporting problems as 400.
pub fn decode_body<T: serde::de::DeserializeOwned>(body: Value) -> WebResult<T> {
    serde_json::from_value(body).map_err(|e| WebError::BadRequest(format!("Invalid body: {}", e)))
}

fn raw_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

fn raw<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(raw_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn optional_raw<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(raw_text(Value::deserialize(deserializer)?))
}
