//! crates/swim_admin_core/src/forms.rs
//!
//! Form state for the create/edit pages and the save flows behind them:
//! validate, write the record, then reconcile its associations.

use crate::domain::{
    EntityKind, ExerciseDraft, Item, ItemDraft, ItemId, PageDraft, PlanDraft, Record, Relation,
    SwimSetDraft, WorkoutDraft,
};
use crate::error::FormError;
use crate::ports::{AdminApiService, PortError, PortResult};
use crate::reconciler::{ApplyMode, AssociationReconciler, ReconcileReport, SelectionState};
use crate::validation::{
    optional_text, parse_bounded, parse_id, parse_optional_id, parse_rest_time, require_text,
    ValidationResult,
};
use tracing::{error, info};

/// The saved record and one report per reconciled relation.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub item: Item,
    pub reports: Vec<(Relation, ReconcileReport)>,
}

impl SaveOutcome {
    pub fn is_fully_converged(&self) -> bool {
        self.reports.iter().all(|(_, report)| report.is_converged())
    }
}

/// Creates when `existing` is `None`, updates otherwise.
async fn write(api: &dyn AdminApiService, existing: Option<ItemId>, draft: ItemDraft) -> PortResult<Item> {
    let kind = draft.kind();
    let result = match existing {
        None => api.create(draft).await,
        Some(id) => api.update(id, draft).await,
    };
    if let Err(e) = &result {
        error!("Failed to save {}: {:?}", kind, e);
    }
    result
}

/// Reconciles each relation of the saved record in turn.
async fn reconcile_all(
    api: &dyn AdminApiService,
    owner_id: ItemId,
    selections: Vec<(Relation, ApplyMode, SelectionState)>,
) -> Vec<(Relation, ReconcileReport)> {
    let mut reports = Vec::with_capacity(selections.len());
    for (relation, mode, selection) in selections {
        let report = AssociationReconciler::new(relation)
            .with_mode(mode)
            .apply(api, owner_id, selection)
            .await;
        reports.push((relation, report));
    }
    reports
}

//=========================================================================================
// Workout Form
//=========================================================================================

#[derive(Debug, Clone, Default)]
pub struct WorkoutForm {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub swim_sets: SelectionState,
    pub plans: SelectionState,
}

impl WorkoutForm {
    /// An edit form pre-filled from the server, selections included.
    pub async fn load(api: &dyn AdminApiService, id: ItemId) -> PortResult<Self> {
        let workout = api
            .get(EntityKind::Workout, id)
            .await?
            .into_workout()
            .ok_or_else(|| PortError::Unexpected(format!("Item {} is not a workout", id)))?;
        let swim_sets = AssociationReconciler::new(Relation::WORKOUT_SWIM_SETS)
            .load_selection(api, id)
            .await?;
        let plans = AssociationReconciler::new(Relation::WORKOUT_PLANS)
            .load_selection(api, id)
            .await?;
        Ok(Self {
            title: workout.title,
            description: workout.description,
            category: workout.category,
            swim_sets,
            plans,
        })
    }

    pub fn validate(&self) -> ValidationResult<WorkoutDraft> {
        Ok(WorkoutDraft {
            title: require_text("title", &self.title)?,
            description: optional_text(self.description.as_deref()),
            category: optional_text(self.category.as_deref()),
        })
    }

    /// Saves the workout, then links swim-sets one by one and plans concurrently.
    pub async fn save(
        self,
        api: &dyn AdminApiService,
        existing: Option<ItemId>,
    ) -> Result<SaveOutcome, FormError> {
        let draft = self.validate()?;
        let item = write(api, existing, ItemDraft::Workout(draft)).await?;
        let owner_id = item.id();
        info!("Workout {} saved; reconciling associations.", owner_id);

        let reports = reconcile_all(
            api,
            owner_id,
            vec![
                (Relation::WORKOUT_SWIM_SETS, ApplyMode::Sequential, self.swim_sets),
                (Relation::WORKOUT_PLANS, ApplyMode::Concurrent, self.plans),
            ],
        )
        .await;
        Ok(SaveOutcome { item, reports })
    }
}

//=========================================================================================
// Plan Form
//=========================================================================================

#[derive(Debug, Clone, Default)]
pub struct PlanForm {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub workouts: SelectionState,
}

impl PlanForm {
    pub async fn load(api: &dyn AdminApiService, id: ItemId) -> PortResult<Self> {
        let plan = api
            .get(EntityKind::Plan, id)
            .await?
            .into_plan()
            .ok_or_else(|| PortError::Unexpected(format!("Item {} is not a plan", id)))?;
        let workouts = AssociationReconciler::new(Relation::PLAN_WORKOUTS)
            .load_selection(api, id)
            .await?;
        Ok(Self {
            title: plan.title,
            description: plan.description,
            category: plan.category,
            workouts,
        })
    }

    pub fn validate(&self) -> ValidationResult<PlanDraft> {
        Ok(PlanDraft {
            title: require_text("title", &self.title)?,
            description: optional_text(self.description.as_deref()),
            category: optional_text(self.category.as_deref()),
        })
    }

    pub async fn save(
        self,
        api: &dyn AdminApiService,
        existing: Option<ItemId>,
    ) -> Result<SaveOutcome, FormError> {
        let draft = self.validate()?;
        let item = write(api, existing, ItemDraft::Plan(draft)).await?;
        let owner_id = item.id();
        info!("Plan {} saved; reconciling workouts.", owner_id);

        let reports = reconcile_all(
            api,
            owner_id,
            vec![(Relation::PLAN_WORKOUTS, ApplyMode::Concurrent, self.workouts)],
        )
        .await;
        Ok(SaveOutcome { item, reports })
    }
}

//=========================================================================================
// Swim-set, Exercise and Page Forms (no associations)
//=========================================================================================

pub const MAX_DISTANCE: u32 = 10_000;
pub const MAX_REPETITION: u32 = 1_000;

/// Raw text as typed into the swim-set form.
#[derive(Debug, Clone, Default)]
pub struct SwimSetForm {
    pub title: String,
    pub workout_id: Option<String>,
    pub exercise_id: String,
    pub distance: String,
    pub repetition: String,
    pub rest_time: String,
}

impl SwimSetForm {
    pub fn validate(&self) -> ValidationResult<SwimSetDraft> {
        Ok(SwimSetDraft {
            title: require_text("title", &self.title)?,
            workout_id: parse_optional_id("workout", self.workout_id.as_deref())?,
            exercise_id: parse_id("exercise", &self.exercise_id)?,
            distance: parse_bounded("distance", &self.distance, 1, MAX_DISTANCE)?,
            repetition: parse_bounded("repetition", &self.repetition, 1, MAX_REPETITION)?,
            rest_time_seconds: parse_rest_time("rest time", &self.rest_time)?,
        })
    }

    pub async fn save(
        &self,
        api: &dyn AdminApiService,
        existing: Option<ItemId>,
    ) -> Result<Item, FormError> {
        let draft = self.validate()?;
        Ok(write(api, existing, ItemDraft::SwimSet(draft)).await?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseForm {
    pub title: String,
    pub description: Option<String>,
    pub level: Option<String>,
    pub category: Option<String>,
    pub upload_id: Option<String>,
}

impl ExerciseForm {
    pub fn validate(&self) -> ValidationResult<ExerciseDraft> {
        Ok(ExerciseDraft {
            title: require_text("title", &self.title)?,
            description: optional_text(self.description.as_deref()),
            level: optional_text(self.level.as_deref()),
            category: optional_text(self.category.as_deref()),
            upload_id: parse_optional_id("upload", self.upload_id.as_deref())?,
        })
    }

    pub async fn save(
        &self,
        api: &dyn AdminApiService,
        existing: Option<ItemId>,
    ) -> Result<Item, FormError> {
        let draft = self.validate()?;
        Ok(write(api, existing, ItemDraft::Exercise(draft)).await?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageForm {
    pub title: String,
    pub content: Option<String>,
    pub upload_id: Option<String>,
}

impl PageForm {
    pub fn validate(&self) -> ValidationResult<PageDraft> {
        Ok(PageDraft {
            title: require_text("title", &self.title)?,
            content: optional_text(self.content.as_deref()),
            upload_id: parse_optional_id("upload", self.upload_id.as_deref())?,
        })
    }

    pub async fn save(
        &self,
        api: &dyn AdminApiService,
        existing: Option<ItemId>,
    ) -> Result<Item, FormError> {
        let draft = self.validate()?;
        Ok(write(api, existing, ItemDraft::Page(draft)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    #[test]
    fn swim_set_form_parses_every_number() {
        let form = SwimSetForm {
            title: "Main set".to_string(),
            workout_id: Some("".to_string()),
            exercise_id: "3".to_string(),
            distance: "100".to_string(),
            repetition: "8".to_string(),
            rest_time: "0:20".to_string(),
        };
        let draft = form.validate().unwrap();
        assert_eq!(draft.workout_id, None);
        assert_eq!(draft.exercise_id, 3);
        assert_eq!(draft.distance, 100);
        assert_eq!(draft.repetition, 8);
        assert_eq!(draft.rest_time_seconds, 20);
    }

    #[test]
    fn swim_set_form_reports_the_first_bad_field() {
        let form = SwimSetForm {
            title: "Main set".to_string(),
            exercise_id: "3".to_string(),
            distance: "lots".to_string(),
            repetition: "8".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            form.validate(),
            Err(ValidationError::NotANumber { field: "distance", .. })
        ));
    }

    #[test]
    fn negative_ids_are_out_of_range() {
        let form = SwimSetForm {
            title: "Main set".to_string(),
            workout_id: Some("-4".to_string()),
            exercise_id: "-3".to_string(),
            distance: "100".to_string(),
            repetition: "2".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            form.validate(),
            Err(ValidationError::OutOfRange { field: "workout", .. })
        ));

        let form = SwimSetForm {
            workout_id: None,
            ..form
        };
        assert!(matches!(
            form.validate(),
            Err(ValidationError::OutOfRange { field: "exercise", .. })
        ));

        let page = PageForm {
            title: "About".to_string(),
            upload_id: Some("-1".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            page.validate(),
            Err(ValidationError::OutOfRange { field: "upload", .. })
        ));
    }

    #[test]
    fn workout_form_trims_and_drops_blank_optionals() {
        let form = WorkoutForm {
            title: "  Threshold  ".to_string(),
            description: Some("   ".to_string()),
            category: Some("Endurance".to_string()),
            ..Default::default()
        };
        let draft = form.validate().unwrap();
        assert_eq!(draft.title, "Threshold");
        assert_eq!(draft.description, None);
        assert_eq!(draft.category.as_deref(), Some("Endurance"));
    }
}
