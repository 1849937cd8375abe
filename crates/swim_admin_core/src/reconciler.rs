//! crates/swim_admin_core/src/reconciler.rs
//!
//! Converges a many-to-many relation on the server to the set of members the
//! user picked in a form, with the fewest link calls.

use crate::domain::{AssociationLink, ItemId, Record, Relation};
use crate::error::{LinkOp, RecoverableError};
use crate::ports::{AdminApiService, PortResult};
use futures::future::join_all;
use std::collections::BTreeSet;
use tracing::{info, warn};

//=========================================================================================
// Selection State
//=========================================================================================

/// Persisted vs. selected member ids for one relation of one form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    persisted: BTreeSet<ItemId>,
    selected: BTreeSet<ItemId>,
}

impl SelectionState {
    /// A create form: nothing is linked yet.
    pub fn for_create() -> Self {
        Self::default()
    }

    /// An edit form starts with the selection equal to what the server has.
    pub fn for_edit(persisted: impl IntoIterator<Item = ItemId>) -> Self {
        let persisted: BTreeSet<ItemId> = persisted.into_iter().collect();
        Self {
            selected: persisted.clone(),
            persisted,
        }
    }

    pub fn persisted(&self) -> &BTreeSet<ItemId> {
        &self.persisted
    }

    pub fn selected(&self) -> &BTreeSet<ItemId> {
        &self.selected
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selected.contains(&id)
    }

    pub fn select(&mut self, id: ItemId) {
        self.selected.insert(id);
    }

    pub fn deselect(&mut self, id: ItemId) {
        self.selected.remove(&id);
    }

    /// Checkbox semantics: flips membership and returns the new state.
    pub fn toggle(&mut self, id: ItemId) -> bool {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
            return true;
        }
        false
    }

    pub fn set_selected(&mut self, ids: impl IntoIterator<Item = ItemId>) {
        self.selected = ids.into_iter().collect();
    }

    pub fn plan(&self) -> ReconcilePlan {
        ReconcilePlan::diff(&self.persisted, &self.selected)
    }
}

//=========================================================================================
// Plan
//=========================================================================================

/// The add/remove calls needed to turn `persisted` into `selected`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub to_add: BTreeSet<ItemId>,
    pub to_remove: BTreeSet<ItemId>,
}

impl ReconcilePlan {
    pub fn diff(persisted: &BTreeSet<ItemId>, selected: &BTreeSet<ItemId>) -> Self {
        Self {
            to_add: selected.difference(persisted).copied().collect(),
            to_remove: persisted.difference(selected).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_remove.len()
    }

    /// The member set after every call succeeded.
    pub fn apply_to(&self, persisted: &BTreeSet<ItemId>) -> BTreeSet<ItemId> {
        persisted
            .difference(&self.to_remove)
            .chain(self.to_add.iter())
            .copied()
            .collect()
    }
}

//=========================================================================================
// Reconciler
//=========================================================================================

/// How link calls are issued. Failures are independent either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyMode {
    #[default]
    Sequential,
    Concurrent,
}

/// What happened when a plan was applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub added: Vec<ItemId>,
    pub removed: Vec<ItemId>,
    pub failures: Vec<RecoverableError>,
}

impl ReconcileReport {
    /// True when every planned call succeeded.
    pub fn is_converged(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AssociationReconciler {
    relation: Relation,
    mode: ApplyMode,
}

impl AssociationReconciler {
    pub fn new(relation: Relation) -> Self {
        Self {
            relation,
            mode: ApplyMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ApplyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Reads the currently linked members of `owner_id` for an edit form.
    pub async fn load_selection(
        &self,
        api: &dyn AdminApiService,
        owner_id: ItemId,
    ) -> PortResult<SelectionState> {
        let members = api.list_related(self.relation, owner_id).await?;
        Ok(SelectionState::for_edit(members.iter().map(Record::id)))
    }

    /// Applies the selection to `owner_id`. The selection is consumed; a new
    /// one has to be loaded before saving again.
    pub async fn apply(
        &self,
        api: &dyn AdminApiService,
        owner_id: ItemId,
        selection: SelectionState,
    ) -> ReconcileReport {
        let plan = selection.plan();
        if plan.is_empty() {
            return ReconcileReport::default();
        }
        info!(
            "Reconciling {} for {}: +{} -{}",
            self.relation,
            owner_id,
            plan.to_add.len(),
            plan.to_remove.len()
        );

        let calls: Vec<(LinkOp, AssociationLink)> = plan
            .to_add
            .iter()
            .map(|&id| (LinkOp::Add, id))
            .chain(plan.to_remove.iter().map(|&id| (LinkOp::Remove, id)))
            .map(|(op, member_id)| {
                (
                    op,
                    AssociationLink {
                        relation: self.relation,
                        owner_id,
                        member_id,
                    },
                )
            })
            .collect();

        let outcomes: Vec<(LinkOp, AssociationLink, PortResult<()>)> = match self.mode {
            ApplyMode::Sequential => {
                let mut outcomes = Vec::with_capacity(calls.len());
                for (op, link) in calls {
                    let result = call(api, op, link).await;
                    outcomes.push((op, link, result));
                }
                outcomes
            }
            ApplyMode::Concurrent => {
                join_all(calls.into_iter().map(|(op, link)| async move {
                    let result = call(api, op, link).await;
                    (op, link, result)
                }))
                .await
            }
        };

        let mut report = ReconcileReport::default();
        for (op, link, result) in outcomes {
            match (op, result) {
                (LinkOp::Add, Ok(())) => report.added.push(link.member_id),
                (LinkOp::Remove, Ok(())) => report.removed.push(link.member_id),
                (op, Err(source)) => {
                    warn!("Failed to {} link {}: {}", op, link, source);
                    report
                        .failures
                        .push(RecoverableError::Link { op, link, source });
                }
            }
        }
        report
    }
}

async fn call(api: &dyn AdminApiService, op: LinkOp, link: AssociationLink) -> PortResult<()> {
    match op {
        LinkOp::Add => api.add_link(link).await,
        LinkOp::Remove => api.remove_link(link).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[ItemId]) -> BTreeSet<ItemId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn diff_adds_new_and_removes_dropped_members() {
        let plan = ReconcilePlan::diff(&set(&[1, 2, 3]), &set(&[2, 3, 4]));
        assert_eq!(plan.to_add, set(&[4]));
        assert_eq!(plan.to_remove, set(&[1]));
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn create_mode_only_adds() {
        let mut selection = SelectionState::for_create();
        selection.select(5);
        selection.select(6);
        let plan = selection.plan();
        assert_eq!(plan.to_add, set(&[5, 6]));
        assert!(plan.to_remove.is_empty());
    }

    #[test]
    fn plan_is_disjoint_and_converges() {
        let persisted = set(&[1, 3, 5, 7, 9]);
        let selected = set(&[2, 3, 4, 5, 10]);
        let plan = ReconcilePlan::diff(&persisted, &selected);
        assert!(plan.to_add.is_disjoint(&plan.to_remove));
        assert_eq!(plan.apply_to(&persisted), selected);
        // Every change is required: size equals the symmetric difference.
        assert_eq!(plan.len(), persisted.symmetric_difference(&selected).count());
    }

    #[test]
    fn second_run_after_success_is_a_no_op() {
        let persisted = set(&[1, 2]);
        let selected = set(&[2, 8]);
        let converged = ReconcilePlan::diff(&persisted, &selected).apply_to(&persisted);
        assert!(ReconcilePlan::diff(&converged, &selected).is_empty());
    }

    #[test]
    fn edit_state_starts_unchanged_and_toggles() {
        let mut selection = SelectionState::for_edit([4, 2]);
        assert!(selection.plan().is_empty());
        assert!(!selection.toggle(4));
        assert!(selection.toggle(11));
        assert!(selection.is_selected(11));
        assert_eq!(selection.plan().to_add, set(&[11]));
        assert_eq!(selection.plan().to_remove, set(&[4]));
        selection.set_selected([2]);
        assert_eq!(selection.plan().to_remove, set(&[4]));
        assert!(selection.plan().to_add.is_empty());
        assert_eq!(selection.persisted(), &set(&[2, 4]));
    }
}
