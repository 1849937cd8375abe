//! crates/swim_admin_core/src/memory.rs
//!
//! An in-memory `AdminApiService`, used by tests and local development.
//! Failures and per-record latency can be injected to exercise the
//! degraded paths of the engines.

use crate::domain::{
    AssociationLink, EntityKind, Exercise, Item, ItemDraft, ItemId, Page, Plan, Record, Relation,
    SwimSet, Workout,
};
use crate::ports::{AdminApiService, PortError, PortResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Default)]
struct Store {
    items: BTreeMap<(EntityKind, ItemId), Item>,
    links: BTreeSet<(EntityKind, EntityKind, ItemId, ItemId)>,
    next_id: ItemId,
    failing_lists: HashSet<EntityKind>,
    failing_gets: HashSet<(EntityKind, ItemId)>,
    failing_links: HashSet<ItemId>,
    get_delays: HashMap<(EntityKind, ItemId), Duration>,
    in_flight: usize,
    peak_in_flight: usize,
    calls: Vec<String>,
}

#[derive(Default)]
pub struct InMemoryApi {
    store: Mutex<Store>,
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds a record as if it had been created earlier.
    pub fn insert(&self, item: Item) {
        let mut store = self.lock();
        store.next_id = store.next_id.max(item.id());
        store.items.insert((item.kind(), item.id()), item);
    }

    pub fn link(&self, relation: Relation, owner_id: ItemId, member_id: ItemId) {
        self.lock()
            .links
            .insert((relation.owner, relation.member, owner_id, member_id));
    }

    pub fn linked(&self, relation: Relation, owner_id: ItemId) -> BTreeSet<ItemId> {
        self.lock()
            .links
            .iter()
            .filter(|(owner, member, owner_key, _)| {
                *owner == relation.owner && *member == relation.member && *owner_key == owner_id
            })
            .map(|(_, _, _, member_id)| *member_id)
            .collect()
    }

    pub fn fail_list(&self, kind: EntityKind) {
        self.lock().failing_lists.insert(kind);
    }

    pub fn fail_get(&self, kind: EntityKind, id: ItemId) {
        self.lock().failing_gets.insert((kind, id));
    }

    /// Makes every add/remove touching `member_id` fail.
    pub fn fail_link(&self, member_id: ItemId) {
        self.lock().failing_links.insert(member_id);
    }

    pub fn delay_get(&self, kind: EntityKind, id: ItemId, delay: Duration) {
        self.lock().get_delays.insert((kind, id), delay);
    }

    /// Highest number of `get` calls that were running at once.
    pub fn peak_concurrent_gets(&self) -> usize {
        self.lock().peak_in_flight
    }

    /// Every call made so far, as `"<op> <path>"`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn record(&self, call: String) {
        self.lock().calls.push(call);
    }
}

fn materialize(id: ItemId, draft: ItemDraft, created_at: DateTime<Utc>) -> Item {
    match draft {
        ItemDraft::Exercise(d) => Item::Exercise(Exercise {
            id,
            title: d.title,
            description: d.description,
            level: d.level,
            category: d.category,
            upload_id: d.upload_id,
            created_at,
        }),
        ItemDraft::Workout(d) => Item::Workout(Workout {
            id,
            title: d.title,
            description: d.description,
            category: d.category,
            created_at,
        }),
        ItemDraft::SwimSet(d) => Item::SwimSet(SwimSet {
            id,
            title: d.title,
            workout_id: d.workout_id,
            exercise_id: Some(d.exercise_id),
            distance: Some(d.distance),
            repetition: Some(d.repetition),
            rest_time_seconds: Some(d.rest_time_seconds),
            created_at,
        }),
        ItemDraft::Plan(d) => Item::Plan(Plan {
            id,
            title: d.title,
            description: d.description,
            category: d.category,
            created_at,
        }),
        ItemDraft::Page(d) => Item::Page(Page {
            id,
            title: d.title,
            content: d.content,
            upload_id: d.upload_id,
            created_at,
        }),
    }
}

fn not_found(kind: EntityKind, id: ItemId) -> PortError {
    PortError::NotFound(format!("{} {} not found", kind.label(), id))
}

#[async_trait]
impl AdminApiService for InMemoryApi {
    async fn list(&self, kind: EntityKind) -> PortResult<Vec<Item>> {
        self.record(format!("LIST {}", kind));
        let store = self.lock();
        if store.failing_lists.contains(&kind) {
            return Err(PortError::Unexpected(format!("listing {} failed", kind)));
        }
        Ok(store
            .items
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn get(&self, kind: EntityKind, id: ItemId) -> PortResult<Item> {
        self.record(format!("GET {}/{}", kind, id));
        let delay = {
            let mut store = self.lock();
            store.in_flight += 1;
            store.peak_in_flight = store.peak_in_flight.max(store.in_flight);
            store.get_delays.get(&(kind, id)).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut store = self.lock();
        store.in_flight -= 1;
        if store.failing_gets.contains(&(kind, id)) {
            return Err(PortError::Unexpected(format!("fetching {}/{} failed", kind, id)));
        }
        store
            .items
            .get(&(kind, id))
            .cloned()
            .ok_or_else(|| not_found(kind, id))
    }

    async fn create(&self, draft: ItemDraft) -> PortResult<Item> {
        let kind = draft.kind();
        self.record(format!("CREATE {}", kind));
        let mut store = self.lock();
        store.next_id += 1;
        let item = materialize(store.next_id, draft, Utc::now());
        store.items.insert((kind, item.id()), item.clone());
        Ok(item)
    }

    async fn update(&self, id: ItemId, draft: ItemDraft) -> PortResult<Item> {
        let kind = draft.kind();
        self.record(format!("UPDATE {}/{}", kind, id));
        let mut store = self.lock();
        let created_at = store
            .items
            .get(&(kind, id))
            .map(Item::created_at)
            .ok_or_else(|| not_found(kind, id))?;
        let item = materialize(id, draft, created_at);
        store.items.insert((kind, id), item.clone());
        Ok(item)
    }

    async fn delete(&self, kind: EntityKind, id: ItemId) -> PortResult<()> {
        self.record(format!("DELETE {}/{}", kind, id));
        let mut store = self.lock();
        store
            .items
            .remove(&(kind, id))
            .map(|_| ())
            .ok_or_else(|| not_found(kind, id))
    }

    async fn list_related(&self, relation: Relation, owner_id: ItemId) -> PortResult<Vec<Item>> {
        self.record(format!("LIST {}/{}/{}", relation.owner, owner_id, relation.member));
        let members = self.linked(relation, owner_id);
        let store = self.lock();
        if store.failing_lists.contains(&relation.member) {
            return Err(PortError::Unexpected(format!(
                "listing {} of {} {} failed",
                relation.member, relation.owner, owner_id
            )));
        }
        Ok(members
            .into_iter()
            .filter_map(|member_id| store.items.get(&(relation.member, member_id)).cloned())
            .collect())
    }

    async fn add_link(&self, link: AssociationLink) -> PortResult<()> {
        self.record(format!("ADD {}", link));
        let mut store = self.lock();
        if store.failing_links.contains(&link.member_id) {
            return Err(PortError::Unexpected(format!("linking {} failed", link)));
        }
        store.links.insert((
            link.relation.owner,
            link.relation.member,
            link.owner_id,
            link.member_id,
        ));
        Ok(())
    }

    async fn remove_link(&self, link: AssociationLink) -> PortResult<()> {
        self.record(format!("REMOVE {}", link));
        let mut store = self.lock();
        if store.failing_links.contains(&link.member_id) {
            return Err(PortError::Unexpected(format!("unlinking {} failed", link)));
        }
        store.links.remove(&(
            link.relation.owner,
            link.relation.member,
            link.owner_id,
            link.member_id,
        ));
        Ok(())
    }
}
