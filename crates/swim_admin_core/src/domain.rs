//! crates/swim_admin_core/src/domain.rs
//!
//! Defines the pure, core data structures for the admin console.
//! These structs are independent of any HTTP client or serialization format.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Server-assigned identifier, unique per entity kind.
pub type ItemId = i64;

//=========================================================================================
// Entity Kinds
//=========================================================================================

/// Every collection the upstream REST API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Exercise,
    Workout,
    SwimSet,
    Plan,
    Page,
    Upload,
    User,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Exercise,
        EntityKind::Workout,
        EntityKind::SwimSet,
        EntityKind::Plan,
        EntityKind::Page,
        EntityKind::Upload,
        EntityKind::User,
    ];

    /// The REST collection segment, e.g. `swim-sets`.
    pub fn segment(self) -> &'static str {
        match self {
            EntityKind::Exercise => "exercises",
            EntityKind::Workout => "workouts",
            EntityKind::SwimSet => "swim-sets",
            EntityKind::Plan => "plans",
            EntityKind::Page => "pages",
            EntityKind::Upload => "uploads",
            EntityKind::User => "users",
        }
    }

    /// Human label used in placeholders and log lines.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Exercise => "Exercise",
            EntityKind::Workout => "Workout",
            EntityKind::SwimSet => "Swim set",
            EntityKind::Plan => "Plan",
            EntityKind::Page => "Page",
            EntityKind::Upload => "Upload",
            EntityKind::User => "User",
        }
    }

    /// Parses a collection segment back into a kind.
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.segment() == segment)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

//=========================================================================================
// Domain Records
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: ItemId,
    pub title: String,
    pub description: Option<String>,
    pub level: Option<String>,
    pub category: Option<String>,
    pub upload_id: Option<ItemId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    pub id: ItemId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One row of a workout: `repetition` x `distance` metres of an exercise.
#[derive(Debug, Clone, PartialEq)]
pub struct SwimSet {
    pub id: ItemId,
    pub title: String,
    pub workout_id: Option<ItemId>,
    pub exercise_id: Option<ItemId>,
    pub distance: Option<u32>,
    pub repetition: Option<u32>,
    pub rest_time_seconds: Option<u32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub id: ItemId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A public content page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: ItemId,
    pub title: String,
    pub content: Option<String>,
    pub upload_id: Option<ItemId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub id: ItemId,
    pub filename: String,
    pub file_type: Option<String>,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: ItemId,
    pub username: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Field Values
//=========================================================================================

/// The value of a named field, as seen by sorting and enrichment.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(i64),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Number(i64::from(value))
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Number(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

/// Uniform read access to anything the list engine can filter and sort.
pub trait Record {
    fn id(&self) -> ItemId;
    fn title(&self) -> &str;
    /// Free text searched alongside the title (description or page content).
    fn body_text(&self) -> Option<&str>;
    fn category(&self) -> Option<&str>;
    /// Looks up a field by its camelCase name.
    fn field(&self, key: &str) -> Option<FieldValue>;
}

//=========================================================================================
// Item (tagged union over the records)
//=========================================================================================

/// Any record as received from the API.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Exercise(Exercise),
    Workout(Workout),
    SwimSet(SwimSet),
    Plan(Plan),
    Page(Page),
    Upload(Upload),
    User(User),
}

impl Item {
    pub fn kind(&self) -> EntityKind {
        match self {
            Item::Exercise(_) => EntityKind::Exercise,
            Item::Workout(_) => EntityKind::Workout,
            Item::SwimSet(_) => EntityKind::SwimSet,
            Item::Plan(_) => EntityKind::Plan,
            Item::Page(_) => EntityKind::Page,
            Item::Upload(_) => EntityKind::Upload,
            Item::User(_) => EntityKind::User,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Item::Exercise(x) => x.created_at,
            Item::Workout(x) => x.created_at,
            Item::SwimSet(x) => x.created_at,
            Item::Plan(x) => x.created_at,
            Item::Page(x) => x.created_at,
            Item::Upload(x) => x.created_at,
            Item::User(x) => x.created_at,
        }
    }

    pub fn as_swim_set(&self) -> Option<&SwimSet> {
        match self {
            Item::SwimSet(set) => Some(set),
            _ => None,
        }
    }

    pub fn into_workout(self) -> Option<Workout> {
        match self {
            Item::Workout(workout) => Some(workout),
            _ => None,
        }
    }

    pub fn into_plan(self) -> Option<Plan> {
        match self {
            Item::Plan(plan) => Some(plan),
            _ => None,
        }
    }
}

fn opt_text(value: &Option<String>) -> Option<FieldValue> {
    value.as_deref().map(FieldValue::from)
}

fn opt_num<T: Into<FieldValue> + Copy>(value: Option<T>) -> Option<FieldValue> {
    value.map(Into::into)
}

impl Record for Item {
    fn id(&self) -> ItemId {
        match self {
            Item::Exercise(x) => x.id,
            Item::Workout(x) => x.id,
            Item::SwimSet(x) => x.id,
            Item::Plan(x) => x.id,
            Item::Page(x) => x.id,
            Item::Upload(x) => x.id,
            Item::User(x) => x.id,
        }
    }

    fn title(&self) -> &str {
        match self {
            Item::Exercise(x) => &x.title,
            Item::Workout(x) => &x.title,
            Item::SwimSet(x) => &x.title,
            Item::Plan(x) => &x.title,
            Item::Page(x) => &x.title,
            Item::Upload(x) => &x.filename,
            Item::User(x) => &x.username,
        }
    }

    fn body_text(&self) -> Option<&str> {
        match self {
            Item::Exercise(x) => x.description.as_deref(),
            Item::Workout(x) => x.description.as_deref(),
            Item::Plan(x) => x.description.as_deref(),
            Item::Page(x) => x.content.as_deref(),
            Item::SwimSet(_) | Item::Upload(_) | Item::User(_) => None,
        }
    }

    fn category(&self) -> Option<&str> {
        match self {
            Item::Exercise(x) => x.category.as_deref(),
            Item::Workout(x) => x.category.as_deref(),
            Item::Plan(x) => x.category.as_deref(),
            Item::Upload(x) => x.file_type.as_deref(),
            Item::User(x) => x.role.as_deref(),
            Item::SwimSet(_) | Item::Page(_) => None,
        }
    }

    fn field(&self, key: &str) -> Option<FieldValue> {
        match key {
            "id" => return Some(self.id().into()),
            "title" => return Some(self.title().into()),
            "createdAt" => return Some(self.created_at().into()),
            "category" => return self.category().map(FieldValue::from),
            _ => {}
        }
        match self {
            Item::Exercise(x) => match key {
                "description" => opt_text(&x.description),
                "level" => opt_text(&x.level),
                "uploadId" => opt_num(x.upload_id),
                _ => None,
            },
            Item::Workout(x) => match key {
                "description" => opt_text(&x.description),
                _ => None,
            },
            Item::SwimSet(x) => match key {
                "workoutId" => opt_num(x.workout_id),
                "exerciseId" => opt_num(x.exercise_id),
                "distance" => opt_num(x.distance),
                "repetition" => opt_num(x.repetition),
                "restTimeSeconds" => opt_num(x.rest_time_seconds),
                _ => None,
            },
            Item::Plan(x) => match key {
                "description" => opt_text(&x.description),
                _ => None,
            },
            Item::Page(x) => match key {
                "content" => opt_text(&x.content),
                "uploadId" => opt_num(x.upload_id),
                _ => None,
            },
            Item::Upload(x) => match key {
                "filename" => Some(x.filename.as_str().into()),
                "type" => opt_text(&x.file_type),
                "path" => Some(x.path.as_str().into()),
                _ => None,
            },
            Item::User(x) => match key {
                "username" => Some(x.username.as_str().into()),
                "email" => opt_text(&x.email),
                "role" => opt_text(&x.role),
                _ => None,
            },
        }
    }
}

//=========================================================================================
// Enriched Items
//=========================================================================================

/// An item plus fields pulled from related collections or derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedItem {
    pub item: Item,
    pub extras: BTreeMap<&'static str, FieldValue>,
}

impl EnrichedItem {
    pub fn new(item: Item) -> Self {
        Self {
            item,
            extras: BTreeMap::new(),
        }
    }

    pub fn extra(&self, key: &str) -> Option<&FieldValue> {
        self.extras.get(key)
    }
}

impl Record for EnrichedItem {
    fn id(&self) -> ItemId {
        self.item.id()
    }

    fn title(&self) -> &str {
        self.item.title()
    }

    fn body_text(&self) -> Option<&str> {
        self.item.body_text()
    }

    fn category(&self) -> Option<&str> {
        self.item.category()
    }

    fn field(&self, key: &str) -> Option<FieldValue> {
        self.extras
            .get(key)
            .cloned()
            .or_else(|| self.item.field(key))
    }
}

//=========================================================================================
// Associations
//=========================================================================================

/// A many-to-many relation between two entity kinds, owned by one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relation {
    pub owner: EntityKind,
    pub member: EntityKind,
}

impl Relation {
    pub const WORKOUT_SWIM_SETS: Relation = Relation {
        owner: EntityKind::Workout,
        member: EntityKind::SwimSet,
    };
    pub const WORKOUT_PLANS: Relation = Relation {
        owner: EntityKind::Workout,
        member: EntityKind::Plan,
    };
    pub const PLAN_WORKOUTS: Relation = Relation {
        owner: EntityKind::Plan,
        member: EntityKind::Workout,
    };
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.owner, self.member)
    }
}

/// A single `(owner, member)` pair of a relation. Existence is binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssociationLink {
    pub relation: Relation,
    pub owner_id: ItemId,
    pub member_id: ItemId,
}

impl fmt::Display for AssociationLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.relation.owner, self.owner_id, self.relation.member, self.member_id
        )
    }
}

//=========================================================================================
// Drafts (create/update payloads; the server assigns ids and timestamps)
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExerciseDraft {
    pub title: String,
    pub description: Option<String>,
    pub level: Option<String>,
    pub category: Option<String>,
    pub upload_id: Option<ItemId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkoutDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SwimSetDraft {
    pub title: String,
    pub workout_id: Option<ItemId>,
    pub exercise_id: ItemId,
    pub distance: u32,
    pub repetition: u32,
    pub rest_time_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageDraft {
    pub title: String,
    pub content: Option<String>,
    pub upload_id: Option<ItemId>,
}

/// A payload for `create`/`update`; the variant decides the target collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemDraft {
    Exercise(ExerciseDraft),
    Workout(WorkoutDraft),
    SwimSet(SwimSetDraft),
    Plan(PlanDraft),
    Page(PageDraft),
}

impl ItemDraft {
    pub fn kind(&self) -> EntityKind {
        match self {
            ItemDraft::Exercise(_) => EntityKind::Exercise,
            ItemDraft::Workout(_) => EntityKind::Workout,
            ItemDraft::SwimSet(_) => EntityKind::SwimSet,
            ItemDraft::Plan(_) => EntityKind::Plan,
            ItemDraft::Page(_) => EntityKind::Page,
        }
    }
}
