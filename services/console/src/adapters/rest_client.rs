//! services/console/src/adapters/rest_client.rs
//!
//! The REST adapter: the concrete implementation of the `AdminApiService` port.
//! It talks to the platform's JSON API over HTTP using `reqwest` and maps
//! camelCase wire records into core domain types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use swim_admin_core::domain::{
    AssociationLink, EntityKind, Exercise, ExerciseDraft, Item, ItemDraft, ItemId, Page,
    PageDraft, Plan, PlanDraft, Relation, SwimSet, SwimSetDraft, Upload, User, Workout,
    WorkoutDraft,
};
use swim_admin_core::ports::{AdminApiService, PortError, PortResult};
use tracing::{debug, error};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// HTTP client for the platform API.
#[derive(Clone)]
pub struct RestApiAdapter {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RestApiAdapter {
    /// Creates an adapter with its own connection pool and request timeout.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, token))
    }

    /// Creates an adapter reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> PortResult<Response> {
        let response = builder.send().await.map_err(|e| {
            error!("Upstream request failed: {:?}", e);
            PortError::Unexpected(format!("Upstream request failed: {}", e))
        })?;
        ensure_success(response).await
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> PortResult<T> {
        let response = self.send(builder).await?;
        response.json::<T>().await.map_err(|e| {
            error!("Failed to decode upstream response: {:?}", e);
            PortError::Unexpected(format!("Invalid response body: {}", e))
        })
    }
}

//=========================================================================================
// Response Helpers
//=========================================================================================

/// Maps non-2xx statuses onto `PortError`, keeping the body for diagnostics.
async fn ensure_success(response: Response) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(match status {
        StatusCode::NOT_FOUND => PortError::NotFound(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized,
        _ => PortError::Unexpected(format!("Upstream API error ({}): {}", status.as_u16(), body)),
    })
}

fn decode_item(kind: EntityKind, value: Value) -> PortResult<Item> {
    fn parse<T: DeserializeOwned>(value: Value) -> PortResult<T> {
        serde_json::from_value(value)
            .map_err(|e| PortError::Unexpected(format!("Invalid record: {}", e)))
    }
    Ok(match kind {
        EntityKind::Exercise => Item::Exercise(parse::<ExerciseRecord>(value)?.to_domain()),
        EntityKind::Workout => Item::Workout(parse::<WorkoutRecord>(value)?.to_domain()),
        EntityKind::SwimSet => Item::SwimSet(parse::<SwimSetRecord>(value)?.to_domain()),
        EntityKind::Plan => Item::Plan(parse::<PlanRecord>(value)?.to_domain()),
        EntityKind::Page => Item::Page(parse::<PageRecord>(value)?.to_domain()),
        EntityKind::Upload => Item::Upload(parse::<UploadRecord>(value)?.to_domain()),
        EntityKind::User => Item::User(parse::<UserRecord>(value)?.to_domain()),
    })
}

fn decode_items(kind: EntityKind, values: Vec<Value>) -> PortResult<Vec<Item>> {
    values
        .into_iter()
        .map(|value| decode_item(kind, value))
        .collect()
}

//=========================================================================================
// Wire Record Structs
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExerciseRecord {
    id: ItemId,
    title: String,
    description: Option<String>,
    level: Option<String>,
    category: Option<String>,
    upload_id: Option<ItemId>,
    created_at: DateTime<Utc>,
}
impl ExerciseRecord {
    fn to_domain(self) -> Exercise {
        Exercise {
            id: self.id,
            title: self.title,
            description: self.description,
            level: self.level,
            category: self.category,
            upload_id: self.upload_id,
            created_at: self.created_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkoutRecord {
    id: ItemId,
    title: String,
    description: Option<String>,
    category: Option<String>,
    created_at: DateTime<Utc>,
}
impl WorkoutRecord {
    fn to_domain(self) -> Workout {
        Workout {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            created_at: self.created_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwimSetRecord {
    id: ItemId,
    #[serde(default)]
    title: String,
    workout_id: Option<ItemId>,
    exercise_id: Option<ItemId>,
    distance: Option<u32>,
    repetition: Option<u32>,
    rest_time_seconds: Option<u32>,
    created_at: DateTime<Utc>,
}
impl SwimSetRecord {
    fn to_domain(self) -> SwimSet {
        SwimSet {
            id: self.id,
            title: self.title,
            workout_id: self.workout_id,
            exercise_id: self.exercise_id,
            distance: self.distance,
            repetition: self.repetition,
            rest_time_seconds: self.rest_time_seconds,
            created_at: self.created_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanRecord {
    id: ItemId,
    title: String,
    description: Option<String>,
    category: Option<String>,
    created_at: DateTime<Utc>,
}
impl PlanRecord {
    fn to_domain(self) -> Plan {
        Plan {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            created_at: self.created_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageRecord {
    id: ItemId,
    title: String,
    content: Option<String>,
    upload_id: Option<ItemId>,
    created_at: DateTime<Utc>,
}
impl PageRecord {
    fn to_domain(self) -> Page {
        Page {
            id: self.id,
            title: self.title,
            content: self.content,
            upload_id: self.upload_id,
            created_at: self.created_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadRecord {
    id: ItemId,
    filename: String,
    #[serde(rename = "type")]
    file_type: Option<String>,
    path: String,
    created_at: DateTime<Utc>,
}
impl UploadRecord {
    fn to_domain(self) -> Upload {
        Upload {
            id: self.id,
            filename: self.filename,
            file_type: self.file_type,
            path: self.path,
            created_at: self.created_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    id: ItemId,
    username: String,
    email: Option<String>,
    role: Option<String>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            role: self.role,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// Wire Payload Structs
//=========================================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExercisePayload<'a> {
    title: &'a str,
    description: Option<&'a str>,
    level: Option<&'a str>,
    category: Option<&'a str>,
    upload_id: Option<ItemId>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkoutPayload<'a> {
    title: &'a str,
    description: Option<&'a str>,
    category: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SwimSetPayload<'a> {
    title: &'a str,
    workout_id: Option<ItemId>,
    exercise_id: ItemId,
    distance: u32,
    repetition: u32,
    rest_time_seconds: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PagePayload<'a> {
    title: &'a str,
    content: Option<&'a str>,
    upload_id: Option<ItemId>,
}

/// The JSON body for a create/update call.
fn payload(draft: &ItemDraft) -> PortResult<Value> {
    let value = match draft {
        ItemDraft::Exercise(ExerciseDraft {
            title,
            description,
            level,
            category,
            upload_id,
        }) => serde_json::to_value(ExercisePayload {
            title,
            description: description.as_deref(),
            level: level.as_deref(),
            category: category.as_deref(),
            upload_id: *upload_id,
        }),
        ItemDraft::Workout(WorkoutDraft {
            title,
            description,
            category,
        })
        | ItemDraft::Plan(PlanDraft {
            title,
            description,
            category,
        }) => serde_json::to_value(WorkoutPayload {
            title,
            description: description.as_deref(),
            category: category.as_deref(),
        }),
        ItemDraft::SwimSet(SwimSetDraft {
            title,
            workout_id,
            exercise_id,
            distance,
            repetition,
            rest_time_seconds,
        }) => serde_json::to_value(SwimSetPayload {
            title,
            workout_id: *workout_id,
            exercise_id: *exercise_id,
            distance: *distance,
            repetition: *repetition,
            rest_time_seconds: *rest_time_seconds,
        }),
        ItemDraft::Page(PageDraft {
            title,
            content,
            upload_id,
        }) => serde_json::to_value(PagePayload {
            title,
            content: content.as_deref(),
            upload_id: *upload_id,
        }),
    };
    value.map_err(|e| PortError::Unexpected(format!("Failed to encode payload: {}", e)))
}

fn link_path(link: &AssociationLink) -> String {
    link.to_string()
}

fn related_path(relation: Relation, owner_id: ItemId) -> String {
    format!("{}/{}/{}", relation.owner, owner_id, relation.member)
}

//=========================================================================================
// Port Implementation
//=========================================================================================

#[async_trait]
impl AdminApiService for RestApiAdapter {
    async fn list(&self, kind: EntityKind) -> PortResult<Vec<Item>> {
        let values: Vec<Value> = self.fetch(self.request(Method::GET, kind.segment())).await?;
        decode_items(kind, values)
    }

    async fn get(&self, kind: EntityKind, id: ItemId) -> PortResult<Item> {
        let path = format!("{}/{}", kind, id);
        let value: Value = self.fetch(self.request(Method::GET, &path)).await?;
        decode_item(kind, value)
    }

    async fn create(&self, draft: ItemDraft) -> PortResult<Item> {
        let kind = draft.kind();
        let body = payload(&draft)?;
        let value: Value = self
            .fetch(self.request(Method::POST, kind.segment()).json(&body))
            .await?;
        decode_item(kind, value)
    }

    async fn update(&self, id: ItemId, draft: ItemDraft) -> PortResult<Item> {
        let kind = draft.kind();
        let body = payload(&draft)?;
        let path = format!("{}/{}", kind, id);
        let value: Value = self
            .fetch(self.request(Method::PUT, &path).json(&body))
            .await?;
        decode_item(kind, value)
    }

    async fn delete(&self, kind: EntityKind, id: ItemId) -> PortResult<()> {
        let path = format!("{}/{}", kind, id);
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn list_related(&self, relation: Relation, owner_id: ItemId) -> PortResult<Vec<Item>> {
        let path = related_path(relation, owner_id);
        let values: Vec<Value> = self.fetch(self.request(Method::GET, &path)).await?;
        decode_items(relation.member, values)
    }

    async fn add_link(&self, link: AssociationLink) -> PortResult<()> {
        self.send(self.request(Method::POST, &link_path(&link))).await?;
        Ok(())
    }

    async fn remove_link(&self, link: AssociationLink) -> PortResult<()> {
        self.send(self.request(Method::DELETE, &link_path(&link)))
            .await?;
        Ok(())
    }
}
