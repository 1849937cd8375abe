//! crates/swim_admin_core/src/ports.rs
//!
//! Defines the service contract (trait) the core logic consumes.
//! The trait forms the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete REST client used to reach the platform API.

use crate::domain::{AssociationLink, EntityKind, Item, ItemDraft, ItemId, Relation};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the transport (network, HTTP status, JSON).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Operation cancelled")]
    Cancelled,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Port (Trait)
//=========================================================================================

#[async_trait]
pub trait AdminApiService: Send + Sync {
    // --- Collection CRUD ---
    async fn list(&self, kind: EntityKind) -> PortResult<Vec<Item>>;

    async fn get(&self, kind: EntityKind, id: ItemId) -> PortResult<Item>;

    async fn create(&self, draft: ItemDraft) -> PortResult<Item>;

    async fn update(&self, id: ItemId, draft: ItemDraft) -> PortResult<Item>;

    async fn delete(&self, kind: EntityKind, id: ItemId) -> PortResult<()>;

    // --- Many-to-many Associations ---
    /// Members currently linked to `owner_id` through `relation`.
    async fn list_related(&self, relation: Relation, owner_id: ItemId) -> PortResult<Vec<Item>>;

    async fn add_link(&self, link: AssociationLink) -> PortResult<()>;

    async fn remove_link(&self, link: AssociationLink) -> PortResult<()>;
}
