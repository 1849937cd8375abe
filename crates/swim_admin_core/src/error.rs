//! crates/swim_admin_core/src/error.rs
//!
//! Failures that degrade a result instead of aborting it, and the error type
//! returned by the form save flows.

use crate::domain::{AssociationLink, EntityKind, ItemId};
use crate::ports::PortError;
use crate::validation::ValidationError;
use std::fmt;

/// Which side of a reconciliation a link call belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOp {
    Add,
    Remove,
}

impl fmt::Display for LinkOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkOp::Add => f.write_str("add"),
            LinkOp::Remove => f.write_str("remove"),
        }
    }
}

/// A failure that was recovered from locally.
///
/// These never fail the surrounding operation; they are handed back to the
/// caller next to the result so it can show warnings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecoverableError {
    #[error("Failed to enrich {kind} {item_id} with {related} {related_id}: {source}")]
    Enrichment {
        kind: EntityKind,
        item_id: ItemId,
        related: EntityKind,
        related_id: ItemId,
        source: PortError,
    },
    #[error("Failed to {op} link {link}: {source}")]
    Link {
        op: LinkOp,
        link: AssociationLink,
        source: PortError,
    },
}

/// Errors that stop a form submission.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// Rejected before any network call was made.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The primary create/update call failed; no links were touched.
    #[error("Save failed: {0}")]
    Port(#[from] PortError),
}
