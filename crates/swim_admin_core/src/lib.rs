pub mod aggregator;
pub mod detail;
pub mod domain;
pub mod error;
pub mod forms;
pub mod memory;
pub mod ports;
pub mod query;
pub mod reconciler;
pub mod search;
pub mod stats;
pub mod validation;

pub use aggregator::{Aggregated, EnrichmentRule, FetchAggregator};
pub use domain::{
    AssociationLink, EnrichedItem, EntityKind, FieldValue, Item, ItemDraft, ItemId, Record,
    Relation,
};
pub use error::{FormError, LinkOp, RecoverableError};
pub use ports::{AdminApiService, PortError, PortResult};
pub use query::{filter_sort_page, CategoryFilter, FilterState, Page, SortDirection};
pub use reconciler::{ApplyMode, AssociationReconciler, ReconcilePlan, ReconcileReport, SelectionState};
pub use validation::ValidationError;
