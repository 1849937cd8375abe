//! crates/swim_admin_core/src/aggregator.rs
//!
//! The fetch aggregator: runs a primary list fetch, then joins every item with
//! related records by foreign key and flattens the result into `EnrichedItem`s.

use crate::domain::{EnrichedItem, EntityKind, FieldValue, Item, ItemId, Record};
use crate::error::RecoverableError;
use crate::ports::{AdminApiService, PortError, PortResult};
use crate::stats::set_distance;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fields a rule adds to an item.
pub type Patch = Vec<(&'static str, FieldValue)>;

type ProjectFn = dyn Fn(&Item, Option<&Item>) -> Patch + Send + Sync;

//=========================================================================================
// Enrichment Rules
//=========================================================================================

/// Joins an item with one related record found through `foreign_key`.
#[derive(Clone)]
pub struct EnrichmentRule {
    pub name: &'static str,
    /// Field on the primary item holding the related id, e.g. `exerciseId`.
    pub foreign_key: &'static str,
    pub related: EntityKind,
    /// Receives `None` when the key is unset or the lookup failed.
    project: Arc<ProjectFn>,
}

impl std::fmt::Debug for EnrichmentRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentRule")
            .field("name", &self.name)
            .field("foreign_key", &self.foreign_key)
            .field("related", &self.related)
            .finish()
    }
}

impl EnrichmentRule {
    pub fn new(
        name: &'static str,
        foreign_key: &'static str,
        related: EntityKind,
        project: impl Fn(&Item, Option<&Item>) -> Patch + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            foreign_key,
            related,
            project: Arc::new(project),
        }
    }

    pub fn key_of(&self, item: &Item) -> Option<ItemId> {
        item.field(self.foreign_key).and_then(|v| v.as_number())
    }

    pub fn project(&self, item: &Item, related: Option<&Item>) -> Patch {
        (self.project)(item, related)
    }
}

/// Title of the related record, or a placeholder naming the id.
fn related_title(kind: EntityKind, key: Option<ItemId>, related: Option<&Item>) -> String {
    match (related, key) {
        (Some(found), _) => found.title().to_string(),
        (None, Some(id)) => format!("{} #{}", kind.label(), id),
        (None, None) => format!("No {}", kind.label().to_lowercase()),
    }
}

/// Swim-set rows: `exerciseTitle` plus `totalDistance`.
pub fn swim_set_exercise() -> EnrichmentRule {
    EnrichmentRule::new(
        "swim_set_exercise",
        "exerciseId",
        EntityKind::Exercise,
        |item, related| {
            let key = item.field("exerciseId").and_then(|v| v.as_number());
            let mut patch: Patch = vec![(
                "exerciseTitle",
                related_title(EntityKind::Exercise, key, related).into(),
            )];
            if let Some(set) = item.as_swim_set() {
                patch.push(("totalDistance", set_distance(set).into()));
            }
            patch
        },
    )
}

/// Exercises and pages: `uploadFilename` of the attached media.
pub fn upload_filename() -> EnrichmentRule {
    EnrichmentRule::new(
        "upload_filename",
        "uploadId",
        EntityKind::Upload,
        |item, related| {
            let key = item.field("uploadId").and_then(|v| v.as_number());
            vec![(
                "uploadFilename",
                related_title(EntityKind::Upload, key, related).into(),
            )]
        },
    )
}

/// Default rules applied to each admin list.
pub fn default_rules(kind: EntityKind) -> Vec<EnrichmentRule> {
    match kind {
        EntityKind::SwimSet => vec![swim_set_exercise()],
        EntityKind::Exercise | EntityKind::Page => vec![upload_filename()],
        _ => Vec::new(),
    }
}

//=========================================================================================
// Aggregator
//=========================================================================================

/// Enriched items in primary order, with the lookups that had to fall back.
#[derive(Debug, Clone, Default)]
pub struct Aggregated {
    pub items: Vec<EnrichedItem>,
    pub warnings: Vec<RecoverableError>,
}

/// A single lookup, identified by its slot in the output.
struct Lookup {
    item_index: usize,
    rule_index: usize,
    related: EntityKind,
    related_id: ItemId,
}

#[derive(Clone, Debug, Default)]
pub struct FetchAggregator {
    concurrency: Option<NonZeroUsize>,
    cancel: CancellationToken,
}

impl FetchAggregator {
    /// Unbounded fan-out, never cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of in-flight lookups.
    pub fn with_concurrency(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.concurrency = limit;
        self
    }

    /// Ties the aggregator to a token; cancelling it abandons in-flight work.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Lists `kind` and applies `rules`.
    pub async fn aggregate_list(
        &self,
        api: &dyn AdminApiService,
        kind: EntityKind,
        rules: &[EnrichmentRule],
    ) -> PortResult<Aggregated> {
        self.aggregate(api, api.list(kind), rules).await
    }

    /// Runs `primary`, then every lookup, and merges by input order.
    ///
    /// Only a failure of `primary` (or cancellation) is an error. Failed
    /// lookups become warnings and the item is projected with `None`.
    pub async fn aggregate<F>(
        &self,
        api: &dyn AdminApiService,
        primary: F,
        rules: &[EnrichmentRule],
    ) -> PortResult<Aggregated>
    where
        F: Future<Output = PortResult<Vec<Item>>> + Send,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                info!("Aggregation cancelled.");
                Err(PortError::Cancelled)
            }
            result = self.run(api, primary, rules) => result,
        }
    }

    async fn run<F>(
        &self,
        api: &dyn AdminApiService,
        primary: F,
        rules: &[EnrichmentRule],
    ) -> PortResult<Aggregated>
    where
        F: Future<Output = PortResult<Vec<Item>>> + Send,
    {
        let items = primary.await?;

        let lookups: Vec<Lookup> = items
            .iter()
            .enumerate()
            .flat_map(|(item_index, item)| {
                rules
                    .iter()
                    .enumerate()
                    .filter_map(move |(rule_index, rule)| {
                        rule.key_of(item).map(|related_id| Lookup {
                            item_index,
                            rule_index,
                            related: rule.related,
                            related_id,
                        })
                    })
            })
            .collect();

        debug!(
            "Enriching {} items with {} lookups across {} rules.",
            items.len(),
            lookups.len(),
            rules.len()
        );

        // `buffered` yields in submission order whatever order replies arrive in.
        let limit = self.concurrency.map_or(lookups.len().max(1), NonZeroUsize::get);
        let settled: Vec<(Lookup, PortResult<Item>)> = stream::iter(lookups)
            .map(|lookup| async move {
                let result = api.get(lookup.related, lookup.related_id).await;
                (lookup, result)
            })
            .buffered(limit)
            .collect()
            .await;

        // One slot per (item, rule); `None` means unset key or failed lookup.
        let mut related: Vec<Vec<Option<Item>>> = vec![vec![None; rules.len()]; items.len()];
        let mut warnings = Vec::new();
        for (lookup, result) in settled {
            match result {
                Ok(found) => related[lookup.item_index][lookup.rule_index] = Some(found),
                Err(source) => {
                    let item = &items[lookup.item_index];
                    warn!(
                        "Enrichment '{}' failed for {} {}: {}",
                        rules[lookup.rule_index].name,
                        item.kind(),
                        item.id(),
                        source
                    );
                    warnings.push(RecoverableError::Enrichment {
                        kind: item.kind(),
                        item_id: item.id(),
                        related: lookup.related,
                        related_id: lookup.related_id,
                        source,
                    });
                }
            }
        }

        let enriched = items
            .into_iter()
            .zip(related)
            .map(|(item, slots)| {
                let mut patch = Vec::new();
                for (rule, found) in rules.iter().zip(slots.iter()) {
                    patch.extend(rule.project(&item, found.as_ref()));
                }
                let mut enriched = EnrichedItem::new(item);
                enriched.extras.extend(patch);
                enriched
            })
            .collect();

        Ok(Aggregated {
            items: enriched,
            warnings,
        })
    }
}
