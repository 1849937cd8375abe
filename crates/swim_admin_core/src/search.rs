//! crates/swim_admin_core/src/search.rs
//!
//! The public search page: one query across exercises, workouts, plans and
//! pages, ranked and paged by the list engine.

use crate::domain::{EntityKind, FieldValue, Item, ItemId, Record};
use crate::ports::{AdminApiService, PortResult};
use crate::query::{filter_sort_page, FilterState, Page};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use tracing::info;

/// Entity kinds the public page searches, in display order.
pub const SEARCHABLE: [EntityKind; 4] = [
    EntityKind::Exercise,
    EntityKind::Workout,
    EntityKind::Plan,
    EntityKind::Page,
];

const SNIPPET_CHARS: usize = 160;

/// A single search result, flattened from any searchable entity.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub kind: EntityKind,
    pub id: ItemId,
    pub title: String,
    pub snippet: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    body: Option<String>,
}

impl SearchHit {
    pub fn from_item(item: &Item) -> Self {
        let body = item.body_text().map(str::to_string);
        Self {
            kind: item.kind(),
            id: item.id(),
            title: item.title().to_string(),
            snippet: body.as_deref().map(snippet),
            category: item.category().map(str::to_string),
            created_at: item.created_at(),
            body,
        }
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

impl Record for SearchHit {
    fn id(&self) -> ItemId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn body_text(&self) -> Option<&str> {
        self.body.as_deref()
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    fn field(&self, key: &str) -> Option<FieldValue> {
        match key {
            "id" => Some(self.id.into()),
            "title" => Some(self.title.as_str().into()),
            "category" => self.category.as_deref().map(FieldValue::from),
            "createdAt" => Some(self.created_at.into()),
            "kind" => Some(self.kind.segment().into()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub filter: FilterState,
    /// Restricts the search to one kind; `None` searches all of `SEARCHABLE`.
    pub kind: Option<EntityKind>,
}

/// Fetches every searchable collection concurrently and pages the matches.
///
/// Any failed list fetch fails the whole search; partial results are never
/// presented as complete.
pub async fn search(api: &dyn AdminApiService, query: &SearchQuery) -> PortResult<Page<SearchHit>> {
    let kinds: Vec<EntityKind> = SEARCHABLE
        .into_iter()
        .filter(|kind| query.kind.map_or(true, |only| only == *kind))
        .collect();

    let lists = try_join_all(kinds.iter().map(|kind| api.list(*kind))).await?;
    let hits: Vec<SearchHit> = lists.iter().flatten().map(SearchHit::from_item).collect();

    let page = filter_sort_page(&hits, &query.filter);
    info!(
        "Search '{}' matched {} of {} items.",
        query.filter.search_term,
        page.total,
        hits.len()
    );
    Ok(page)
}
