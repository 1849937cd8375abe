//! crates/swim_admin_core/src/query.rs
//!
//! The filter/sort/paginate engine behind every list page and the public
//! search page. It is a pure function of its inputs and keeps no state.

use crate::domain::{FieldValue, Record};
use std::cmp::{Ordering, Reverse};
use std::num::NonZeroUsize;

pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(size) => size,
    None => unreachable!(),
};

//=========================================================================================
// Filter State
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// `"all"` and blank input mean no filter.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(trimmed.to_string())
        }
    }
}

/// What a list page is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub search_term: String,
    pub category_filter: CategoryFilter,
    pub sort_key: String,
    pub sort_direction: SortDirection,
    pub current_page: usize,
    pub page_size: NonZeroUsize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            category_filter: CategoryFilter::All,
            sort_key: "title".to_string(),
            sort_direction: SortDirection::Asc,
            current_page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterState {
    pub fn with_page_size(page_size: NonZeroUsize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    /// Changing the query jumps back to the first page.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.current_page = 0;
    }

    pub fn set_category_filter(&mut self, filter: CategoryFilter) {
        self.category_filter = filter;
        self.current_page = 0;
    }

    /// Clicking the active column flips direction; a new column starts ascending.
    pub fn sort_by(&mut self, key: impl Into<String>) {
        let key = key.into();
        if key == self.sort_key {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_key = key;
            self.sort_direction = SortDirection::Asc;
        }
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.current_page = page;
    }

    /// Pulls the current page back inside `0..page_count`.
    pub fn clamp_page(&mut self, page_count: usize) {
        if self.current_page >= page_count {
            self.current_page = page_count.saturating_sub(1);
        }
    }
}

//=========================================================================================
// Engine
//=========================================================================================

/// One page of results plus the numbers a pager needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total: usize,
}

pub fn page_for_offset(offset: usize, page_size: NonZeroUsize) -> usize {
    offset / page_size.get()
}

pub fn page_count(len: usize, page_size: NonZeroUsize) -> usize {
    len.div_ceil(page_size.get())
}

/// Search and category predicate.
pub fn matches<R: Record>(record: &R, state: &FilterState) -> bool {
    matches_search(record, &state.search_term) && matches_category(record, &state.category_filter)
}

fn matches_search<R: Record>(record: &R, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    record.title().to_lowercase().contains(&needle)
        || record
            .body_text()
            .is_some_and(|body| body.to_lowercase().contains(&needle))
}

fn matches_category<R: Record>(record: &R, filter: &CategoryFilter) -> bool {
    match filter {
        CategoryFilter::All => true,
        CategoryFilter::Only(category) => record.category() == Some(category.as_str()),
    }
}

/// Orders two field values. Missing values sort first; across types numbers
/// come before text and text before timestamps.
fn compare_fields(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    fn rank(value: &FieldValue) -> u8 {
        match value {
            FieldValue::Number(_) => 0,
            FieldValue::Text(_) => 1,
            FieldValue::Timestamp(_) => 2,
        }
    }
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(FieldValue::Number(x)), Some(FieldValue::Number(y))) => x.cmp(y),
        (Some(FieldValue::Text(x)), Some(FieldValue::Text(y))) => x.cmp(y),
        (Some(FieldValue::Timestamp(x)), Some(FieldValue::Timestamp(y))) => x.cmp(y),
        (Some(x), Some(y)) => rank(x).cmp(&rank(y)),
    }
}

/// Total order over an optional field value, for the sort below.
struct SortKey(Option<FieldValue>);

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_fields(self.0.as_ref(), other.0.as_ref())
    }
}

/// Stable sort by `key`; equal keys keep their input order in both directions.
pub fn sort_records<R: Record>(records: &mut [R], key: &str, direction: SortDirection) {
    match direction {
        SortDirection::Asc => records.sort_by_cached_key(|record| SortKey(record.field(key))),
        SortDirection::Desc => {
            records.sort_by_cached_key(|record| Reverse(SortKey(record.field(key))))
        }
    }
}

/// Filters, sorts and slices out `state.current_page`.
pub fn filter_sort_page<R: Record + Clone>(records: &[R], state: &FilterState) -> Page<R> {
    let mut filtered: Vec<R> = records
        .iter()
        .filter(|record| matches(*record, state))
        .cloned()
        .collect();
    sort_records(&mut filtered, &state.sort_key, state.sort_direction);

    let total = filtered.len();
    let size = state.page_size.get();
    let start = state.current_page.saturating_mul(size);
    let items = if start >= total {
        Vec::new()
    } else {
        filtered.drain(start..total.min(start + size)).collect()
    };

    Page {
        items,
        page: state.current_page,
        page_size: size,
        page_count: page_count(total, state.page_size),
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Item, ItemId, Workout};
    use chrono::{TimeZone, Utc};

    fn workout(id: ItemId, title: &str, category: Option<&str>, description: Option<&str>) -> Item {
        Item::Workout(Workout {
            id,
            title: title.to_string(),
            description: description.map(str::to_string),
            category: category.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2024, 3, id as u32, 0, 0, 0).unwrap(),
        })
    }

    fn ids<R: Record>(records: &[R]) -> Vec<ItemId> {
        records.iter().map(Record::id).collect()
    }

    fn state() -> FilterState {
        FilterState::default()
    }

    #[test]
    fn search_is_case_insensitive_over_title() {
        let items = vec![
            workout(1, "Warmup", Some("A"), None),
            workout(2, "Sprint", Some("B"), None),
        ];
        let mut filter = state();
        filter.set_search_term("sp");
        let page = filter_sort_page(&items, &filter);
        assert_eq!(ids(&page.items), vec![2]);
    }

    #[test]
    fn search_also_looks_at_description() {
        let items = vec![
            workout(1, "Monday", None, Some("Long AEROBIC swim")),
            workout(2, "Tuesday", None, Some("drills")),
        ];
        let mut filter = state();
        filter.set_search_term("aerobic");
        assert_eq!(ids(&filter_sort_page(&items, &filter).items), vec![1]);
    }

    #[test]
    fn category_filter_requires_exact_match() {
        let items = vec![
            workout(1, "a", Some("Endurance"), None),
            workout(2, "b", Some("endurance"), None),
            workout(3, "c", None, None),
        ];
        let mut filter = state();
        filter.set_category_filter(CategoryFilter::Only("Endurance".to_string()));
        assert_eq!(ids(&filter_sort_page(&items, &filter).items), vec![1]);
        filter.set_category_filter(CategoryFilter::parse("all"));
        assert_eq!(filter_sort_page(&items, &filter).total, 3);
    }

    #[test]
    fn text_sort_is_case_sensitive() {
        let items = vec![
            workout(1, "banana", None, None),
            workout(2, "Apple", None, None),
            workout(3, "apple", None, None),
        ];
        let page = filter_sort_page(&items, &state());
        assert_eq!(ids(&page.items), vec![2, 3, 1]);
    }

    #[test]
    fn sort_is_stable_in_both_directions() {
        let items = vec![
            workout(1, "same", Some("x"), None),
            workout(2, "other", Some("y"), None),
            workout(3, "same", Some("z"), None),
        ];
        let mut filter = state();
        assert_eq!(ids(&filter_sort_page(&items, &filter).items), vec![2, 1, 3]);
        filter.sort_by("title");
        assert_eq!(filter.sort_direction, SortDirection::Desc);
        assert_eq!(ids(&filter_sort_page(&items, &filter).items), vec![1, 3, 2]);
        // Sorting an already sorted list is a no-op.
        let first = filter_sort_page(&items, &filter);
        let second = filter_sort_page(&first.items, &filter);
        assert_eq!(ids(&first.items), ids(&second.items));
    }

    #[test]
    fn numeric_and_timestamp_keys_compare_by_value() {
        let items: Vec<Item> = (1..=12)
            .rev()
            .map(|id| workout(id, "w", None, None))
            .collect();
        let mut filter = FilterState::with_page_size(NonZeroUsize::new(20).unwrap());
        filter.sort_by("id");
        assert_eq!(ids(&filter_sort_page(&items, &filter).items), (1..=12).collect::<Vec<_>>());
        filter.sort_by("createdAt");
        filter.sort_by("createdAt");
        assert_eq!(
            ids(&filter_sort_page(&items, &filter).items),
            (1..=12).rev().collect::<Vec<_>>()
        );
    }

    #[test]
    fn missing_sort_values_come_first() {
        let items = vec![
            workout(1, "a", Some("b"), None),
            workout(2, "b", None, None),
            workout(3, "c", Some("a"), None),
        ];
        let mut filter = state();
        filter.sort_by("category");
        assert_eq!(ids(&filter_sort_page(&items, &filter).items), vec![2, 3, 1]);
    }

    #[test]
    fn pages_concatenate_to_the_full_result() {
        let items: Vec<Item> = (1..=23)
            .map(|id| workout(id, &format!("w{id:02}"), None, None))
            .collect();
        let mut filter = FilterState::with_page_size(NonZeroUsize::new(5).unwrap());
        let first = filter_sort_page(&items, &filter);
        assert_eq!(first.page_count, 5);
        assert_eq!(first.total, 23);

        let mut all = Vec::new();
        for page in 0..first.page_count {
            filter.go_to_page(page);
            all.extend(ids(&filter_sort_page(&items, &filter).items));
        }
        assert_eq!(all, (1..=23).collect::<Vec<_>>());
    }

    #[test]
    fn out_of_range_page_is_empty_not_an_error() {
        let items = vec![workout(1, "a", None, None)];
        let mut filter = state();
        filter.go_to_page(4);
        let page = filter_sort_page(&items, &filter);
        assert!(page.items.is_empty());
        assert_eq!(page.page, 4);
        assert_eq!(page.page_count, 1);

        filter.clamp_page(page.page_count);
        assert_eq!(filter.current_page, 0);
    }

    #[test]
    fn changing_the_query_resets_the_page() {
        let mut filter = state();
        filter.go_to_page(3);
        filter.set_search_term("x");
        assert_eq!(filter.current_page, 0);
        filter.go_to_page(2);
        filter.set_category_filter(CategoryFilter::All);
        assert_eq!(filter.current_page, 0);
    }

    #[test]
    fn offset_maps_to_page() {
        let size = NonZeroUsize::new(10).unwrap();
        assert_eq!(page_for_offset(0, size), 0);
        assert_eq!(page_for_offset(19, size), 1);
        assert_eq!(page_for_offset(20, size), 2);
        assert_eq!(page_count(0, size), 0);
        assert_eq!(page_count(21, size), 3);
    }
}
