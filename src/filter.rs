// 🔎 Record Filter/Sort Engine
// Case-insensitive search + single-key bidirectional sort over fetched records.
//
// Input slices are never reordered in place: every operation hands back a
// fresh Vec so callers can keep using the collection they fetched.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

// ============================================================================
// RECORD TRAIT
// ============================================================================

/// What the engine needs to know about a record
pub trait Record {
    /// Short display name (bank "name", rate "nome")
    fn display_name(&self) -> &str;

    /// Long name; defaults to the display name
    fn full_name(&self) -> &str {
        self.display_name()
    }

    /// Numeric code, when the record has one
    fn numeric_code(&self) -> Option<i64> {
        None
    }
}

// ============================================================================
// CRITERIA
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    FullName,
    Code,
}

impl SortField {
    /// Parse a field name; unknown names give None (= keep input order)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "name" => Some(SortField::Name),
            "fullName" | "full_name" | "fullname" => Some(SortField::FullName),
            "code" => Some(SortField::Code),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::FullName => "fullName",
            SortField::Code => "code",
        }
    }

    /// Next field in name -> fullName -> code order
    pub fn next(&self) -> Self {
        match self {
            SortField::Name => SortField::FullName,
            SortField::FullName => SortField::Code,
            SortField::Code => SortField::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Some(SortOrder::Ascending),
            "desc" | "descending" => Some(SortOrder::Descending),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

/// Search + sort settings, rebuilt from UI state before each call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search_term: String,
    /// None when the requested field is unknown
    pub sort_field: Option<SortField>,
    pub sort_order: SortOrder,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        FilterCriteria {
            search_term: String::new(),
            sort_field: Some(SortField::Name),
            sort_order: SortOrder::Ascending,
        }
    }
}

impl FilterCriteria {
    pub fn new(search_term: &str, sort_field: Option<SortField>, sort_order: SortOrder) -> Self {
        FilterCriteria {
            search_term: search_term.to_string(),
            sort_field,
            sort_order,
        }
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

fn matches_term<T: Record>(record: &T, term_lower: &str) -> bool {
    record.display_name().to_lowercase().contains(term_lower)
        || record.full_name().to_lowercase().contains(term_lower)
        || record
            .numeric_code()
            .map_or(false, |code| code.to_string().contains(term_lower))
}

fn compare<T: Record>(a: &T, b: &T, field: SortField) -> Ordering {
    match field {
        SortField::Name => a
            .display_name()
            .to_lowercase()
            .cmp(&b.display_name().to_lowercase()),
        SortField::FullName => a
            .full_name()
            .to_lowercase()
            .cmp(&b.full_name().to_lowercase()),
        // Missing codes compare as 0
        SortField::Code => a
            .numeric_code()
            .unwrap_or(0)
            .cmp(&b.numeric_code().unwrap_or(0)),
    }
}

/// Search then sort. No criteria at all returns the records as they came.
pub fn filter_records<T: Record + Clone>(
    records: &[T],
    criteria: Option<&FilterCriteria>,
) -> Vec<T> {
    let criteria = match criteria {
        Some(criteria) => criteria,
        None => return records.to_vec(),
    };

    let term = criteria.search_term.to_lowercase();
    let matched: Vec<T> = if term.is_empty() {
        records.to_vec()
    } else {
        records
            .iter()
            .filter(|record| matches_term(*record, &term))
            .cloned()
            .collect()
    };

    sort_records(&matched, criteria.sort_field, criteria.sort_order)
}

/// Stable sort into a new Vec. `field = None` keeps the input order.
pub fn sort_records<T: Record + Clone>(
    records: &[T],
    field: Option<SortField>,
    order: SortOrder,
) -> Vec<T> {
    let mut sorted = records.to_vec();
    if let Some(field) = field {
        sorted.sort_by(|a, b| order.apply(compare(a, b, field)));
    }
    sorted
}

/// Records whose code is in the allowlist, by display name ascending
pub fn main_subset_by_code<T: Record + Clone>(records: &[T], allowlist: &[i64]) -> Vec<T> {
    let subset: Vec<T> = records
        .iter()
        .filter(|record| {
            record
                .numeric_code()
                .map_or(false, |code| allowlist.contains(&code))
        })
        .cloned()
        .collect();

    sort_records(&subset, Some(SortField::Name), SortOrder::Ascending)
}

/// First record whose display name contains `partial` (case-insensitive).
/// Absent or empty collections give None.
pub fn find_by_key<'a, T: Record>(records: Option<&'a [T]>, partial: &str) -> Option<&'a T> {
    let partial = partial.to_lowercase();
    records?
        .iter()
        .find(|record| record.display_name().to_lowercase().contains(&partial))
}

/// One page (0-based) of an already filtered listing
pub fn paginate<T>(records: &[T], page: usize, page_size: usize) -> &[T] {
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let start = page.saturating_mul(page_size).min(records.len());
    let end = start.saturating_add(page_size).min(records.len());
    &records[start..end]
}

/// Number of pages needed for `total` records
pub fn page_count(total: usize, page_size: usize) -> usize {
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    (total + page_size - 1) / page_size
}
