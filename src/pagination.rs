//! Page type and windowing arithmetic.
//!
//! The repository's pagination operations compose the filter translator,
//! the mapper and the relation resolver; the pieces here are the shared
//! result type and the pure window/count helpers they build on.

use crate::engine::Row;
use crate::entity::ID_COLUMN;
use crate::value::{is_null, key_string};
use std::collections::BTreeSet;

/// One windowed, counted page of entities
///
/// `items` holds at most `page_size` entities (unbounded when
/// `page_size == 0`, meaning "no pagination"); `total_count` counts every
/// row matching the filters, not just the window.
#[derive(Debug, Clone)]
pub struct Page<E> {
    pub items: Vec<E>,
    pub total_count: u64,
    pub page_number: u64,
    pub page_size: u64,
}

impl<E> Page<E> {
    pub fn new(items: Vec<E>, total_count: u64, page_number: u64, page_size: u64) -> Self {
        Self {
            items,
            total_count,
            page_number,
            page_size,
        }
    }

    /// Number of the last page (at least 1).
    pub fn last_page(&self) -> u64 {
        if self.page_size == 0 {
            return 1;
        }
        self.total_count.div_ceil(self.page_size).max(1)
    }

    /// Whether pages beyond this one exist.
    pub fn has_more_pages(&self) -> bool {
        self.page_number < self.last_page()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// `(offset, limit)` for a 1-based page number.
///
/// `page == 0` is a caller error; it is clamped to the first page here
/// only to keep the arithmetic total.
pub fn window(page: u64, page_size: u64) -> (u64, u64) {
    (page.saturating_sub(1) * page_size, page_size)
}

/// Count distinct result rows by identity value.
///
/// Used as the count fallback for left-join queries, where the join
/// fan-out duplicates parent rows and a COUNT aggregate would over-count.
/// Rows without a usable identity value each count once.
pub fn distinct_row_count(rows: &[Row]) -> u64 {
    let mut identities = BTreeSet::new();
    let mut anonymous = 0u64;
    for row in rows {
        match row.get(ID_COLUMN) {
            Some(id) if !is_null(id) => {
                identities.insert(key_string(id));
            }
            _ => anonymous += 1,
        }
    }
    identities.len() as u64 + anonymous
}
