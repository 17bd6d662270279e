//! Cut-off bookkeeping for permission-filtered bulk results
//!
//! Bulk listings ("children this user can read") should not pay for a
//! permission check on every candidate when only the first few are
//! wanted. The caller wraps its candidates in a
//! [`PermissionCheckCollection`] carrying a target count and cut-off
//! limits, [`filter_with_cut_off`] runs the bounded scan, and the
//! [`PermissionCheckedCollection`] result records whether the scan
//! stopped early and how many candidates were never examined. The
//! two must never be conflated: fewer results because nothing else
//! existed is not the same as fewer results because checking stopped.
//!
//! Cut-off is a latency bound, not a correctness one: a cut-off scan
//! returns a shorter, flagged result, never a false allow.

use std::time::Instant;

use palisade_core::PalisadeResult;
use tracing::debug;

use crate::config::EngineConfig;

/// Candidates for a permission-filtered scan plus the scan's limits
///
/// Zero or negative time/count limits mean "use the system default
/// from [`EngineConfig`]", not "unlimited".
#[derive(Debug, Clone)]
pub struct PermissionCheckCollection<T> {
    items: Vec<T>,
    target_result_count: usize,
    cut_off_after_time_ms: i64,
    cut_off_after_count: i64,
}

impl<T> PermissionCheckCollection<T> {
    /// Wrap candidates with explicit limits
    pub fn new(
        items: Vec<T>,
        target_result_count: usize,
        cut_off_after_time_ms: i64,
        cut_off_after_count: i64,
    ) -> Self {
        Self {
            items,
            target_result_count,
            cut_off_after_time_ms,
            cut_off_after_count,
        }
    }

    /// Wrap candidates wanting every permitted item, system limits
    pub fn unbounded(items: Vec<T>) -> Self {
        let target = items.len();
        Self::new(items, target, 0, 0)
    }

    /// How many permitted items the caller actually wants
    pub fn target_result_count(&self) -> usize {
        self.target_result_count
    }

    /// Wall-clock limit in milliseconds, `<= 0` for the default
    pub fn cut_off_after_time_ms(&self) -> i64 {
        self.cut_off_after_time_ms
    }

    /// Permission-check count limit, `<= 0` for the default
    pub fn cut_off_after_count(&self) -> i64 {
        self.cut_off_after_count
    }

    /// The wrapped candidates
    pub fn items(&self) -> &[T] {
        &self.items
    }
}

/// A permission-filtered result set with cut-off bookkeeping
#[derive(Debug, Clone)]
pub struct PermissionCheckedCollection<T> {
    items: Vec<T>,
    is_cut_off: bool,
    size_unchecked: usize,
    size_original: usize,
}

impl<T> PermissionCheckedCollection<T> {
    /// Whether the scan stopped before examining every candidate
    pub fn is_cut_off(&self) -> bool {
        self.is_cut_off
    }

    /// How many candidates were never permission-checked
    pub fn size_unchecked(&self) -> usize {
        self.size_unchecked
    }

    /// How many candidates the scan started from
    pub fn size_original(&self) -> usize {
        self.size_original
    }

    /// The permitted items, in candidate order
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of permitted items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no candidate was permitted
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Unwrap the permitted items
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T> IntoIterator for PermissionCheckedCollection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Run the bounded permission scan
///
/// Scans candidates in order, keeping those the predicate permits,
/// and stops as soon as the target count is reached, the check-count
/// limit is hit, or the time limit elapses - whichever comes first.
/// Every candidate left unexamined counts toward `size_unchecked`
/// and marks the result cut off.
pub fn filter_with_cut_off<T>(
    collection: PermissionCheckCollection<T>,
    config: &EngineConfig,
    mut permitted: impl FnMut(&T) -> PalisadeResult<bool>,
) -> PalisadeResult<PermissionCheckedCollection<T>> {
    let max_checks = if collection.cut_off_after_count > 0 {
        collection.cut_off_after_count as usize
    } else {
        config.max_permission_checks
    };
    let max_time_ms = if collection.cut_off_after_time_ms > 0 {
        collection.cut_off_after_time_ms as u64
    } else {
        config.max_permission_check_time_ms
    };
    let target = collection.target_result_count;

    let size_original = collection.items.len();
    let started = Instant::now();
    let mut checks = 0usize;
    let mut kept = Vec::new();

    for item in collection.items {
        if kept.len() >= target {
            debug!(target, "bulk scan reached its target count");
            break;
        }
        if checks >= max_checks {
            debug!(checks, max_checks, "bulk scan cut off by check count");
            break;
        }
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if elapsed_ms > max_time_ms {
            debug!(elapsed_ms, max_time_ms, "bulk scan cut off by time");
            break;
        }

        let allowed = permitted(&item)?;
        checks += 1;
        if allowed {
            kept.push(item);
        }
    }

    let size_unchecked = size_original - checks;
    Ok(PermissionCheckedCollection {
        items: kept,
        is_cut_off: size_unchecked > 0,
        size_unchecked,
        size_original,
    })
}
