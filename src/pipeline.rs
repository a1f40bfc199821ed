//! Filter → sort composition over a declarative [`TransformState`].
//!
//! The state never carries row data; the visible result is always
//! `transform(rows, state)`.
//! Grouping is a separate view over that result.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    data::Row,
    filter::{FilterCondition, apply_filters},
    group::{GroupResult, apply_group_by},
    sort::{SortConfig, apply_sort},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformState {
    pub sort: Option<SortConfig>,
    pub filters: Vec<FilterCondition>,
    pub group_by: Option<String>,
}

impl TransformState {
    pub fn is_identity(&self) -> bool {
        self.sort.is_none() && self.filters.is_empty()
    }

    pub fn with_sort(&self, sort: Option<SortConfig>) -> Self {
        Self {
            sort,
            ..self.clone()
        }
    }

    /// Applies the header-click cycle to `column`.
    pub fn with_column_sort_toggled(&self, column: &str) -> Self {
        self.with_sort(SortConfig::cycle(self.sort.as_ref(), column))
    }

    pub fn with_filter_added(&self, condition: FilterCondition) -> Self {
        let mut next = self.clone();
        next.filters.push(condition);
        next
    }

    /// Drops the filter at `index`; an index past the end leaves the
    /// filters as they are.
    pub fn with_filter_removed(&self, index: usize) -> Self {
        let mut next = self.clone();
        if index < next.filters.len() {
            next.filters.remove(index);
        }
        next
    }

    pub fn with_filter_replaced(&self, index: usize, condition: FilterCondition) -> Self {
        let mut next = self.clone();
        if let Some(slot) = next.filters.get_mut(index) {
            *slot = condition;
        }
        next
    }

    pub fn with_group_by(&self, group_by: Option<String>) -> Self {
        Self {
            group_by,
            ..self.clone()
        }
    }
}

impl fmt::Display for TransformState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sort {
            Some(sort) => write!(f, "sort={sort}")?,
            None => write!(f, "sort=none")?,
        }
        write!(f, " filters=[")?;
        for (idx, condition) in self.filters.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{condition}")?;
        }
        write!(f, "] group_by={}", self.group_by.as_deref().unwrap_or("none"))
    }
}

/// `sort(filter(rows, state.filters), state.sort)`.
pub fn transform<'a, I>(rows: I, state: &TransformState) -> Vec<&'a Row>
where
    I: IntoIterator<Item = &'a Row>,
{
    let filtered = apply_filters(rows, &state.filters);
    apply_sort(filtered, state.sort.as_ref())
}

/// Groups the transformed rows by `state.group_by`.
pub fn group_view<'a, I>(rows: I, state: &TransformState) -> Vec<GroupResult<'a>>
where
    I: IntoIterator<Item = &'a Row>,
{
    apply_group_by(transform(rows, state), state.group_by.as_deref())
}
