//! Association reconciliation for content rows.
//!
//! Two shapes are supported:
//! - [`FieldLinkBatch`]: add-only. Stages the requested field ids exactly as given and
//!   inserts only those not yet linked. Nothing is ever unlinked.
//! - [`HyperlinkDelta`]: full reconciliation. Computes what to add and what to remove so
//!   the persisted set equals the desired one, leaving common members untouched.
//!
//! Both are pure; the repository executes them.

use std::collections::BTreeSet;

/// One add-only write of field links for a content row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLinkBatch {
    content_id: i64,
    staged: Vec<i64>,
}

impl FieldLinkBatch {
    /// Stage `desired` verbatim: order and duplicates are kept.
    pub fn new(content_id: i64, desired: &[i64]) -> Self {
        Self {
            content_id,
            staged: desired.to_vec(),
        }
    }

    pub fn content_id(&self) -> i64 {
        self.content_id
    }

    pub fn staged(&self) -> &[i64] {
        &self.staged
    }

    /// Statement text. `?1` is the content id, `?2` the staged ids as one JSON array.
    ///
    /// An empty batch stages a single `NULL` row instead, filtered out before the insert,
    /// so the write still runs with the content id as its only parameter.
    pub fn sql(&self) -> String {
        let source = if self.staged.is_empty() {
            "VALUES (NULL)"
        } else {
            "SELECT value FROM json_each(?2)"
        };
        format!(
            "WITH staged(id_field) AS ({source}) \
             INSERT INTO content_fields (id_content, id_field) \
             SELECT DISTINCT ?1, s.id_field FROM staged s \
             WHERE s.id_field IS NOT NULL \
             AND NOT EXISTS (\
             SELECT 1 FROM content_fields cf \
             WHERE cf.id_content = ?1 AND cf.id_field = s.id_field)"
        )
    }

    /// Staged ids in order as a JSON array, bound as `?2`. `None` for an empty batch.
    pub fn staged_array(&self) -> Result<Option<String>, serde_json::Error> {
        if self.staged.is_empty() {
            return Ok(None);
        }
        serde_json::to_string(&self.staged).map(Some)
    }
}

/// Minimal change turning a persisted hyperlink set into the desired one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HyperlinkDelta {
    pub to_add: BTreeSet<String>,
    pub to_remove: BTreeSet<String>,
}

impl HyperlinkDelta {
    pub fn compute(desired: &BTreeSet<String>, persisted: &BTreeSet<String>) -> Self {
        Self {
            to_add: desired.difference(persisted).cloned().collect(),
            to_remove: persisted.difference(desired).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Persisted set after applying the delta.
    #[cfg(test)]
    pub fn apply(&self, persisted: &BTreeSet<String>) -> BTreeSet<String> {
        persisted
            .difference(&self.to_remove)
            .chain(self.to_add.iter())
            .cloned()
            .collect()
    }
}
