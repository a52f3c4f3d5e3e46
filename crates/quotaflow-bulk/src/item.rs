//! Work item descriptors.

use serde::{Deserialize, Serialize};

/// Descriptor of one remote item in a bulk job, as returned by a listing
/// endpoint (typically a repository).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    /// Unique name within the listing.
    pub name: String,
    /// Archived items are skipped by the default policy.
    #[serde(default)]
    pub archived: bool,
    /// Reported size in bytes; oversized items are skipped under
    /// memory pressure.
    #[serde(default)]
    pub size_bytes: u64,
}

impl RemoteItem {
    /// Convenience constructor for an ordinary item.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            archived: false,
            size_bytes: 0,
        }
    }
}
