//! Listing protocol: page sources and link-relation parsing.

use crate::item::RemoteItem;
use async_trait::async_trait;
use std::time::SystemTime;

/// Quota and continuation indicators lifted from a listing response's
/// headers.
#[derive(Debug, Clone, Default)]
pub struct PageIndicators {
    /// Remaining quota reported by the remote, if present.
    pub remaining: Option<i64>,
    /// When the quota refills, if reported.
    pub reset_at: Option<SystemTime>,
    /// Multi-valued link-style header carrying page relations.
    pub link: Option<String>,
}

/// One page of a remote listing.
#[derive(Debug, Clone)]
pub struct PageResponse {
    /// Items on this page, in listing order.
    pub items: Vec<RemoteItem>,
    /// Header indicators accompanying the page.
    pub indicators: PageIndicators,
}

/// A remote listing endpoint the engine can page through.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches one page of up to `per_page` items. Pages are 1-based.
    async fn fetch(&self, page: usize, per_page: usize) -> Result<PageResponse, PageSourceError>;
}

/// Failure reported by a [`PageSource`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct PageSourceError {
    /// Description of the failure.
    pub message: String,
}

impl PageSourceError {
    /// Creates an error from any displayable source.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parses a multi-valued link-style header into `(target, relation)`
/// pairs.
///
/// Entries look like `<https://host/path?page=3>; rel="next"` and are
/// comma-separated. Malformed entries are skipped.
pub fn parse_link_relations(link: &str) -> Vec<(String, String)> {
    link.split(',')
        .filter_map(|entry| {
            let (target, params) = entry.split_once(';')?;
            let target = target.trim().trim_start_matches('<').trim_end_matches('>');
            let rel = params.split(';').find_map(|param| {
                let (key, value) = param.split_once('=')?;
                if key.trim() != "rel" {
                    return None;
                }
                Some(value.trim().trim_matches('"').to_string())
            })?;
            Some((target.to_string(), rel))
        })
        .collect()
}

/// Whether a link header announces further pages: true when a `next` or
/// `last` relation is present.
pub(crate) fn has_more_pages(link: &str) -> bool {
    parse_link_relations(link)
        .iter()
        .any(|(_, rel)| rel == "next" || rel == "last")
}
