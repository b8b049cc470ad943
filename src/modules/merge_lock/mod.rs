//! Read/write contract of the external merge lock store.
//!
//! A merge lock groups source URIs from different metadata providers that
//! all represent the same real-world anime. The store itself lives outside
//! this crate; the download control state only needs to keep it consistent
//! when entries die or change their ID.

use crate::shared::errors::AppResult;
use async_trait::async_trait;
use std::collections::HashSet;
use url::Url;

#[async_trait]
pub trait MergeLockAccessor: Send + Sync {
    /// Whether the given URI is a member of any merge lock group.
    async fn is_part_of_merge_lock(&self, uri: &Url) -> AppResult<bool>;

    /// Remove the given URI from its merge lock group.
    async fn remove_entry(&self, uri: &Url) -> AppResult<()>;

    /// Replace a URI within its merge lock group, keeping the group itself.
    async fn replace_uri(&self, old_uri: &Url, new_uri: &Url) -> AppResult<()>;

    /// Union of all URIs across all merge lock groups.
    async fn all_sources_in_all_merge_lock_entries(&self) -> AppResult<HashSet<Url>>;
}
