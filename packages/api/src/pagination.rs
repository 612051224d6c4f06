// ABOUTME: Paged response shapes and link-following accumulation
// ABOUTME: Offset pages and cursor pages both expose items plus an absolute next link

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::client::SpotifyClient;

/// A response that holds one page of `T` and maybe a link to the next
pub trait Paged<T>: DeserializeOwned + Send {
    fn into_parts(self) -> (Vec<T>, Option<String>);
}

/// Offset-based page (`items`, `next`, `offset`, `total`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    #[serde(default)]
    pub offset: Option<u32>,
    #[serde(default)]
    pub total: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cursors {
    pub after: Option<String>,
    pub before: Option<String>,
}

/// Cursor-based page used by recently played and followed artists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    #[serde(default)]
    pub cursors: Option<Cursors>,
    #[serde(default)]
    pub total: Option<u32>,
}

/// `GET /me/following` wraps its cursor page in an `artists` key
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FollowedArtists<T> {
    pub artists: CursorPage<T>,
}

impl<T: DeserializeOwned + Send> Paged<T> for Page<T> {
    fn into_parts(self) -> (Vec<T>, Option<String>) {
        (self.items, self.next)
    }
}

impl<T: DeserializeOwned + Send> Paged<T> for CursorPage<T> {
    fn into_parts(self) -> (Vec<T>, Option<String>) {
        (self.items, self.next)
    }
}

impl<T: DeserializeOwned + Send> Paged<T> for FollowedArtists<T> {
    fn into_parts(self) -> (Vec<T>, Option<String>) {
        self.artists.into_parts()
    }
}

impl SpotifyClient {
    /// Follow `next` links from an already fetched first page, concatenating items in order
    ///
    /// A failure on a later page stops pagination and returns what was
    /// gathered so far. Links off the API origin or back to a visited page
    /// end pagination the same way; the bearer token is never sent elsewhere.
    pub async fn collect_pages<P, T>(&self, first: P) -> Vec<T>
    where
        P: Paged<T>,
    {
        let (mut items, mut next) = first.into_parts();
        let mut visited = HashSet::new();
        let mut pages = 1;

        while let Some(url) = next.take() {
            if !self.is_api_origin(&url) {
                warn!(
                    "Stopped pagination after {} page(s): next link {} is not on the API origin",
                    pages, url
                );
                return items;
            }
            if !visited.insert(url.clone()) {
                warn!(
                    "Stopped pagination after {} page(s): next link {} was already fetched",
                    pages, url
                );
                return items;
            }

            match self.get::<P>(&url, &[]).await {
                Ok(page) => {
                    let (page_items, page_next) = page.into_parts();
                    items.extend(page_items);
                    next = page_next;
                    pages += 1;
                }
                Err(e) => {
                    warn!(
                        "Stopped pagination after {} page(s), returning {} item(s): {}",
                        pages,
                        items.len(),
                        e
                    );
                    return items;
                }
            }
        }

        debug!("Collected {} item(s) from {} page(s)", items.len(), pages);
        items
    }
}
