//! Cache keys and CDN header values.
//!
//! Every response that renders a post is tagged with that post's cache key
//! through the `Surrogate-Key` header, so the CDN can purge exactly the
//! responses that referenced a changed post. A post's key is derived from
//! its id and `updated_at`, so any write to the post yields a new key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::post::Post;

/// Response header the CDN reads surrogate keys from.
pub const SURROGATE_KEY_HEADER: &str = "Surrogate-Key";

/// Response header carrying the CDN-side cache lifetime.
pub const SURROGATE_CONTROL_HEADER: &str = "Surrogate-Control";

/// Response header carrying the browser-side cache policy.
pub const CACHE_CONTROL_HEADER: &str = "Cache-Control";

/// Namespace label of the posts table; prefixes list-view keys.
pub const POSTS_TABLE_KEY: &str = "posts";

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%6f";

impl Post {
    /// Cache key for this post: `posts/<id>-<updated_at>`.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "{POSTS_TABLE_KEY}/{}-{}",
            self.id,
            self.updated_at.format(TIMESTAMP_FORMAT)
        )
    }
}

/// The value of a `Surrogate-Key` header: space-separated keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurrogateKey {
    keys: Vec<String>,
}

impl SurrogateKey {
    /// Key for a single-post response: just the post's cache key.
    #[must_use]
    pub fn for_post(post: &Post) -> Self {
        Self {
            keys: vec![post.cache_key()],
        }
    }

    /// Key for a list response: the namespace label followed by each
    /// post's key in render order.
    #[must_use]
    pub fn for_posts(namespace: &str, posts: &[Post]) -> Self {
        let mut keys = Vec::with_capacity(posts.len() + 1);
        keys.push(namespace.to_string());
        keys.extend(posts.iter().map(Post::cache_key));
        Self { keys }
    }

    /// Key built from arbitrary pre-computed keys.
    #[must_use]
    pub fn from_keys(keys: Vec<String>) -> Self {
        Self { keys }
    }

    /// Header name and value, ready to set on a response.
    #[must_use]
    pub fn header(&self) -> (&'static str, String) {
        (SURROGATE_KEY_HEADER, self.to_string())
    }
}

impl fmt::Display for SurrogateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.keys.join(" "))
    }
}

/// CDN caching lifetimes, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CachePolicy {
    pub max_age: u64,
    pub stale_while_revalidate: u64,
    pub stale_if_error: u64,
    /// Label prepended to list-view surrogate keys.
    pub namespace: String,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            max_age: 86_400,
            stale_while_revalidate: 86_400,
            stale_if_error: 86_400,
            namespace: POSTS_TABLE_KEY.to_string(),
        }
    }
}

impl CachePolicy {
    /// Browsers always revalidate; the CDN holds the copy.
    #[must_use]
    pub fn cache_control(&self) -> (&'static str, String) {
        (CACHE_CONTROL_HEADER, "public, no-cache".to_string())
    }

    #[must_use]
    pub fn surrogate_control(&self) -> (&'static str, String) {
        (
            SURROGATE_CONTROL_HEADER,
            format!(
                "max-age={}, stale-while-revalidate={}, stale-if-error={}",
                self.max_age, self.stale_while_revalidate, self.stale_if_error
            ),
        )
    }

    /// All headers for a single-post response.
    #[must_use]
    pub fn post_headers(&self, post: &Post) -> Vec<(&'static str, String)> {
        vec![
            self.cache_control(),
            self.surrogate_control(),
            SurrogateKey::for_post(post).header(),
        ]
    }

    /// All headers for a list response.
    #[must_use]
    pub fn list_headers(&self, posts: &[Post]) -> Vec<(&'static str, String)> {
        vec![
            self.cache_control(),
            self.surrogate_control(),
            SurrogateKey::for_posts(&self.namespace, posts).header(),
        ]
    }
}
