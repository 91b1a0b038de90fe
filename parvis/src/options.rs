// Copyright 2026 parvis Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::time::Duration;

use parvis_common::error::{Error, Result};

/// Per-operation entry options for `set` and `get_or_set`.
///
/// Unset fields fall back to the selected category's defaults, then to the global
/// defaults configured on the builder.
#[derive(Debug, Clone, Default)]
pub struct EntryOptions {
    pub(crate) ttl: Option<Duration>,
    pub(crate) sliding: Option<Duration>,
    pub(crate) stale_ttl: Option<Duration>,
    pub(crate) tags: Vec<String>,
    pub(crate) category: Option<String>,
}

impl EntryOptions {
    /// Options with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an absolute TTL. Mutually exclusive with a sliding window.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set a sliding window: the expiration resets on every fresh read.
    ///
    /// Mutually exclusive with an absolute TTL.
    pub fn with_sliding(mut self, window: Duration) -> Self {
        self.sliding = Some(window);
        self
    }

    /// Enable stale-while-revalidate for this entry with the given stale window.
    pub fn with_stale_ttl(mut self, window: Duration) -> Self {
        self.stale_ttl = Some(window);
        self
    }

    /// Attach a tag for bulk invalidation.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Attach tags for bulk invalidation.
    pub fn with_tags<T>(mut self, tags: impl IntoIterator<Item = T>) -> Self
    where
        T: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Select a registered category's defaults.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Reject empty and whitespace keys before any backend or factory call.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey("key must not be empty"));
    }
    if key.trim().is_empty() {
        return Err(Error::InvalidKey("key must not be whitespace"));
    }
    Ok(())
}

/// Reject empty and whitespace tags before any backend call.
pub(crate) fn validate_tag(tag: &str) -> Result<()> {
    if tag.is_empty() {
        return Err(Error::InvalidTag("tag must not be empty"));
    }
    if tag.trim().is_empty() {
        return Err(Error::InvalidTag("tag must not be whitespace"));
    }
    Ok(())
}
