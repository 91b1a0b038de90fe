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

use std::{sync::Arc, time::Duration};

use hashbrown::HashMap;
use parvis_common::{
    clock::Timestamp,
    error::{Error, Result},
    metadata::EntryMetadata,
};

use crate::options::{validate_key, validate_tag, EntryOptions};

/// Expiration defaults registered under a category name.
#[derive(Debug, Clone, Copy)]
struct CategoryPolicy {
    ttl: Option<Duration>,
    sliding: Option<Duration>,
    stale_ttl: Option<Duration>,
}

/// Merges per-operation options, category defaults and global defaults into entry
/// metadata. Precedence is strictly layered: the highest layer that sets `ttl` or
/// `sliding` determines both; the stale window is resolved independently with the
/// same precedence.
#[derive(Debug)]
pub(crate) struct TtlResolver {
    default_ttl: Duration,
    default_sliding: Option<Duration>,
    default_stale_ttl: Option<Duration>,
    categories: HashMap<String, CategoryPolicy>,
}

impl TtlResolver {
    pub(crate) fn new(
        default_ttl: Duration,
        default_sliding: Option<Duration>,
        default_stale_ttl: Option<Duration>,
        categories: impl IntoIterator<Item = (String, EntryOptions)>,
    ) -> Result<Self> {
        if default_ttl.is_zero() {
            return Err(Error::Config("default ttl must be positive".to_string()));
        }
        if default_sliding.is_some_and(|d| d.is_zero()) {
            return Err(Error::Config("default sliding window must be positive".to_string()));
        }
        if default_stale_ttl.is_some_and(|d| d.is_zero()) {
            return Err(Error::Config("default stale ttl must be positive".to_string()));
        }

        let mut registry = HashMap::new();
        for (name, options) in categories {
            if validate_key(&name).is_err() {
                return Err(Error::Config(format!("invalid category name: {name:?}")));
            }
            Self::validate_category(&name, &options)?;
            tracing::debug!("[resolver]: registered category {name}");
            registry.insert(
                name,
                CategoryPolicy {
                    ttl: options.ttl,
                    sliding: options.sliding,
                    stale_ttl: options.stale_ttl,
                },
            );
        }

        Ok(Self {
            default_ttl,
            default_sliding,
            default_stale_ttl,
            categories: registry,
        })
    }

    fn validate_category(name: &str, options: &EntryOptions) -> Result<()> {
        if options.ttl.is_some() && options.sliding.is_some() {
            return Err(Error::Config(format!(
                "category {name}: ttl and sliding are mutually exclusive"
            )));
        }
        for duration in [options.ttl, options.sliding, options.stale_ttl].into_iter().flatten() {
            if duration.is_zero() {
                return Err(Error::Config(format!("category {name}: durations must be positive")));
            }
        }
        if !options.tags.is_empty() {
            return Err(Error::Config(format!("category {name}: tags are not allowed")));
        }
        if options.category.is_some() {
            return Err(Error::Config(format!(
                "category {name}: nested category is not allowed"
            )));
        }
        Ok(())
    }

    /// Validate per-operation options and resolve them against the layered defaults.
    ///
    /// Fails fast on caller errors; no backend or factory is touched before this.
    pub(crate) fn prepare(&self, options: &EntryOptions) -> Result<ResolvedPolicy> {
        if options.ttl.is_some() && options.sliding.is_some() {
            return Err(Error::InvalidOptions("ttl and sliding are mutually exclusive"));
        }
        for duration in [options.ttl, options.sliding, options.stale_ttl].into_iter().flatten() {
            if duration.is_zero() {
                return Err(Error::InvalidOptions("durations must be positive"));
            }
        }

        let mut tags = Vec::with_capacity(options.tags.len());
        for tag in &options.tags {
            validate_tag(tag)?;
            tags.push(Arc::from(tag.as_str()));
        }

        let category = match &options.category {
            Some(name) => Some(
                self.categories
                    .get(name)
                    .ok_or_else(|| Error::UnknownCategory(name.clone()))?,
            ),
            None => None,
        };

        // The highest layer that sets ttl or sliding determines both; lower layers are
        // not blended in.
        let (ttl, sliding) = if options.ttl.is_some() || options.sliding.is_some() {
            (options.ttl, options.sliding)
        } else if let Some(category) = category.filter(|c| c.ttl.is_some() || c.sliding.is_some()) {
            (category.ttl, category.sliding)
        } else {
            (None, self.default_sliding)
        };
        let (ttl, sliding) = match (ttl, sliding) {
            (None, None) => (Some(self.default_ttl), None),
            resolved => resolved,
        };

        let stale_ttl = options
            .stale_ttl
            .or_else(|| category.and_then(|c| c.stale_ttl))
            .or(self.default_stale_ttl);

        Ok(ResolvedPolicy {
            ttl,
            sliding,
            stale_ttl,
            tags,
        })
    }
}

/// A validated expiration policy, ready to be stamped with a clock reading.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedPolicy {
    ttl: Option<Duration>,
    sliding: Option<Duration>,
    stale_ttl: Option<Duration>,
    pub(crate) tags: Vec<Arc<str>>,
}

impl ResolvedPolicy {
    /// Compute the entry metadata as of `now`.
    pub(crate) fn materialize(&self, now: Timestamp) -> EntryMetadata {
        let mut metadata = EntryMetadata::new(now);
        if let Some(window) = self.sliding {
            metadata = metadata.with_sliding_window(window);
        } else if let Some(ttl) = self.ttl {
            metadata = metadata.with_absolute_expiration(now.saturating_add(ttl));
        }
        if let Some(stale) = self.stale_ttl {
            metadata = metadata.with_stale_window(stale);
        }
        metadata
    }
}
