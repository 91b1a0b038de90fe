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

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use parking_lot::Mutex;

/// Process-local bidirectional tag index.
///
/// Both directions live under one lock so a key's tag set is replaced atomically from
/// any observer's perspective. Invariant: `(tag, key)` is in the forward map iff `tag`
/// is in the key's tag list, and empty tag buckets are removed.
#[derive(Debug, Default)]
pub(crate) struct TagIndex {
    maps: Mutex<Maps>,
}

#[derive(Debug, Default)]
struct Maps {
    tag_to_keys: HashMap<Arc<str>, HashSet<Arc<str>>>,
    key_to_tags: HashMap<Arc<str>, Vec<Arc<str>>>,
}

impl Maps {
    fn detach(&mut self, key: &str) {
        let Some(tags) = self.key_to_tags.remove(key) else {
            return;
        };
        for tag in tags {
            if let Some(keys) = self.tag_to_keys.get_mut(&tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_to_keys.remove(&tag);
                }
            }
        }
    }
}

impl TagIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Replace the tag set of `key` with `tags`. An empty set detaches the key.
    pub(crate) fn associate(&self, key: &Arc<str>, tags: &[Arc<str>]) {
        let mut maps = self.maps.lock();
        maps.detach(key);
        if tags.is_empty() {
            return;
        }
        let mut stored = Vec::with_capacity(tags.len());
        for tag in tags {
            // Duplicate tags in the input collapse to one association.
            if maps.tag_to_keys.entry(tag.clone()).or_default().insert(key.clone()) {
                stored.push(tag.clone());
            }
        }
        maps.key_to_tags.insert(key.clone(), stored);
    }

    /// Remove all associations of `key`.
    pub(crate) fn detach(&self, key: &str) {
        self.maps.lock().detach(key);
    }

    /// A point-in-time copy of the keys under `tag`; callers iterate without the lock.
    pub(crate) fn keys_for(&self, tag: &str) -> Vec<Arc<str>> {
        self.maps
            .lock()
            .tag_to_keys
            .get(tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        let maps = self.maps.lock();
        for (tag, keys) in &maps.tag_to_keys {
            assert!(!keys.is_empty(), "empty bucket for tag {tag}");
            for key in keys {
                assert!(maps.key_to_tags[key].contains(tag), "dangling ({tag}, {key})");
            }
        }
        for (key, tags) in &maps.key_to_tags {
            for tag in tags {
                assert!(maps.tag_to_keys[tag].contains(key), "missing ({tag}, {key})");
            }
        }
    }
}
