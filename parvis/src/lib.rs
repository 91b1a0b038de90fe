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

#![warn(missing_docs)]

//! A policy-driven caching façade over interchangeable backends.
//!
//! parvis layers cross-cutting cache policy on top of a plain store: absolute and
//! sliding TTLs, stale-while-revalidate, stampede protection, tag-based bulk
//! invalidation, per-category defaults, and accounting metrics. Values live either in
//! an in-process object map or behind an external byte store; the policy engine is the
//! same over both.

mod builder;
mod cache;
mod options;
mod resolver;
mod tags;
mod tracker;

mod prelude;
pub use prelude::*;
