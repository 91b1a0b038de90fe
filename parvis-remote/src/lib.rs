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

//! Byte-oriented remote backend for parvis.
//!
//! Values cross the external store as a fixed-layout envelope carrying the expiration
//! metadata next to the encoded payload, so any process that shares the store can
//! classify entries without side channels.

mod backend;
mod envelope;
mod store;

/// In-memory byte store for tests and examples.
pub mod test_utils;

pub use backend::RemoteBackend;
pub use envelope::{EnvelopeCodec, ENVELOPE_HEADER_LEN};
pub use store::ByteStore;
