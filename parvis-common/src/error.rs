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

/// Error for all parvis operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The caller supplied an empty or whitespace key.
    #[error("invalid key: {0}")]
    InvalidKey(&'static str),
    /// The caller supplied an empty or whitespace tag.
    #[error("invalid tag: {0}")]
    InvalidTag(&'static str),
    /// Per-operation entry options are internally inconsistent.
    #[error("invalid options: {0}")]
    InvalidOptions(&'static str),
    /// Cache construction or category registration error.
    #[error("config error: {0}")]
    Config(String),
    /// The caller selected a category that was never registered.
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    /// A blob read from the byte store cannot be decoded.
    #[error("corrupt entry: {0}")]
    Corrupt(&'static str),
    /// A value does not fit the envelope payload length field.
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),
    /// External byte store failure.
    #[error("store error: {0}")]
    Store(#[source] anyhow::Error),
    /// Factory failure during cache-aside population.
    #[error("factory error: {0}")]
    Factory(#[source] anyhow::Error),
}

/// Result for all parvis operations.
pub type Result<T> = std::result::Result<T, Error>;
