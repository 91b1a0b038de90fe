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

use bytes::{Buf, BufMut, Bytes, BytesMut};
use parvis_common::{
    error::{Error, Result},
    metadata::EntryMetadata,
};

/// Size of the fixed little-endian envelope header.
///
/// ```text
/// 0   i64  created-at millis
/// 8   i64  absolute-expiration millis  (0 = none)
/// 16  i64  sliding-window millis       (0 = none)
/// 24  i64  stale-window millis         (0 = none)
/// 32  i32  payload length (>= 0)
/// 36  ...  payload bytes
/// ```
///
/// There is no magic or version byte; a future revision must prepend one and reject
/// unknown magics. Deployments sharing a store must agree on this layout byte-for-byte.
pub const ENVELOPE_HEADER_LEN: usize = 36;

/// Encoder/decoder for the `(metadata, payload)` envelope.
#[derive(Debug)]
pub struct EnvelopeCodec;

impl EnvelopeCodec {
    /// Encode metadata and payload into a single blob.
    pub fn encode(metadata: &EntryMetadata, payload: &[u8]) -> Result<Bytes> {
        let payload_len = i32::try_from(payload.len()).map_err(|_| Error::PayloadTooLarge(payload.len()))?;

        let mut buf = BytesMut::with_capacity(ENVELOPE_HEADER_LEN + payload.len());
        let (created_at, expires_at, sliding, stale) = metadata.raw_parts();
        buf.put_i64_le(created_at);
        buf.put_i64_le(expires_at);
        buf.put_i64_le(sliding);
        buf.put_i64_le(stale);
        buf.put_i32_le(payload_len);
        buf.put_slice(payload);
        Ok(buf.freeze())
    }

    /// Decode a blob back into metadata and payload.
    ///
    /// Rejects blobs shorter than the header, negative payload lengths, and blobs whose
    /// length disagrees with the recorded payload length.
    pub fn decode(blob: &[u8]) -> Result<(EntryMetadata, Bytes)> {
        if blob.len() < ENVELOPE_HEADER_LEN {
            return Err(Error::Corrupt("envelope shorter than header"));
        }

        let mut header = &blob[..ENVELOPE_HEADER_LEN];
        let created_at = header.get_i64_le();
        let expires_at = header.get_i64_le();
        let sliding = header.get_i64_le();
        let stale = header.get_i64_le();
        let payload_len = header.get_i32_le();

        if payload_len < 0 {
            return Err(Error::Corrupt("negative payload length"));
        }
        if blob.len() - ENVELOPE_HEADER_LEN != payload_len as usize {
            return Err(Error::Corrupt("payload length mismatch"));
        }

        let metadata = EntryMetadata::from_raw_parts(created_at, expires_at, sliding, stale);
        let payload = Bytes::copy_from_slice(&blob[ENVELOPE_HEADER_LEN..]);
        Ok((metadata, payload))
    }
}
