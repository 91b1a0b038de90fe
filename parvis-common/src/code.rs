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

use bytes::{Buf, BufMut};
use paste::paste;

use crate::error::{Error, Result};

/// Encoding and decoding contract for values carried across a byte backend.
///
/// Decoding returns an error rather than panicking: undecodable payloads are a
/// normal control-flow path that purges the entry.
pub trait Code: Sized + Send + Sync + 'static + std::fmt::Debug {
    /// The exact encoded length in bytes.
    fn encoded_len(&self) -> usize;

    /// Append the encoded representation to `buf`.
    fn encode(&self, buf: &mut impl BufMut);

    /// Decode a value from the full payload slice.
    fn decode(buf: &[u8]) -> Result<Self>;
}

macro_rules! for_all_multibyte_primitives {
    ($macro:ident) => {
        $macro! {
            u16, u32, u64,
            i16, i32, i64,
        }
    };
}

macro_rules! impl_code {
    ($( $type:ty, )*) => {
        paste! {
            $(
                impl Code for $type {
                    fn encoded_len(&self) -> usize {
                        std::mem::size_of::<$type>()
                    }

                    fn encode(&self, buf: &mut impl BufMut) {
                        buf.[<put_ $type _le>](*self)
                    }

                    fn decode(mut buf: &[u8]) -> Result<Self> {
                        if buf.remaining() < std::mem::size_of::<$type>() {
                            return Err(Error::Corrupt("payload too short for value"));
                        }
                        Ok(buf.[<get_ $type _le>]())
                    }
                }
            )*
        }
    };
}

macro_rules! impl_code_byte {
    ($( $type:ty, )*) => {
        paste! {
            $(
                impl Code for $type {
                    fn encoded_len(&self) -> usize {
                        1
                    }

                    fn encode(&self, buf: &mut impl BufMut) {
                        buf.[<put_ $type>](*self)
                    }

                    fn decode(mut buf: &[u8]) -> Result<Self> {
                        if !buf.has_remaining() {
                            return Err(Error::Corrupt("payload too short for value"));
                        }
                        Ok(buf.[<get_ $type>]())
                    }
                }
            )*
        }
    };
}

for_all_multibyte_primitives! { impl_code }
impl_code_byte! { u8, i8, }

impl Code for String {
    fn encoded_len(&self) -> usize {
        self.len()
    }

    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_slice(self.as_bytes());
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        std::str::from_utf8(buf)
            .map(|s| s.to_string())
            .map_err(|_| Error::Corrupt("payload is not valid utf-8"))
    }
}

impl Code for Vec<u8> {
    fn encoded_len(&self) -> usize {
        self.len()
    }

    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_slice(self);
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        Ok(buf.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: Code + PartialEq>(value: T) {
        let mut buf = Vec::with_capacity(value.encoded_len());
        value.encode(&mut buf);
        assert_eq!(buf.len(), value.encoded_len());
        assert_eq!(T::decode(&buf).unwrap(), value);
    }

    #[test]
    fn test_primitives() {
        roundtrip(42u8);
        roundtrip(0xBEEFu16);
        roundtrip(u64::MAX);
        roundtrip(-42i64);
        roundtrip(i32::MIN);
    }

    #[test]
    fn test_strings_and_bytes() {
        roundtrip("hello parvis".to_string());
        roundtrip(String::new());
        roundtrip(vec![0u8, 1, 2, 255]);
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(u64::decode(&[0u8; 4]), Err(Error::Corrupt(_))));
        assert!(matches!(String::decode(&[0xFF, 0xFE]), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_little_endian_layout() {
        let mut buf = Vec::new();
        0x0102_0304u32.encode(&mut buf);
        assert_eq!(buf, vec![0x04, 0x03, 0x02, 0x01]);
    }
}
