//! CBOR encode/decode helpers shared by every persisted table entry.

use serde::{de::DeserializeOwned, Serialize};

use crate::{Result, StorageError};

/// Serialize a value to CBOR bytes.
pub fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| StorageError::CborEncode(e.to_string()))?;
    Ok(buf)
}

/// Deserialize a value from CBOR bytes.
///
/// A decode failure is not escalated; a partially-written
/// slot that fails to decode on reload is treated as an empty slot, so
/// callers typically turn `Err` here into `None` rather than propagating it.
pub fn from_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    ciborium::from_reader(data).map_err(|e| StorageError::CborDecode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        id: u32,
        name: String,
    }

    #[test]
    fn roundtrip() {
        let s = Sample {
            id: 7,
            name: "ga".into(),
        };
        let bytes = to_vec(&s).expect("encode");
        let back: Sample = from_slice(&bytes).expect("decode");
        assert_eq!(s, back);
    }

    #[test]
    fn corrupt_bytes_fail_decode_not_panic() {
        let garbage = [0xff, 0x00, 0x01];
        let result: Result<Sample> = from_slice(&garbage);
        assert!(result.is_err());
    }
}
