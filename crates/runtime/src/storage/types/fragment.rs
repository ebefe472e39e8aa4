//! Opaque fragment payloads exchanged between participants and storage.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::types::FragmentName;

/// Errors raised while encoding or decoding a fragment payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FragmentError {
    #[error("failed to encode fragment: {0}")]
    Encode(String),

    #[error("failed to decode fragment: {0}")]
    Decode(String),
}

/// One participant's save data, as stored in a single fragment blob.
///
/// The runtime never looks inside the bytes. Participants are free to use any
/// format; [`FragmentPayload::encode`] and [`FragmentPayload::decode`] cover the
/// common case of a serde type stored as bincode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FragmentPayload {
    bytes: Vec<u8>,
}

impl FragmentPayload {
    /// Wrap raw bytes produced by a participant.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Encode a serde value as a bincode payload.
    pub fn encode<T: Serialize>(value: &T) -> Result<Self, FragmentError> {
        let bytes = bincode::serialize(value).map_err(|e| FragmentError::Encode(e.to_string()))?;
        Ok(Self { bytes })
    }

    /// Decode a bincode payload previously produced by [`FragmentPayload::encode`].
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, FragmentError> {
        bincode::deserialize(&self.bytes).map_err(|e| FragmentError::Decode(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Entry of the save operation queue: a gathered payload and where it goes.
#[derive(Debug, Clone)]
pub struct QueuedFragment {
    pub name: FragmentName,
    pub payload: FragmentPayload,
}

impl QueuedFragment {
    pub fn new(name: impl Into<FragmentName>, payload: FragmentPayload) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}
