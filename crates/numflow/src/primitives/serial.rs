//! Tagged serialization of persistable artifacts.
//!
//! ## Purpose
//!
//! This module defines the stable-identifier registry for persisted
//! artifacts (models, tables, partial results) and the tag-prefixed
//! envelope used to write and read them. A persisted artifact starts with
//! its [`SerializationTag`] as a little-endian `u32`, followed by the JSON
//! payload; read-back verifies the tag against the expected concrete type
//! before decoding.
//!
//! ## Design notes
//!
//! * **Stable IDs**: Tag values are explicit discriminants and must never be
//!   renumbered; new artifact types append new values.
//! * **Typed Read-Back**: [`unpack`] is parameterized by the concrete type,
//!   so a stream tagged for a different type fails with
//!   [`NumflowError::TagMismatch`] instead of decoding garbage.
//! * **Registry**: [`SerializationTag::from_u32`] is the flat id-to-type
//!   registry; unknown ids are reported, not ignored.
//!
//! ## Invariants
//!
//! * `pack` followed by `unpack` of the same type is the identity.
//! * Every `Persistable` implementation has a unique tag.
//!
//! ## Non-goals
//!
//! * This module does not version payload schemas; that is the artifact
//!   type's own concern.
//! * This module does not compress or encrypt payloads.

// External dependencies
use serde::Serialize;
use serde::de::DeserializeOwned;

// Internal dependencies
use crate::primitives::errors::NumflowError;

// ============================================================================
// Serialization Tags
// ============================================================================

/// Stable numeric identifiers for persistable artifact types.
///
/// The discriminants are part of the persistence format. Renumbering an
/// existing tag breaks read-back of stored artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SerializationTag {
    /// Dense table, single precision.
    DenseTableF32 = 1001,

    /// Dense table, double precision.
    DenseTableF64 = 1002,

    /// CSR table, single precision.
    CsrTableF32 = 1011,

    /// CSR table, double precision.
    CsrTableF64 = 1012,

    /// Linear regression model, single precision.
    LinearModelF32 = 2001,

    /// Linear regression model, double precision.
    LinearModelF64 = 2002,

    /// Low-order moments partial result, single precision.
    MomentsPartialF32 = 3001,

    /// Low-order moments partial result, double precision.
    MomentsPartialF64 = 3002,

    /// QR triangular partial result, single precision.
    TriangularPartialF32 = 3011,

    /// QR triangular partial result, double precision.
    TriangularPartialF64 = 3012,

    /// Normal-equations partial result, single precision.
    NormalEquationsPartialF32 = 3021,

    /// Normal-equations partial result, double precision.
    NormalEquationsPartialF64 = 3022,
}

impl SerializationTag {
    /// Look a tag up in the registry by its stable id.
    pub const fn from_u32(id: u32) -> Option<Self> {
        match id {
            1001 => Some(Self::DenseTableF32),
            1002 => Some(Self::DenseTableF64),
            1011 => Some(Self::CsrTableF32),
            1012 => Some(Self::CsrTableF64),
            2001 => Some(Self::LinearModelF32),
            2002 => Some(Self::LinearModelF64),
            3001 => Some(Self::MomentsPartialF32),
            3002 => Some(Self::MomentsPartialF64),
            3011 => Some(Self::TriangularPartialF32),
            3012 => Some(Self::TriangularPartialF64),
            3021 => Some(Self::NormalEquationsPartialF32),
            3022 => Some(Self::NormalEquationsPartialF64),
            _ => None,
        }
    }

    /// The stable id of this tag.
    pub const fn id(self) -> u32 {
        self as u32
    }
}

// ============================================================================
// Persistable Trait
// ============================================================================

/// Artifact types that can cross the serialization boundary.
///
/// Implementations pair a concrete type with its stable tag. The trait is
/// implemented per precision, so each (type, precision) pair keeps its own
/// identifier.
pub trait Persistable: Serialize + DeserializeOwned {
    /// Stable tag of this concrete type.
    const TAG: SerializationTag;
}

// ============================================================================
// Envelope Encoding
// ============================================================================

/// Serialize an artifact into a tag-prefixed byte envelope.
pub fn pack<V: Persistable>(value: &V) -> Result<Vec<u8>, NumflowError> {
    let payload = serde_json::to_vec(value)
        .map_err(|e| NumflowError::SerializationFailed(e.to_string()))?;
    let mut bytes = Vec::with_capacity(4 + payload.len());
    bytes.extend_from_slice(&V::TAG.id().to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Deserialize an artifact from a tag-prefixed byte envelope.
///
/// Fails with [`NumflowError::TagMismatch`] when the stream was written for
/// a different concrete type.
pub fn unpack<V: Persistable>(bytes: &[u8]) -> Result<V, NumflowError> {
    if bytes.len() < 4 {
        return Err(NumflowError::SerializationFailed(
            "envelope shorter than the tag prefix".into(),
        ));
    }
    let mut tag_bytes = [0u8; 4];
    tag_bytes.copy_from_slice(&bytes[..4]);
    let got = u32::from_le_bytes(tag_bytes);
    if got != V::TAG.id() {
        return Err(NumflowError::TagMismatch {
            expected: V::TAG.id(),
            got,
        });
    }
    serde_json::from_slice(&bytes[4..])
        .map_err(|e| NumflowError::SerializationFailed(e.to_string()))
}

/// Read the tag of an envelope without decoding the payload.
pub fn peek_tag(bytes: &[u8]) -> Result<SerializationTag, NumflowError> {
    if bytes.len() < 4 {
        return Err(NumflowError::SerializationFailed(
            "envelope shorter than the tag prefix".into(),
        ));
    }
    let mut tag_bytes = [0u8; 4];
    tag_bytes.copy_from_slice(&bytes[..4]);
    let id = u32::from_le_bytes(tag_bytes);
    SerializationTag::from_u32(id).ok_or(NumflowError::SerializationFailed(format!(
        "unknown serialization tag {id}"
    )))
}

// ============================================================================
// Table Implementations
// ============================================================================

use crate::primitives::table::{CsrTable, NumericTable};

impl Persistable for NumericTable<f32> {
    const TAG: SerializationTag = SerializationTag::DenseTableF32;
}

impl Persistable for NumericTable<f64> {
    const TAG: SerializationTag = SerializationTag::DenseTableF64;
}

impl Persistable for CsrTable<f32> {
    const TAG: SerializationTag = SerializationTag::CsrTableF32;
}

impl Persistable for CsrTable<f64> {
    const TAG: SerializationTag = SerializationTag::CsrTableF64;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_consistent() {
        for tag in [
            SerializationTag::DenseTableF64,
            SerializationTag::LinearModelF32,
            SerializationTag::MomentsPartialF64,
        ] {
            assert_eq!(SerializationTag::from_u32(tag.id()), Some(tag));
        }
        assert_eq!(SerializationTag::from_u32(0), None);
    }

    #[test]
    fn mismatched_tag_is_rejected() {
        let table = NumericTable::<f64>::new(1, 2, vec![1.0, 2.0]).unwrap();
        let bytes = pack(&table).unwrap();
        let err = unpack::<NumericTable<f32>>(&bytes).unwrap_err();
        assert_eq!(
            err,
            NumflowError::TagMismatch {
                expected: SerializationTag::DenseTableF32.id(),
                got: SerializationTag::DenseTableF64.id(),
            }
        );
    }

    #[test]
    fn peek_reports_unknown_tags() {
        let bytes = 9999u32.to_le_bytes().to_vec();
        assert!(peek_tag(&bytes).is_err());
    }
}
