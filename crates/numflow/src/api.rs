//! Processing-mode selection for algorithm builders.
//!
//! ## Purpose
//!
//! This module provides the marker types that select an execution mode for a
//! family builder (Batch, Online, or Distributed) and the conversion trait
//! that transitions a generic family builder into its mode-specific builder.
//!
//! ## Design notes
//!
//! * **Polymorphic**: Each marker implements [`ProcessingMode`] for the
//!   builders that support it; selecting an unsupported mode for a family is
//!   a compile-time error, not a runtime one.
//! * **Configuration Flow**: Family builder → configuration setters →
//!   `.mode(marker)` → mode builder → `build()`.
//!
//! ## Key concepts
//!
//! * **Batch**: one-shot compute over fully bound data.
//! * **Online**: repeated compute over re-bound chunks, one finalize.
//! * **Distributed**: fixed local/master step pipeline with explicit
//!   partition-indexed fan-in.
//!
//! ## Non-goals
//!
//! * This module does not validate configuration; mode builders do that in
//!   `build()`.

// ============================================================================
// Mode Markers
// ============================================================================

/// Marker for one-shot in-memory processing.
#[derive(Debug, Clone, Copy)]
pub struct Batch;

/// Marker for incremental chunked processing with a final flush.
#[derive(Debug, Clone, Copy)]
pub struct Online;

/// Marker for fixed-topology multi-step processing across partitions.
#[derive(Debug, Clone, Copy)]
pub struct Distributed;

// ============================================================================
// Mode Conversion Trait
// ============================================================================

/// Trait for transitioning a generic family builder into a mode builder.
///
/// Implemented by the mode markers for every (family, mode) pair the crate
/// supports; the set of implementations is the compile-time support matrix.
pub trait ProcessingMode<B> {
    /// The mode-specific builder this marker produces.
    type Output;

    /// Convert a generic family builder into the mode builder.
    fn convert(builder: B) -> Self::Output;
}
