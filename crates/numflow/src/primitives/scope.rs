//! Scoped bulk release of owned resources.
//!
//! ## Purpose
//!
//! This module provides [`ResourceScope`], an explicit scope that adopts
//! owned values and drops them together when the scope ends. It reproduces
//! the bulk-disposal context of handle-based analytics runtimes as a safe
//! construct: a resource adopted by the scope is released exactly once,
//! either at explicit [`ResourceScope::release_all`] or when the scope is
//! dropped.
//!
//! ## Design notes
//!
//! * **Ownership**: Adoption moves the resource into the scope; the caller
//!   keeps no handle, so use-after-release cannot be expressed.
//! * **Order**: Resources are released in reverse adoption order, matching
//!   the nesting callers usually build.
//! * **Opt-In**: Algorithm objects already release their own state on drop;
//!   the scope exists for callers that stage many short-lived artifacts (per
//!   chunk tables, per-partition partials) and want one release point.
//!
//! ## Invariants
//!
//! * Each adopted resource is dropped exactly once.
//! * After `release_all`, the scope is empty and reusable.
//!
//! ## Non-goals
//!
//! * This module does not track borrowed data; it owns what it releases.
//! * This module does not provide cross-thread disposal.

// External dependencies
use core::any::Any;

// ============================================================================
// Resource Scope
// ============================================================================

/// Explicit scope that owns resources and releases them in bulk.
#[derive(Default)]
pub struct ResourceScope {
    retained: Vec<Box<dyn Any>>,
}

impl ResourceScope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a resource into the scope.
    ///
    /// The resource lives until `release_all` or scope drop, whichever comes
    /// first.
    pub fn adopt<R: 'static>(&mut self, resource: R) {
        self.retained.push(Box::new(resource));
    }

    /// Number of resources currently held.
    pub fn len(&self) -> usize {
        self.retained.len()
    }

    /// Whether the scope holds no resources.
    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    /// Release every held resource now, in reverse adoption order.
    pub fn release_all(&mut self) {
        while self.retained.pop().is_some() {}
    }
}

impl Drop for ResourceScope {
    fn drop(&mut self) {
        self.release_all();
    }
}

// ============================================================================
// Tests
// ============================================================================
