// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Context kind and provider identity types.

use core::fmt;
use core::marker::PhantomData;

/// Untyped identifier of a context kind.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KindId(pub(crate) u32);

impl KindId {
    /// Returns the raw kind index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for KindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KindId({})", self.0)
    }
}

/// A typed context kind.
///
/// Every provider registered under a `Kind<T>` exposes a value of type `T`,
/// so a lookup through the kind can only ever yield a `T`. Kinds are created
/// by [`Registry::create_kind`](super::Registry::create_kind) and are cheap
/// to copy.
pub struct Kind<T: 'static> {
    id: KindId,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Kind<T> {
    pub(crate) const fn new(id: KindId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Returns the untyped identifier of this kind.
    #[inline]
    #[must_use]
    pub const fn id(self) -> KindId {
        self.id
    }
}

impl<T: 'static> Clone for Kind<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> Copy for Kind<T> {}

impl<T: 'static> PartialEq for Kind<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: 'static> Eq for Kind<T> {}

impl<T: 'static> fmt::Debug for Kind<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kind")
            .field("id", &self.id.0)
            .field("type", &core::any::type_name::<T>())
            .finish()
    }
}

/// A handle to a registry entry.
///
/// Slot index plus generation counter: a reclaimed entry's handle never
/// matches a later entry in the same slot, so ids are unique for the lifetime
/// of the runtime.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProviderId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl ProviderId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderId({}@gen{})", self.idx, self.generation)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}.{}", self.idx, self.generation)
    }
}
