// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records. Router events carry path text, which
//! is stored length-prefixed. [`decode`] reads the recording back as an
//! iterator of [`RecordedEvent`].
//!
//! Node and provider handles are stored as raw `(index, generation)` pairs
//! ([`RawId`]); a recording outlives the runtime that produced it.
//!
//! The rich [`on_mutations`](TraceSink::on_mutations) callback stores only
//! the record count and the total number of added and removed children.

use std::fmt;

use tendril_core::context::{KindId, ProviderId};
use tendril_core::node::{MutationRecord, NodeId};
use tendril_core::trace::{
    BatchEvent, ClearEvent, DrawEvent, LinkRefreshEvent, NavigateEvent, NotFoundEvent,
    ReclaimEvent, RegisterEvent, RootElectedEvent, SettleSummary, TaskEvent, TraceSink,
    WatchEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_REGISTER: u8 = 1;
const TAG_WATCH: u8 = 2;
const TAG_RECLAIM: u8 = 3;
const TAG_BATCH: u8 = 4;
const TAG_TASK: u8 = 5;
const TAG_SETTLE: u8 = 6;
const TAG_DRAW: u8 = 7;
const TAG_CLEAR: u8 = 8;
const TAG_NOT_FOUND: u8 = 9;
const TAG_NAVIGATE: u8 = 10;
const TAG_ROOT_ELECTED: u8 = 11;
const TAG_LINK_REFRESH: u8 = 12;
const TAG_MUTATIONS: u8 = 13;

/// A node or provider handle as recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawId {
    /// Slot index.
    pub index: u32,
    /// Generation counter.
    pub generation: u32,
}

impl From<NodeId> for RawId {
    fn from(id: NodeId) -> Self {
        Self {
            index: id.index(),
            generation: id.generation(),
        }
    }
}

impl From<ProviderId> for RawId {
    fn from(id: ProviderId) -> Self {
        Self {
            index: id.index(),
            generation: id.generation(),
        }
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.index, self.generation)
    }
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "counts capped at u32::MAX for recording"
    )]
    fn write_count(&mut self, n: usize) {
        self.write_u32(n.min(u32::MAX as usize) as u32);
    }

    fn write_id(&mut self, id: impl Into<RawId>) {
        let id = id.into();
        self.write_u32(id.index);
        self.write_u32(id.generation);
    }

    fn write_kind(&mut self, kind: KindId) {
        self.write_u32(kind.index());
    }

    fn write_str(&mut self, s: &str) {
        self.write_count(s.len());
        self.buf.extend_from_slice(s.as_bytes());
    }
}

impl TraceSink for RecorderSink {
    fn on_register(&mut self, e: &RegisterEvent) {
        self.write_u8(TAG_REGISTER);
        self.write_id(e.provider);
        self.write_id(e.node);
        self.write_kind(e.kind);
    }

    fn on_watch(&mut self, e: &WatchEvent) {
        self.write_u8(TAG_WATCH);
        self.write_id(e.provider);
        self.write_id(e.node);
        self.write_id(e.parent);
        self.write_bool(e.moved);
    }

    fn on_reclaim(&mut self, e: &ReclaimEvent) {
        self.write_u8(TAG_RECLAIM);
        self.write_id(e.provider);
        self.write_id(e.node);
        self.write_kind(e.kind);
        self.write_count(e.hooks);
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        self.write_u8(TAG_BATCH);
        self.write_count(e.records);
        self.write_count(e.removed);
        self.write_count(e.detached);
        self.write_count(e.reclaimed);
    }

    fn on_task(&mut self, e: &TaskEvent) {
        self.write_u8(TAG_TASK);
        self.write_u64(e.seq);
        self.write_str(e.label);
        self.write_bool(e.ok);
    }

    fn on_settle(&mut self, s: &SettleSummary) {
        self.write_u8(TAG_SETTLE);
        self.write_u32(s.rounds);
        self.write_u32(s.tasks_run);
        self.write_u32(s.batches);
        self.write_u32(s.reclaimed);
        self.write_count(s.failures);
        self.write_bool(s.exhausted);
    }

    fn on_draw(&mut self, e: &DrawEvent<'_>) {
        self.write_u8(TAG_DRAW);
        self.write_id(e.route);
        self.write_str(e.pattern);
        self.write_str(e.remaining);
        self.write_bool(e.rerendered);
    }

    fn on_clear(&mut self, e: &ClearEvent<'_>) {
        self.write_u8(TAG_CLEAR);
        self.write_id(e.route);
        self.write_str(e.pattern);
        self.write_count(e.unsubscribed);
    }

    fn on_not_found(&mut self, e: &NotFoundEvent<'_>) {
        self.write_u8(TAG_NOT_FOUND);
        self.write_id(e.route);
        self.write_str(e.path);
        self.write_bool(e.handled);
    }

    fn on_navigate(&mut self, e: &NavigateEvent<'_>) {
        self.write_u8(TAG_NAVIGATE);
        self.write_id(e.route);
        self.write_str(e.target);
        self.write_str(e.qualified);
        self.write_bool(e.originating);
        self.write_bool(e.matched);
    }

    fn on_root_elected(&mut self, e: &RootElectedEvent<'_>) {
        self.write_u8(TAG_ROOT_ELECTED);
        self.write_id(e.route);
        self.write_str(e.path);
    }

    fn on_link_refresh(&mut self, e: &LinkRefreshEvent<'_>) {
        self.write_u8(TAG_LINK_REFRESH);
        self.write_id(e.link);
        self.write_str(e.to);
        self.write_bool(e.active);
        self.write_bool(e.changed);
    }

    fn on_mutations(&mut self, records: &[MutationRecord]) {
        self.write_u8(TAG_MUTATIONS);
        self.write_count(records.len());
        self.write_count(records.iter().map(|r| r.added.len()).sum());
        self.write_count(records.iter().map(|r| r.removed.len()).sum());
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`RegisterEvent`].
    Register {
        /// Provider handle.
        provider: RawId,
        /// Marked node.
        node: RawId,
        /// Kind index.
        kind: u32,
    },
    /// A [`WatchEvent`].
    Watch {
        /// Provider handle.
        provider: RawId,
        /// Observed node.
        node: RawId,
        /// Observed parent.
        parent: RawId,
        /// Whether observation followed a move.
        moved: bool,
    },
    /// A [`ReclaimEvent`].
    Reclaim {
        /// Provider handle.
        provider: RawId,
        /// The node it was attached to.
        node: RawId,
        /// Kind index.
        kind: u32,
        /// Hooks run.
        hooks: u32,
    },
    /// A [`BatchEvent`].
    Batch {
        /// Changed parents.
        records: u32,
        /// Distinct removed nodes.
        removed: u32,
        /// Removed nodes left without a parent.
        detached: u32,
        /// Entries reclaimed.
        reclaimed: u32,
    },
    /// A [`TaskEvent`].
    Task {
        /// Queue sequence number.
        seq: u64,
        /// Task label.
        label: String,
        /// Whether it succeeded.
        ok: bool,
    },
    /// A [`SettleSummary`].
    Settle {
        /// Rounds executed.
        rounds: u32,
        /// Tasks run.
        tasks_run: u32,
        /// Batches delivered.
        batches: u32,
        /// Entries reclaimed.
        reclaimed: u32,
        /// Failed tasks.
        failures: u32,
        /// Whether the round limit was hit.
        exhausted: bool,
    },
    /// A [`DrawEvent`].
    Draw {
        /// Route node.
        route: RawId,
        /// Own pattern.
        pattern: String,
        /// Remaining path.
        remaining: String,
        /// Whether the render function ran.
        rerendered: bool,
    },
    /// A [`ClearEvent`].
    Clear {
        /// Route node.
        route: RawId,
        /// Own pattern.
        pattern: String,
        /// Link subscriptions dropped.
        unsubscribed: u32,
    },
    /// A [`NotFoundEvent`].
    NotFound {
        /// Route node.
        route: RawId,
        /// Unmatched path.
        path: String,
        /// Whether a renderer handled it.
        handled: bool,
    },
    /// A [`NavigateEvent`].
    Navigate {
        /// Route node.
        route: RawId,
        /// Target path.
        target: String,
        /// Qualified pattern.
        qualified: String,
        /// Link-initiated request.
        originating: bool,
        /// Whether the pattern matched.
        matched: bool,
    },
    /// A [`RootElectedEvent`].
    RootElected {
        /// Route node.
        route: RawId,
        /// Initial path.
        path: String,
    },
    /// A [`LinkRefreshEvent`].
    LinkRefresh {
        /// Link node.
        link: RawId,
        /// Link target.
        to: String,
        /// New active state.
        active: bool,
        /// Whether it flipped.
        changed: bool,
    },
    /// Mutation record counts for one delivered batch.
    Mutations {
        /// Records in the batch.
        records: u32,
        /// Total added children.
        added: u32,
        /// Total removed children.
        removed: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_bytes(&mut self, n: usize) -> Option<&[u8]> {
        if self.remaining() < n {
            return None;
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        Some(self.read_bytes(1)?[0])
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.read_bytes(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.read_bytes(8)?.try_into().ok()?))
    }

    fn read_id(&mut self) -> Option<RawId> {
        Some(RawId {
            index: self.read_u32()?,
            generation: self.read_u32()?,
        })
    }

    fn read_str(&mut self) -> Option<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).ok()
    }

    fn decode_register(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Register {
            provider: self.read_id()?,
            node: self.read_id()?,
            kind: self.read_u32()?,
        })
    }

    fn decode_watch(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Watch {
            provider: self.read_id()?,
            node: self.read_id()?,
            parent: self.read_id()?,
            moved: self.read_bool()?,
        })
    }

    fn decode_reclaim(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Reclaim {
            provider: self.read_id()?,
            node: self.read_id()?,
            kind: self.read_u32()?,
            hooks: self.read_u32()?,
        })
    }

    fn decode_batch(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Batch {
            records: self.read_u32()?,
            removed: self.read_u32()?,
            detached: self.read_u32()?,
            reclaimed: self.read_u32()?,
        })
    }

    fn decode_task(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Task {
            seq: self.read_u64()?,
            label: self.read_str()?,
            ok: self.read_bool()?,
        })
    }

    fn decode_settle(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Settle {
            rounds: self.read_u32()?,
            tasks_run: self.read_u32()?,
            batches: self.read_u32()?,
            reclaimed: self.read_u32()?,
            failures: self.read_u32()?,
            exhausted: self.read_bool()?,
        })
    }

    fn decode_draw(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Draw {
            route: self.read_id()?,
            pattern: self.read_str()?,
            remaining: self.read_str()?,
            rerendered: self.read_bool()?,
        })
    }

    fn decode_clear(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Clear {
            route: self.read_id()?,
            pattern: self.read_str()?,
            unsubscribed: self.read_u32()?,
        })
    }

    fn decode_not_found(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::NotFound {
            route: self.read_id()?,
            path: self.read_str()?,
            handled: self.read_bool()?,
        })
    }

    fn decode_navigate(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Navigate {
            route: self.read_id()?,
            target: self.read_str()?,
            qualified: self.read_str()?,
            originating: self.read_bool()?,
            matched: self.read_bool()?,
        })
    }

    fn decode_root_elected(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RootElected {
            route: self.read_id()?,
            path: self.read_str()?,
        })
    }

    fn decode_link_refresh(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LinkRefresh {
            link: self.read_id()?,
            to: self.read_str()?,
            active: self.read_bool()?,
            changed: self.read_bool()?,
        })
    }

    fn decode_mutations(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Mutations {
            records: self.read_u32()?,
            added: self.read_u32()?,
            removed: self.read_u32()?,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_REGISTER => self.decode_register(),
            TAG_WATCH => self.decode_watch(),
            TAG_RECLAIM => self.decode_reclaim(),
            TAG_BATCH => self.decode_batch(),
            TAG_TASK => self.decode_task(),
            TAG_SETTLE => self.decode_settle(),
            TAG_DRAW => self.decode_draw(),
            TAG_CLEAR => self.decode_clear(),
            TAG_NOT_FOUND => self.decode_not_found(),
            TAG_NAVIGATE => self.decode_navigate(),
            TAG_ROOT_ELECTED => self.decode_root_elected(),
            TAG_LINK_REFRESH => self.decode_link_refresh(),
            TAG_MUTATIONS => self.decode_mutations(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
