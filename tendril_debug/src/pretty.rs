// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use tendril_core::node::MutationRecord;
use tendril_core::trace::{
    BatchEvent, ClearEvent, DrawEvent, LinkRefreshEvent, NavigateEvent, NotFoundEvent,
    ReclaimEvent, RegisterEvent, RootElectedEvent, SettleSummary, TaskEvent, TraceSink,
    WatchEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its destination.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn flag(on: bool, yes: &'static str, no: &'static str) -> &'static str {
    if on { yes } else { no }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_register(&mut self, e: &RegisterEvent) {
        let _ = writeln!(
            self.writer,
            "[register] {} node={} kind={}",
            e.provider,
            e.node,
            e.kind.index(),
        );
    }

    fn on_watch(&mut self, e: &WatchEvent) {
        let _ = writeln!(
            self.writer,
            "[watch] {} node={} parent={}{}",
            e.provider,
            e.node,
            e.parent,
            flag(e.moved, " (moved)", ""),
        );
    }

    fn on_reclaim(&mut self, e: &ReclaimEvent) {
        let _ = writeln!(
            self.writer,
            "[reclaim] {} node={} kind={} hooks={}",
            e.provider,
            e.node,
            e.kind.index(),
            e.hooks,
        );
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        let _ = writeln!(
            self.writer,
            "[batch] records={} removed={} detached={} reclaimed={}",
            e.records, e.removed, e.detached, e.reclaimed,
        );
    }

    fn on_task(&mut self, e: &TaskEvent) {
        let _ = writeln!(
            self.writer,
            "[task] #{} {} {}",
            e.seq,
            e.label,
            flag(e.ok, "ok", "FAILED"),
        );
    }

    fn on_settle(&mut self, s: &SettleSummary) {
        let _ = writeln!(
            self.writer,
            "[settle] rounds={} tasks={} batches={} reclaimed={} failures={}{}",
            s.rounds,
            s.tasks_run,
            s.batches,
            s.reclaimed,
            s.failures,
            flag(s.exhausted, " EXHAUSTED", ""),
        );
    }

    fn on_draw(&mut self, e: &DrawEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[draw] {} {:?} rest={:?} {}",
            e.route,
            e.pattern,
            e.remaining,
            flag(e.rerendered, "rendered", "kept"),
        );
    }

    fn on_clear(&mut self, e: &ClearEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[clear] {} {:?} unsubscribed={}",
            e.route, e.pattern, e.unsubscribed,
        );
    }

    fn on_not_found(&mut self, e: &NotFoundEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[not-found] {} path={:?} {}",
            e.route,
            e.path,
            flag(e.handled, "handled", "UNHANDLED"),
        );
    }

    fn on_navigate(&mut self, e: &NavigateEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[navigate] {} to={:?} via={:?}{} {}",
            e.route,
            e.target,
            e.qualified,
            flag(e.originating, " origin", ""),
            flag(e.matched, "match", "bubble"),
        );
    }

    fn on_root_elected(&mut self, e: &RootElectedEvent<'_>) {
        let _ = writeln!(self.writer, "[root] {} path={:?}", e.route, e.path);
    }

    fn on_link_refresh(&mut self, e: &LinkRefreshEvent<'_>) {
        // Unchanged links are the common case and would drown the output.
        if !e.changed {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[link] {} to={:?} {}",
            e.link,
            e.to,
            flag(e.active, "active", "inactive"),
        );
    }

    fn on_mutations(&mut self, records: &[MutationRecord]) {
        let added: usize = records.iter().map(|r| r.added.len()).sum();
        let removed: usize = records.iter().map(|r| r.removed.len()).sum();
        let _ = writeln!(
            self.writer,
            "[mutations] records={} added={added} removed={removed}",
            records.len(),
        );
    }
}
