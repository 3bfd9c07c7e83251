// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fan-out to two sinks.

use tendril_core::node::MutationRecord;
use tendril_core::trace::{
    BatchEvent, ClearEvent, DrawEvent, LinkRefreshEvent, NavigateEvent, NotFoundEvent,
    ReclaimEvent, RegisterEvent, RootElectedEvent, SettleSummary, TaskEvent, TraceSink,
    WatchEvent,
};

/// A [`TraceSink`] that forwards every event to `A`, then to `B`.
///
/// Nest tees for more than two destinations.
#[derive(Clone, Debug, Default)]
pub struct Tee<A, B> {
    /// The first destination.
    pub first: A,
    /// The second destination.
    pub second: B,
}

impl<A, B> Tee<A, B> {
    /// Creates a tee.
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

macro_rules! forward {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(&mut self, e: &$ty) {
                self.first.$method(e);
                self.second.$method(e);
            }
        )*
    };
}

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    forward!(
        on_register(RegisterEvent),
        on_watch(WatchEvent),
        on_reclaim(ReclaimEvent),
        on_batch(BatchEvent),
        on_task(TaskEvent),
        on_settle(SettleSummary),
        on_draw(DrawEvent<'_>),
        on_clear(ClearEvent<'_>),
        on_not_found(NotFoundEvent<'_>),
        on_navigate(NavigateEvent<'_>),
        on_root_elected(RootElectedEvent<'_>),
        on_link_refresh(LinkRefreshEvent<'_>),
    );

    fn on_mutations(&mut self, records: &[MutationRecord]) {
        self.first.on_mutations(records);
        self.second.on_mutations(records);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pretty::PrettyPrintSink;
    use crate::recorder::{RecorderSink, decode};

    #[test]
    fn both_sides_see_every_event() {
        let mut tee = Tee::new(
            RecorderSink::new(),
            PrettyPrintSink::with_writer(Vec::<u8>::new()),
        );
        tee.on_task(&TaskEvent {
            seq: 1,
            label: "watch",
            ok: false,
        });
        assert_eq!(decode(tee.first.as_bytes()).count(), 1);
        let text = String::from_utf8(tee.second.into_writer()).unwrap();
        assert!(text.contains("FAILED"), "got: {text}");
    }
}
