// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Events carry no wall-clock time. Each one is stamped with its position in
//! the recording (one microsecond apart), and a settle call is drawn as a
//! complete event spanning everything recorded since the previous one.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Thread lane for runtime events.
const TID_RUNTIME: u32 = 0;
/// Thread lane for router events.
const TID_ROUTER: u32 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut settle_start = 0_u64;

    for (ts, recorded) in (0_u64..).zip(decode(bytes)) {
        let event = match recorded {
            RecordedEvent::Register {
                provider,
                node,
                kind,
            } => instant("Register", "Context", ts, TID_RUNTIME, json!({
                "provider": provider.to_string(),
                "node": node.to_string(),
                "kind": kind,
            })),
            RecordedEvent::Watch {
                provider,
                node,
                parent,
                moved,
            } => instant("Watch", "Lifecycle", ts, TID_RUNTIME, json!({
                "provider": provider.to_string(),
                "node": node.to_string(),
                "parent": parent.to_string(),
                "moved": moved,
            })),
            RecordedEvent::Reclaim {
                provider,
                node,
                kind,
                hooks,
            } => instant("Reclaim", "Lifecycle", ts, TID_RUNTIME, json!({
                "provider": provider.to_string(),
                "node": node.to_string(),
                "kind": kind,
                "hooks": hooks,
            })),
            RecordedEvent::Batch {
                records,
                removed,
                detached,
                reclaimed,
            } => instant("Batch", "Lifecycle", ts, TID_RUNTIME, json!({
                "records": records,
                "removed": removed,
                "detached": detached,
                "reclaimed": reclaimed,
            })),
            RecordedEvent::Task { seq, label, ok } => {
                instant(&label, "Task", ts, TID_RUNTIME, json!({
                    "seq": seq,
                    "ok": ok,
                }))
            }
            RecordedEvent::Settle {
                rounds,
                tasks_run,
                batches,
                reclaimed,
                failures,
                exhausted,
            } => {
                let event = json!({
                    "ph": "X",
                    "name": "Settle",
                    "cat": "Runtime",
                    "ts": settle_start,
                    "dur": ts + 1 - settle_start,
                    "pid": 0,
                    "tid": TID_RUNTIME,
                    "args": {
                        "rounds": rounds,
                        "tasks_run": tasks_run,
                        "batches": batches,
                        "reclaimed": reclaimed,
                        "failures": failures,
                        "exhausted": exhausted,
                    }
                });
                settle_start = ts + 1;
                event
            }
            RecordedEvent::Draw {
                route,
                pattern,
                remaining,
                rerendered,
            } => instant("Draw", "Router", ts, TID_ROUTER, json!({
                "route": route.to_string(),
                "pattern": pattern,
                "remaining": remaining,
                "rerendered": rerendered,
            })),
            RecordedEvent::Clear {
                route,
                pattern,
                unsubscribed,
            } => instant("Clear", "Router", ts, TID_ROUTER, json!({
                "route": route.to_string(),
                "pattern": pattern,
                "unsubscribed": unsubscribed,
            })),
            RecordedEvent::NotFound {
                route,
                path,
                handled,
            } => instant("NotFound", "Router", ts, TID_ROUTER, json!({
                "route": route.to_string(),
                "path": path,
                "handled": handled,
            })),
            RecordedEvent::Navigate {
                route,
                target,
                qualified,
                originating,
                matched,
            } => instant("Navigate", "Router", ts, TID_ROUTER, json!({
                "route": route.to_string(),
                "target": target,
                "qualified": qualified,
                "originating": originating,
                "matched": matched,
            })),
            RecordedEvent::RootElected { route, path } => {
                instant("RootElected", "Router", ts, TID_ROUTER, json!({
                    "route": route.to_string(),
                    "path": path,
                }))
            }
            RecordedEvent::LinkRefresh {
                link,
                to,
                active,
                changed,
            } => instant("LinkRefresh", "Router", ts, TID_ROUTER, json!({
                "link": link.to_string(),
                "to": to,
                "active": active,
                "changed": changed,
            })),
            RecordedEvent::Mutations {
                records,
                added,
                removed,
            } => instant("Mutations", "Rich", ts, TID_RUNTIME, json!({
                "records": records,
                "added": added,
                "removed": removed,
            })),
        };
        events.push(event);
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn instant(name: &str, cat: &str, ts: u64, tid: u32, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": cat,
        "ts": ts,
        "pid": 0,
        "tid": tid,
        "s": "t",
        "args": args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use tendril_core::Runtime;
    use tendril_core::trace::{SettleSummary, TaskEvent, TraceSink};

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        let mut rt = Runtime::new();
        let route = rt.element("route", []);
        rec.on_task(&TaskEvent {
            seq: 0,
            label: "elect-root",
            ok: true,
        });
        rec.on_draw(&tendril_core::trace::DrawEvent {
            route,
            pattern: "",
            remaining: "/",
            rerendered: true,
        });
        rec.on_settle(&SettleSummary {
            rounds: 1,
            tasks_run: 1,
            batches: 0,
            reclaimed: 0,
            failures: 0,
            exhausted: false,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        // Tasks are named after their label.
        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "elect-root");

        // Router events get their own lane.
        assert_eq!(parsed[1]["name"], "Draw");
        assert_eq!(parsed[1]["tid"], TID_ROUTER);
        assert_eq!(parsed[1]["args"]["remaining"], "/");

        // The settle spans everything before it.
        assert_eq!(parsed[2]["ph"], "X");
        assert_eq!(parsed[2]["ts"], 0);
        assert_eq!(parsed[2]["dur"], 3);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
