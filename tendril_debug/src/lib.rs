// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for tendril
//! diagnostics.
//!
//! This crate provides [`TraceSink`](tendril_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//! - [`tee::Tee`]: feeds every event to two sinks.
//!
//! A runtime owns its sink, so wrap a sink you want to read back later in a
//! [`SharedSink`](tendril_core::trace::SharedSink).

pub mod chrome;
pub mod pretty;
pub mod recorder;
pub mod tee;
