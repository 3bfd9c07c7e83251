// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted navigation session that exercises the tracing and diagnostics
//! pipeline.
//!
//! Builds a small app (a menu of links, a home page, a user page and a
//! not-found page), drives it through link activations and back/forward
//! navigation, and prints every runtime and router event with a
//! [`PrettyPrintSink`](tendril_debug::pretty::PrettyPrintSink). The same
//! events are recorded with a
//! [`RecorderSink`](tendril_debug::recorder::RecorderSink) and exported as a
//! Chrome trace JSON file.

use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use tendril_core::node::NodeId;
use tendril_core::trace::SharedSink;
use tendril_core::{Content, Runtime};
use tendril_router::{Link, LinkView, MemoryHistory, Params, Route, Router, RouterError};

use tendril_debug::pretty::PrettyPrintSink;
use tendril_debug::recorder::RecorderSink;
use tendril_debug::tee::Tee;

const USERS: [&str; 3] = ["1", "7", "42"];

fn main() {
    // -- sinks -------------------------------------------------------------
    let sinks = SharedSink::new(Tee::new(
        PrettyPrintSink::new(Box::new(std::io::stdout())),
        RecorderSink::new(),
    ));

    // -- runtime -----------------------------------------------------------
    let mut rt = Runtime::new();
    rt.set_trace_sink(Box::new(sinks.clone()));
    let history = Rc::new(MemoryHistory::new("/"));
    Router::install(&mut rt, history.clone());

    let root = build_app(&mut rt).expect("failed to build the app");
    rt.mount([root]);
    let report = rt.settle();
    assert!(report.is_clean(), "startup failed: {:?}", report.errors);

    // -- scripted session --------------------------------------------------
    let links = menu_links(&rt, root);
    for link in &links {
        println!("--- activate {}", rt.tree().attribute(*link, "href").unwrap_or("?"));
        Link::activate(&mut rt, *link).expect("navigation failed");
        rt.settle();
    }

    println!("--- navigate /nowhere");
    Router::navigate(&mut rt, "/nowhere").expect("navigation failed");
    rt.settle();

    while history.index() > 0 {
        println!("--- back");
        Router::back(&mut rt).expect("navigation failed");
        rt.settle();
    }
    println!("--- forward");
    Router::forward(&mut rt).expect("navigation failed");
    rt.settle();

    println!("--- final document: {:?}", rt.tree().text_content(rt.document()));

    // -- export Chrome trace -----------------------------------------------
    drop(rt);
    let path = "nav_trace.json";
    let file = File::create(path).expect("failed to create nav_trace.json");
    let mut writer = BufWriter::new(file);
    tendril_debug::chrome::export(sinks.borrow().second.as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({} history entries)", history.entries().len());
}

fn build_app(rt: &mut Runtime) -> Result<NodeId, RouterError> {
    Route::new("")
        .render(render_shell)
        .not_found(|rt, path| {
            let text = rt.text(format!("Nothing at {path}"));
            Ok(vec![rt.element("h1", [text])])
        })
        .build(rt)
}

fn render_shell(rt: &mut Runtime, _: &Params) -> Result<Content, RouterError> {
    let mut items = vec![Link::new("/").render(render_link).build(rt)?];
    for id in USERS {
        items.push(
            Link::new(format!("/users/{id}"))
                .render(render_link)
                .track_history()
                .build(rt)?,
        );
    }
    let menu = rt.element("menu", items);

    let home = Route::new("/")
        .exact()
        .render(|rt, _| {
            let text = rt.text("Home");
            Ok(vec![rt.element("h1", [text])])
        })
        .build(rt)?;
    let user = Route::new("/users/:id")
        .exact()
        .render(|rt, params| {
            let text = rt.text(format!("User {}", params["id"]));
            Ok(vec![rt.element("h1", [text])])
        })
        .build(rt)?;
    Ok(vec![menu, home, user])
}

fn render_link(rt: &mut Runtime, view: &LinkView<'_>) -> Result<Content, RouterError> {
    let label = if view.active {
        format!("[{}]", view.to)
    } else {
        view.to.to_owned()
    };
    Ok(vec![rt.text(label)])
}

/// The links in the shell's menu, in document order.
fn menu_links(rt: &Runtime, root: NodeId) -> Vec<NodeId> {
    let router = Router::get(rt).expect("router installed");
    rt.lookup_down(root, router.link_kind())
        .iter()
        .map(|link| link.node())
        .collect()
}
