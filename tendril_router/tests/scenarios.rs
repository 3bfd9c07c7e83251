// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end navigation scenarios.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tendril_core::Runtime;
use tendril_core::node::NodeId;
use tendril_router::{History, Link, MemoryHistory, Route, RouteState, Router, RouterError};

fn setup(path: &str) -> (Runtime, Rc<MemoryHistory>) {
    let mut rt = Runtime::new();
    let history = Rc::new(MemoryHistory::new(path));
    Router::install(&mut rt, history.clone());
    (rt, history)
}

fn state_of(rt: &Runtime, head: NodeId) -> RouteState {
    let router = Router::get(rt).unwrap();
    rt.provided(head, router.route_kind()).unwrap().state()
}

/// An app with a home page and a user page. The root renders both child
/// routes fresh whenever it re-renders, so the handles live in cells.
struct App {
    root: NodeId,
    home: Rc<Cell<Option<NodeId>>>,
    users: Rc<Cell<Option<NodeId>>>,
    user_renders: Rc<RefCell<Vec<String>>>,
    link_to_7: Rc<Cell<Option<NodeId>>>,
}

impl App {
    fn home(&self) -> NodeId {
        self.home.get().unwrap()
    }

    fn users(&self) -> NodeId {
        self.users.get().unwrap()
    }
}

fn build_app(rt: &mut Runtime) -> App {
    let home_slot = Rc::new(Cell::new(None));
    let users_slot = Rc::new(Cell::new(None));
    let user_renders = Rc::new(RefCell::new(Vec::new()));
    let link_to_7 = Rc::new(Cell::new(None));

    let (home_cell, users_cell) = (Rc::clone(&home_slot), Rc::clone(&users_slot));
    let (log, link_cell) = (Rc::clone(&user_renders), Rc::clone(&link_to_7));
    let root = Route::new("")
        .render(move |rt, _| {
            let slot = Rc::clone(&link_cell);
            let home = Route::new("/")
                .exact()
                .render(move |rt, _| {
                    let link = Link::new("/users/7").track_history().build(rt)?;
                    slot.set(Some(link));
                    Ok(vec![rt.element("nav", [link])])
                })
                .build(rt)?;
            let log = Rc::clone(&log);
            let users = Route::new("/users/:id")
                .exact()
                .render(move |rt, params| {
                    let id = params["id"].clone();
                    log.borrow_mut().push(id.clone());
                    Ok(vec![rt.text(format!("user {id}"))])
                })
                .build(rt)?;
            home_cell.set(Some(home));
            users_cell.set(Some(users));
            Ok(vec![home, users])
        })
        .not_found(|rt, path| Ok(vec![rt.text(format!("404 {path}"))]))
        .build(rt)
        .unwrap();

    App {
        root,
        home: home_slot,
        users: users_slot,
        user_renders,
        link_to_7,
    }
}

#[test]
fn link_then_back_restores_home() {
    let (mut rt, history) = setup("/");
    let app = build_app(&mut rt);
    rt.mount([app.root]);
    let report = rt.settle();
    assert!(report.is_clean(), "{:?}", report.errors);

    assert_eq!(state_of(&rt, app.home()), RouteState::Idle);
    assert_eq!(state_of(&rt, app.users()), RouteState::Unmounted);
    // The root's pop listener plus the home link's.
    let baseline = history.listener_count();
    assert_eq!(baseline, 2);

    let link = app.link_to_7.get().unwrap();
    Link::activate(&mut rt, link).unwrap();
    assert_eq!(history.current_path(), "/users/7");
    assert_eq!(state_of(&rt, app.users()), RouteState::Idle);
    assert_eq!(state_of(&rt, app.home()), RouteState::Unmounted);
    assert_eq!(rt.tree().text_content(app.users()), "user 7");
    assert_eq!(*app.user_renders.borrow(), ["7"]);
    // Clearing home dropped the link's subscription right away.
    assert_eq!(history.listener_count(), baseline - 1);

    rt.settle();
    assert!(!rt.tree().is_alive(link), "the cleared link is reclaimed");

    assert!(Router::back(&mut rt).unwrap());
    assert_eq!(history.current_path(), "/");
    assert_eq!(state_of(&rt, app.home()), RouteState::Idle);
    assert_eq!(state_of(&rt, app.users()), RouteState::Unmounted);
    assert_eq!(rt.tree().text_content(app.users()), "");

    // Home rendered a fresh link, which subscribed again.
    rt.settle();
    assert_eq!(history.listener_count(), baseline);
    assert_ne!(app.link_to_7.get(), Some(link));
}

#[test]
fn forward_redraws_the_user_page_with_same_params_once() {
    let (mut rt, _) = setup("/");
    let app = build_app(&mut rt);
    rt.mount([app.root]);
    rt.settle();

    Router::navigate(&mut rt, "/users/7").unwrap();
    Router::back(&mut rt).unwrap();
    Router::forward(&mut rt).unwrap();
    assert_eq!(state_of(&rt, app.users()), RouteState::Idle);
    // Cleared in between, so the second visit renders again.
    assert_eq!(*app.user_renders.borrow(), ["7", "7"]);
}

#[test]
fn unknown_path_shows_not_found_and_recovers() {
    let (mut rt, history) = setup("/");
    let app = build_app(&mut rt);
    rt.mount([app.root]);
    rt.settle();

    Router::navigate(&mut rt, "/nowhere").unwrap();
    assert_eq!(history.current_path(), "/nowhere");
    assert_eq!(state_of(&rt, app.root), RouteState::NotFound);
    assert_eq!(rt.tree().text_content(app.root), "404 /nowhere");
    let old_home = app.home();
    let report = rt.settle();
    assert!(!rt.tree().is_alive(old_home), "replaced content is destroyed");
    assert!(report.is_clean(), "{:?}", report.errors);

    Router::back(&mut rt).unwrap();
    assert_eq!(state_of(&rt, app.root), RouteState::Idle);
    assert_eq!(state_of(&rt, app.home()), RouteState::Idle);
    assert_ne!(app.home(), old_home, "the root rendered a fresh home route");
}

#[test]
fn reusing_destroyed_content_is_reported() {
    let (mut rt, _) = setup("/users/7");
    let users = Route::new("/users/:id")
        .exact()
        .render(|rt, params| Ok(vec![rt.text(format!("user {}", params["id"]))]))
        .build(&mut rt)
        .unwrap();
    let app = Route::new("")
        .render(move |_, _| Ok(vec![users]))
        .not_found(|rt, path| Ok(vec![rt.text(format!("404 {path}"))]))
        .build(&mut rt)
        .unwrap();
    rt.mount([app]);
    rt.settle();
    assert_eq!(rt.tree().text_content(app), "user 7");

    Router::navigate(&mut rt, "/nowhere").unwrap();
    rt.settle();
    assert!(!rt.tree().is_alive(users));

    let err = Router::back(&mut rt).unwrap_err();
    assert!(matches!(err, RouterError::StaleContent(n) if n == users));
}

#[test]
fn every_link_to_the_current_path_is_active() {
    let (mut rt, _) = setup("/");
    let built = Rc::new(RefCell::new(Vec::new()));
    let slots = Rc::clone(&built);
    let root = Route::new("")
        .render(move |rt, _| {
            let links = vec![
                Link::new("/a").build(rt)?,
                Link::new("/a").build(rt)?,
                Link::new("/b").build(rt)?,
            ];
            slots.replace(links.clone());
            let menu = rt.element("menu", links);
            let page = Route::new("/a").exact().build(rt)?;
            Ok(vec![menu, page])
        })
        .build(&mut rt)
        .unwrap();
    rt.mount([root]);
    rt.settle();
    let links = built.borrow().clone();
    let [a1, a2, b] = links[..] else {
        panic!("the root renders three links");
    };

    Link::activate(&mut rt, a1).unwrap();
    let active: Vec<bool> = [a1, a2, b]
        .iter()
        .map(|&n| rt.tree().attribute(n, "aria-current").is_some())
        .collect();
    assert_eq!(active, [true, true, false]);

    Link::activate(&mut rt, b).unwrap();
    let active: Vec<bool> = [a1, a2, b]
        .iter()
        .map(|&n| rt.tree().attribute(n, "aria-current").is_some())
        .collect();
    assert_eq!(active, [false, false, true]);
}

#[test]
fn wrapper_elements_do_not_hide_child_routes() {
    let (mut rt, _) = setup("/docs/intro");
    let intro = Route::new("/intro")
        .exact()
        .render(|rt, _| Ok(vec![rt.text("intro")]))
        .build(&mut rt)
        .unwrap();
    let docs = Route::new("/docs")
        .render(move |rt, _| {
            let section = rt.element("section", [intro]);
            let main = rt.element("main", [section]);
            Ok(vec![main])
        })
        .build(&mut rt)
        .unwrap();
    let root = Route::new("")
        .render(move |rt, _| Ok(vec![rt.element("div", [docs])]))
        .build(&mut rt)
        .unwrap();
    rt.mount([root]);
    let report = rt.settle();
    assert!(report.is_clean(), "{:?}", report.errors);

    assert_eq!(state_of(&rt, docs), RouteState::Idle);
    assert_eq!(state_of(&rt, intro), RouteState::Idle);
    assert_eq!(rt.tree().text_content(root), "intro");
}

#[test]
fn moving_a_route_keeps_its_capability() {
    let (mut rt, history) = setup("/");
    let root = Route::new("").build(&mut rt).unwrap();
    let left = rt.element("left", [root]);
    let right = rt.element("right", []);
    rt.mount([left, right]);
    rt.settle();
    assert_eq!(history.listener_count(), 1);

    rt.tree_mut().reparent(root, right);
    let report = rt.settle();
    assert_eq!(report.reclaimed, 0, "a move is not a delete");
    assert_eq!(history.listener_count(), 1);
    let router = Router::get(&rt).unwrap();
    assert!(rt.provided(root, router.route_kind()).is_some());
}

#[test]
fn render_errors_surface_from_navigation() {
    #[derive(Debug)]
    struct Broken;
    impl std::fmt::Display for Broken {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("broken page")
        }
    }
    impl std::error::Error for Broken {}

    let (mut rt, _) = setup("/");
    let bad = Route::new("/bad")
        .render(|_, _| Err(RouterError::render(Broken)))
        .build(&mut rt)
        .unwrap();
    let root = Route::new("")
        .render(move |_, _| Ok(vec![bad]))
        .build(&mut rt)
        .unwrap();
    rt.mount([root]);
    rt.settle();

    let err = Router::navigate(&mut rt, "/bad").unwrap_err();
    assert!(matches!(err, RouterError::Render(_)));
    assert_eq!(err.to_string(), "render failed: broken page");
}
