// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed accessors for application state kept in the tree.
//!
//! The tree is the state: a counter *is* the text of its label, a toggle
//! *is* a class on its element, a todo list *is* the children of its
//! container. An [`Accessor`] names one such location and reads or writes it
//! as a typed value:
//!
//! | accessor | value | location |
//! |----------|-------|----------|
//! | [`TextContent`] | `String` | text of the subtree |
//! | [`IntContent`] | `Option<i64>` | text of the subtree, parsed |
//! | [`AttributeText`] | `Option<String>` | one attribute |
//! | [`AttributeFlag`] | `bool` | one attribute, on/off values |
//! | [`ClassFlag`] | `bool` | a class in the `class` list |
//! | [`StyleFlag`] | `bool` | a property in the `style` declarations |
//! | [`ErrorMessage`] | `Option<String>` | text plus `display: none` |
//!
//! [`Combined`] writes through several accessors at once, and [`ListState`]
//! tracks appended children while they stay attached.
//!
//! Writes that replace children go through the normal topology API, so the
//! nodes they drop are reclaimed like any other detached subtree.
//!
//! ```
//! use tendril_core::Runtime;
//! use tendril_core::state::{Accessor, IntContent};
//!
//! let mut rt = Runtime::new();
//! let zero = rt.text("0");
//! let label = rt.element("span", [zero]);
//! let count = IntContent::new(label);
//!
//! count.update(rt.tree_mut(), |n| n.map(|n| n + 1));
//! assert_eq!(count.get(rt.tree()), Some(1));
//! ```

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::node::{NodeId, NodeTree};

/// Reads and writes one piece of state stored in the tree.
pub trait Accessor {
    /// The typed value.
    type Value;

    /// Reads the current value.
    fn get(&self, tree: &NodeTree) -> Self::Value;

    /// Writes `value`.
    fn set(&self, tree: &mut NodeTree, value: Self::Value);

    /// Writes the value computed from the current one.
    fn update(&self, tree: &mut NodeTree, f: impl FnOnce(Self::Value) -> Self::Value)
    where
        Self: Sized,
    {
        let next = f(self.get(tree));
        self.set(tree, next);
    }
}

/// The concatenated text of a subtree.
///
/// Setting it on an element replaces every child with one text node (none
/// for the empty string). On a text node it rewrites the text in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextContent {
    node: NodeId,
}

impl TextContent {
    /// Accessor for the text of `node`.
    #[must_use]
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }
}

impl Accessor for TextContent {
    type Value = String;

    fn get(&self, tree: &NodeTree) -> String {
        tree.text_content(self.node)
    }

    fn set(&self, tree: &mut NodeTree, value: String) {
        write_text(tree, self.node, value);
    }
}

fn write_text(tree: &mut NodeTree, node: NodeId, value: String) {
    if tree.text(node).is_some() {
        tree.set_text(node, value);
    } else if value.is_empty() {
        tree.clear_children(node);
    } else {
        let text = tree.create_text(value);
        tree.replace_children(node, &[text]);
    }
}

/// The text of a subtree read as a decimal integer.
///
/// Text that does not parse (surrounding whitespace aside) reads as `None`;
/// writing `None` empties the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntContent {
    node: NodeId,
}

impl IntContent {
    /// Accessor for the number shown by `node`.
    #[must_use]
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }
}

impl Accessor for IntContent {
    type Value = Option<i64>;

    fn get(&self, tree: &NodeTree) -> Option<i64> {
        tree.text_content(self.node).trim().parse().ok()
    }

    fn set(&self, tree: &mut NodeTree, value: Option<i64>) {
        let text = value.map(|n| format!("{n}")).unwrap_or_default();
        write_text(tree, self.node, text);
    }
}

/// The value of one attribute; `None` when it is absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeText {
    node: NodeId,
    name: String,
}

impl AttributeText {
    /// Accessor for attribute `name` of `node` (an input's `value`, say).
    #[must_use]
    pub fn new(node: NodeId, name: impl Into<String>) -> Self {
        Self {
            node,
            name: name.into(),
        }
    }
}

impl Accessor for AttributeText {
    type Value = Option<String>;

    fn get(&self, tree: &NodeTree) -> Option<String> {
        tree.attribute(self.node, &self.name).map(ToString::to_string)
    }

    fn set(&self, tree: &mut NodeTree, value: Option<String>) {
        match value {
            Some(value) => {
                tree.set_attribute(self.node, self.name.as_str(), value);
            }
            None => {
                tree.remove_attribute(self.node, &self.name);
            }
        }
    }
}

/// A boolean stored as one of two attribute states.
///
/// `on` and `off` are the attribute values for `true` and `false`; `None`
/// means the attribute is absent. Reading is `true` exactly when the current
/// state equals `on`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeFlag {
    node: NodeId,
    name: String,
    on: Option<String>,
    off: Option<String>,
}

impl AttributeFlag {
    /// Accessor mapping `true`/`false` to the `on`/`off` states.
    #[must_use]
    pub fn new(
        node: NodeId,
        name: impl Into<String>,
        on: Option<String>,
        off: Option<String>,
    ) -> Self {
        Self {
            node,
            name: name.into(),
            on,
            off,
        }
    }

    /// Accessor for a presence attribute such as `checked` or `disabled`.
    #[must_use]
    pub fn presence(node: NodeId, name: impl Into<String>) -> Self {
        Self::new(node, name, Some(String::new()), None)
    }
}

impl Accessor for AttributeFlag {
    type Value = bool;

    fn get(&self, tree: &NodeTree) -> bool {
        tree.attribute(self.node, &self.name) == self.on.as_deref()
    }

    fn set(&self, tree: &mut NodeTree, value: bool) {
        let state = if value { &self.on } else { &self.off };
        match state {
            Some(v) => {
                tree.set_attribute(self.node, self.name.as_str(), v.as_str());
            }
            None => {
                tree.remove_attribute(self.node, &self.name);
            }
        }
    }
}

/// A boolean stored as a class in the element's `class` list.
///
/// Setting `true` adds `on` and removes `off`; `false` does the reverse.
/// Other classes are left alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassFlag {
    node: NodeId,
    on: String,
    off: Option<String>,
}

impl ClassFlag {
    /// Accessor toggling class `on`, with an optional class for `false`.
    #[must_use]
    pub fn new(node: NodeId, on: impl Into<String>, off: Option<String>) -> Self {
        Self {
            node,
            on: on.into(),
            off,
        }
    }
}

impl Accessor for ClassFlag {
    type Value = bool;

    fn get(&self, tree: &NodeTree) -> bool {
        tree.attribute(self.node, "class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == self.on))
    }

    fn set(&self, tree: &mut NodeTree, value: bool) {
        let (add, drop) = if value {
            (Some(self.on.as_str()), self.off.as_deref())
        } else {
            (self.off.as_deref(), Some(self.on.as_str()))
        };
        let mut classes: Vec<String> = tree
            .attribute(self.node, "class")
            .map(|list| list.split_whitespace().map(ToString::to_string).collect())
            .unwrap_or_default();
        if let Some(drop) = drop {
            classes.retain(|c| c != drop);
        }
        if let Some(add) = add
            && !classes.iter().any(|c| c == add)
        {
            classes.push(add.to_string());
        }
        if classes.is_empty() {
            tree.remove_attribute(self.node, "class");
        } else {
            tree.set_attribute(self.node, "class", classes.join(" "));
        }
    }
}

/// Returns the value of `property` in the element's `style` declarations.
#[must_use]
pub fn style_property(tree: &NodeTree, node: NodeId, property: &str) -> Option<String> {
    declarations(tree, node)
        .into_iter()
        .find(|(name, _)| name == property)
        .map(|(_, value)| value)
}

/// Sets (`Some`) or removes (`None`) `property` in the element's `style`
/// declarations, keeping the order of the others.
pub fn set_style_property(
    tree: &mut NodeTree,
    node: NodeId,
    property: &str,
    value: Option<&str>,
) {
    let mut decls = declarations(tree, node);
    match (decls.iter().position(|(name, _)| name == property), value) {
        (Some(pos), Some(value)) => decls[pos].1 = value.to_string(),
        (Some(pos), None) => {
            decls.remove(pos);
        }
        (None, Some(value)) => decls.push((property.to_string(), value.to_string())),
        (None, None) => return,
    }
    if decls.is_empty() {
        tree.remove_attribute(node, "style");
    } else {
        let text: Vec<String> = decls
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect();
        tree.set_attribute(node, "style", text.join("; "));
    }
}

fn declarations(tree: &NodeTree, node: NodeId) -> Vec<(String, String)> {
    let Some(style) = tree.attribute(node, "style") else {
        return Vec::new();
    };
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// A boolean stored as a style property.
///
/// `on` and `off` are the property values for `true` and `false`; `None`
/// removes the property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleFlag {
    node: NodeId,
    property: String,
    on: Option<String>,
    off: Option<String>,
}

impl StyleFlag {
    /// Accessor mapping `true`/`false` to the `on`/`off` property values.
    #[must_use]
    pub fn new(
        node: NodeId,
        property: impl Into<String>,
        on: Option<String>,
        off: Option<String>,
    ) -> Self {
        Self {
            node,
            property: property.into(),
            on,
            off,
        }
    }
}

impl Accessor for StyleFlag {
    type Value = bool;

    fn get(&self, tree: &NodeTree) -> bool {
        style_property(tree, self.node, &self.property) == self.on
    }

    fn set(&self, tree: &mut NodeTree, value: bool) {
        let state = if value { &self.on } else { &self.off };
        set_style_property(tree, self.node, &self.property, state.as_deref());
    }
}

/// An error slot: shows its text while set, hidden with `display: none`
/// while clear.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorMessage {
    node: NodeId,
}

impl ErrorMessage {
    /// Accessor for the error element `node`.
    #[must_use]
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }
}

impl Accessor for ErrorMessage {
    type Value = Option<String>;

    fn get(&self, tree: &NodeTree) -> Option<String> {
        if style_property(tree, self.node, "display").as_deref() == Some("none") {
            None
        } else {
            Some(tree.text_content(self.node))
        }
    }

    fn set(&self, tree: &mut NodeTree, value: Option<String>) {
        match value.filter(|msg| !msg.is_empty()) {
            Some(msg) => {
                write_text(tree, self.node, msg);
                set_style_property(tree, self.node, "display", None);
            }
            None => {
                write_text(tree, self.node, String::new());
                set_style_property(tree, self.node, "display", Some("none"));
            }
        }
    }
}

/// Two accessors for the same value: reads the first, writes both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Combined<A, B> {
    /// The accessor that is read.
    pub first: A,
    /// Written after `first`.
    pub second: B,
}

impl<A, B> Combined<A, B> {
    /// Combines `first` and `second`.
    #[must_use]
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A, B> Accessor for Combined<A, B>
where
    A: Accessor,
    A::Value: Clone,
    B: Accessor<Value = A::Value>,
{
    type Value = A::Value;

    fn get(&self, tree: &NodeTree) -> A::Value {
        self.first.get(tree)
    }

    fn set(&self, tree: &mut NodeTree, value: A::Value) {
        self.first.set(tree, value.clone());
        self.second.set(tree, value);
    }
}

/// Items appended to a container, for as long as they stay attached.
///
/// Items are reported in the order they were added. Moving an item (a
/// reorder, or a move to another parent) keeps it; detaching it drops it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListState {
    container: NodeId,
    items: Vec<NodeId>,
}

impl ListState {
    /// Starts an empty list over `container`.
    #[must_use]
    pub fn new(container: NodeId) -> Self {
        Self {
            container,
            items: Vec::new(),
        }
    }

    /// The element items are appended to.
    #[must_use]
    pub fn container(&self) -> NodeId {
        self.container
    }

    /// Appends detached `item` to the container and starts tracking it.
    ///
    /// # Panics
    ///
    /// Panics if `item` is stale or already has a parent.
    pub fn push(&mut self, tree: &mut NodeTree, item: NodeId) {
        tree.append_child(self.container, item);
        self.items.push(item);
    }

    /// Tracked items that are alive and attached.
    #[must_use]
    pub fn items(&self, tree: &NodeTree) -> Vec<NodeId> {
        self.items
            .iter()
            .copied()
            .filter(|&n| tree.is_alive(n) && tree.parent(n).is_some())
            .collect()
    }

    /// Stops tracking destroyed items.
    pub fn forget_destroyed(&mut self, tree: &NodeTree) {
        self.items.retain(|&n| tree.is_alive(n));
    }
}
