//! Constructor sugar for common HTML elements.
//!
//! Each helper is `element(tag, attrs, children)` with the tag baked in.
//! Applications that need an uncommon tag call [`crate::vnode::element`]
//! directly.

use crate::attribute::Attr;
use crate::vnode::{self, VNode};

macro_rules! container {
    ($(#[$doc:meta])* $name:ident, $tag:literal) => {
        $(#[$doc])*
        #[must_use]
        pub fn $name<Msg>(attrs: Vec<Attr<Msg>>, children: Vec<VNode<Msg>>) -> VNode<Msg> {
            vnode::element($tag, attrs, children)
        }
    };
}

macro_rules! void {
    ($(#[$doc:meta])* $name:ident, $tag:literal) => {
        $(#[$doc])*
        #[must_use]
        pub fn $name<Msg>(attrs: Vec<Attr<Msg>>) -> VNode<Msg> {
            vnode::element($tag, attrs, Vec::new())
        }
    };
}

container!(div, "div");
container!(span, "span");
container!(p, "p");
container!(h1, "h1");
container!(h2, "h2");
container!(h3, "h3");
container!(ul, "ul");
container!(ol, "ol");
container!(li, "li");
container!(button, "button");
container!(label, "label");
container!(section, "section");
container!(header, "header");
container!(footer, "footer");
container!(main, "main");
container!(nav, "nav");
container!(table, "table");
container!(tbody, "tbody");
container!(tr, "tr");
container!(td, "td");
container!(form, "form");
container!(select, "select");
container!(option, "option");
container!(textarea, "textarea");

void!(input, "input");
void!(img, "img");
void!(br, "br");
void!(hr, "hr");

/// A text node; mirrors [`vnode::text`] for a one-stop import.
#[must_use]
pub fn text<Msg>(content: impl Into<String>) -> VNode<Msg> {
    vnode::text(content)
}
