//! A minimal virtual DOM: describe UI as [`VNode`] trees, [`mount`] them onto a [`Platform`]
//! and [`patch`] the result against successor trees, reusing platform nodes where kind, tag and children arity allow.
//!
//! [`Renderer`] remembers what each container shows, so repeated [`Renderer::render`] calls mount, patch or tear down as needed.
//!
//! Two platforms ship with this crate: the headless [`memory::MemoryDocument`] and the browser-backed [`web::WebPlatform`].

#![doc(html_root_url = "https://docs.rs/twig-dom/0.0.1")]
#![warn(clippy::pedantic)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod attributes;
mod component;
mod error;
pub mod flags;
mod logging;
pub mod memory;
mod mount;
mod patch;
mod platform;
mod rc_hash_map;
mod render;
mod vnode;
pub mod web;

pub use attributes::{apply_prop, normalize_class};
pub use component::{Component, ComponentTag, FunctionalTag, Lifecycle, Updater};
pub use error::Error;
pub use flags::{ChildrenFlags, VNodeFlags, VNodeKind};
pub use mount::mount;
pub use patch::patch;
pub use platform::Platform;
pub use render::Renderer;
pub use vnode::{create_element, create_text_vnode, Children, ChildrenInput, Listener, PortalTarget, PropValue, Props, Tag, VNode};
