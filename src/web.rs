//! A [`Platform`] onto the browser DOM through [`web_sys`].

use crate::{logging::Content, rc_hash_map::RcHashMap, Error, Listener, Platform, PropValue};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use js_sys::{Array, Function, Object, Reflect};
use std::rc::Rc;
use tracing::{trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{CssStyleDeclaration, Document, Element, Event, Node};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

type ListenerClosures = RcHashMap<usize, u16, Closure<dyn Fn(Event)>>;

/// Materializes vnodes as DOM nodes of one [`Document`].
///
/// Each [`Listener`] is wrapped in exactly one JS closure, shared by all nodes it's bound on
/// and released once the last binding is removed.
#[derive(Clone)]
pub struct WebPlatform {
	document: Document,
	closures: Rc<RefCell<ListenerClosures>>,
}

impl WebPlatform {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self {
			document,
			closures: Rc::default(),
		}
	}

	/// The current window's document.
	///
	/// # Errors
	///
	/// Iff there is no window or it has no document.
	pub fn from_window() -> Result<Self, Error> {
		web_sys::window()
			.and_then(|window| window.document())
			.map(Self::new)
			.ok_or_else(|| Error::Platform("no window document".to_owned()))
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	/// How many distinct listeners currently have a live JS closure.
	#[must_use]
	pub fn live_listener_count(&self) -> usize {
		self.closures.borrow().len()
	}
}

impl Debug for WebPlatform {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebPlatform").field("closures", &*self.closures.borrow()).finish()
	}
}

#[allow(clippy::needless_pass_by_value)]
fn js_error(error: JsValue) -> Error {
	Error::Platform(format!("{:?}", error))
}

fn element(node: &Node) -> Result<&Element, Error> {
	node.dyn_ref::<Element>().ok_or_else(|| Error::Platform(format!("{:?} is not an element", node)))
}

fn style(node: &Node) -> Result<CssStyleDeclaration, Error> {
	Reflect::get(node, &JsValue::from_str("style"))
		.map_err(js_error)?
		.dyn_into::<CssStyleDeclaration>()
		.map_err(|_| Error::Platform(format!("{:?} has no style declaration", node)))
}

fn to_js(value: &PropValue<WebPlatform>) -> Result<JsValue, Error> {
	Ok(match value {
		PropValue::Null => JsValue::NULL,
		PropValue::Bool(b) => JsValue::from_bool(*b),
		PropValue::Number(n) => JsValue::from_f64(*n),
		PropValue::Str(s) => JsValue::from_str(s),
		PropValue::List(items) => {
			let array = Array::new();
			for item in items {
				array.push(&to_js(item)?);
			}
			array.into()
		}
		PropValue::Map(entries) => {
			let object = Object::new();
			for (key, value) in entries {
				Reflect::set(&object, &JsValue::from_str(key), &to_js(value)?).map_err(js_error)?;
			}
			object.into()
		}
		PropValue::Listener(listener) => {
			warn!("Listener {:?} assigned as a plain property. Use an `on*` prop instead.", listener);
			JsValue::UNDEFINED
		}
		PropValue::Node(node) => JsValue::from(node.clone()),
	})
}

impl Platform for WebPlatform {
	type Node = Node;
	type Event = Event;

	fn create_element(&self, tag: &str, svg: bool) -> Result<Node, Error> {
		let element = if svg {
			self.document.create_element_ns(Some(SVG_NAMESPACE), tag)
		} else {
			self.document.create_element(tag)
		}
		.map_err(js_error)?;
		Ok(element.into())
	}

	fn create_text_node(&self, text: &str) -> Result<Node, Error> {
		Ok(self.document.create_text_node(text).into())
	}

	fn append_child(&self, parent: &Node, child: &Node) -> Result<(), Error> {
		parent.append_child(child).map(drop).map_err(js_error)
	}

	fn remove_child(&self, parent: &Node, child: &Node) -> Result<(), Error> {
		parent.remove_child(child).map(drop).map_err(js_error)
	}

	fn set_attribute(&self, node: &Node, name: &str, value: &str) -> Result<(), Error> {
		element(node)?.set_attribute(name, value).map_err(js_error)
	}

	fn remove_attribute(&self, node: &Node, name: &str) -> Result<(), Error> {
		element(node)?.remove_attribute(name).map_err(js_error)
	}

	fn set_property(&self, node: &Node, name: &str, value: &PropValue<Self>) -> Result<(), Error> {
		Reflect::set(node, &JsValue::from_str(name), &to_js(value)?).map(drop).map_err(js_error)
	}

	/// Assigns `null`, which most reflected properties treat as their default.
	fn remove_property(&self, node: &Node, name: &str) -> Result<(), Error> {
		Reflect::set(node, &JsValue::from_str(name), &JsValue::NULL).map(drop).map_err(js_error)
	}

	fn set_style(&self, node: &Node, name: &str, value: &str) -> Result<(), Error> {
		style(node)?.set_property(name, value).map_err(js_error)
	}

	fn remove_style(&self, node: &Node, name: &str) -> Result<(), Error> {
		style(node)?.remove_property(name).map(drop).map_err(js_error)
	}

	fn add_event_listener(&self, node: &Node, event: &str, listener: &Listener<Self>) -> Result<(), Error> {
		let mut closures = self.closures.borrow_mut();
		let closure = closures
			.increment_or_insert_with(listener.address(), || {
				trace!(?listener, "Creating closure.");
				let listener = listener.clone();
				Closure::wrap(Box::new(move |event: Event| listener.call(&event)) as Box<dyn Fn(Event)>)
			})
			.map_err(|_| Error::Platform(format!("listener {:?} bound too often", listener)))?;
		node.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref::<Function>())
			.map_err(js_error)
	}

	fn remove_event_listener(&self, node: &Node, event: &str, listener: &Listener<Self>) -> Result<(), Error> {
		let mut closures = self.closures.borrow_mut();
		let result = match closures.get(&listener.address()) {
			Some(closure) => node
				.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref::<Function>())
				.map_err(js_error),
			None => Err(Error::Platform(format!("listener {:?} is not bound", listener))),
		};
		closures
			.weak_decrement(&listener.address())
			.map_err(|_| Error::Platform(format!("listener {:?} unbound too often", listener)))?;
		let released = closures.drain_weak();
		if released > 0 {
			trace!(released, "Released closures.");
		}
		result
	}

	fn set_text(&self, node: &Node, text: &str) -> Result<(), Error> {
		node.set_node_value(Some(text));
		Ok(())
	}

	fn query_selector(&self, selector: &str) -> Result<Option<Node>, Error> {
		trace!(selector = ?Content(selector), "Querying.");
		self.document
			.query_selector(selector)
			.map(|element| element.map(Into::into))
			.map_err(js_error)
	}
}
