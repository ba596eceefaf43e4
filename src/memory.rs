//! A headless in-memory [`Platform`], for tests and non-browser hosts.
//!
//! Every mutation the engine performs is recorded as a [`Mutation`],
//! so callers can assert exactly which platform operations a render caused.

use crate::{logging::Content, Error, Listener, Platform, PropValue};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::trace;

/// Identifies a node of one [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Passed to listeners by [`MemoryDocument::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEvent {
	pub name: String,
	pub target: NodeId,
}

/// One recorded platform operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
	CreateElement { node: NodeId, tag: String, svg: bool },
	CreateText { node: NodeId, text: String },
	AppendChild { parent: NodeId, child: NodeId },
	RemoveChild { parent: NodeId, child: NodeId },
	SetAttribute { node: NodeId, name: String, value: String },
	RemoveAttribute { node: NodeId, name: String },
	SetProperty { node: NodeId, name: String },
	RemoveProperty { node: NodeId, name: String },
	SetStyle { node: NodeId, name: String, value: String },
	RemoveStyle { node: NodeId, name: String },
	AddEventListener { node: NodeId, event: String },
	RemoveEventListener { node: NodeId, event: String },
	SetText { node: NodeId, text: String },
}

enum NodeData {
	Element {
		tag: String,
		svg: bool,
		attributes: HashMap<String, String>,
		properties: HashMap<String, PropValue<MemoryDocument>>,
		styles: HashMap<String, String>,
		listeners: Vec<(String, Listener<MemoryDocument>)>,
	},
	Text(String),
}

struct Node {
	data: NodeData,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

struct Arena {
	nodes: Vec<Node>,
	body: NodeId,
	mutations: Vec<Mutation>,
}

impl Arena {
	fn node(&self, id: NodeId) -> Result<&Node, Error> {
		self.nodes.get(id.0).ok_or_else(|| Error::Platform(format!("unknown node {:?}", id)))
	}

	fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, Error> {
		self.nodes.get_mut(id.0).ok_or_else(|| Error::Platform(format!("unknown node {:?}", id)))
	}

	fn element_mut(&mut self, id: NodeId) -> Result<ElementMut<'_>, Error> {
		match &mut self.node_mut(id)?.data {
			NodeData::Element {
				attributes,
				properties,
				styles,
				listeners,
				..
			} => Ok(ElementMut {
				attributes,
				properties,
				styles,
				listeners,
			}),
			NodeData::Text(_) => Err(Error::Platform(format!("{:?} is not an element", id))),
		}
	}

	fn push(&mut self, data: NodeData) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(Node {
			data,
			parent: None,
			children: Vec::new(),
		});
		id
	}

	fn detach(&mut self, child: NodeId) -> Result<(), Error> {
		if let Some(parent) = self.node_mut(child)?.parent.take() {
			self.node_mut(parent)?.children.retain(|&sibling| sibling != child);
		}
		Ok(())
	}

	fn find(&self, root: NodeId, matches: &dyn Fn(&Node) -> bool) -> Option<NodeId> {
		let node = self.nodes.get(root.0)?;
		for &child in &node.children {
			if self.nodes.get(child.0).map_or(false, |child| matches(child)) {
				return Some(child);
			}
			if let Some(found) = self.find(child, matches) {
				return Some(found);
			}
		}
		None
	}

	fn write_markup(&self, id: NodeId, out: &mut String) {
		let node = match self.nodes.get(id.0) {
			Some(node) => node,
			None => return,
		};
		match &node.data {
			NodeData::Text(text) => out.push_str(text),
			NodeData::Element { tag, attributes, .. } => {
				out.push('<');
				out.push_str(tag);
				let mut attributes: Vec<_> = attributes.iter().collect();
				attributes.sort();
				for (name, value) in attributes {
					out.push_str(&format!(" {}=\"{}\"", name, value));
				}
				out.push('>');
				for &child in &node.children {
					self.write_markup(child, out);
				}
				out.push_str("</");
				out.push_str(tag);
				out.push('>');
			}
		}
	}
}

struct ElementMut<'a> {
	attributes: &'a mut HashMap<String, String>,
	properties: &'a mut HashMap<String, PropValue<MemoryDocument>>,
	styles: &'a mut HashMap<String, String>,
	listeners: &'a mut Vec<(String, Listener<MemoryDocument>)>,
}

/// A shared in-memory node tree with a `<body>` root.
///
/// Nodes are never reclaimed: removed nodes stay addressable by their [`NodeId`] and ids are not reused,
/// so the document grows with every mount. Meant for tests and short-lived hosts.
#[derive(Clone)]
pub struct MemoryDocument(Rc<RefCell<Arena>>);

impl MemoryDocument {
	#[must_use]
	pub fn new() -> Self {
		let mut arena = Arena {
			nodes: Vec::new(),
			body: NodeId(0),
			mutations: Vec::new(),
		};
		arena.body = arena.push(NodeData::Element {
			tag: "body".to_owned(),
			svg: false,
			attributes: HashMap::new(),
			properties: HashMap::new(),
			styles: HashMap::new(),
			listeners: Vec::new(),
		});
		Self(Rc::new(RefCell::new(arena)))
	}

	/// The root that [`Platform::query_selector`] searches.
	#[must_use]
	pub fn body(&self) -> NodeId {
		self.0.borrow().body
	}

	/// Creates an element and appends it to `parent` without recording either step.
	///
	/// # Errors
	///
	/// Iff `parent` is not an element of this document.
	pub fn create_container(&self, parent: NodeId, tag: &str) -> Result<NodeId, Error> {
		let mut arena = self.0.borrow_mut();
		if let NodeData::Text(_) = arena.node(parent)?.data {
			return Err(Error::Platform(format!("{:?} is not an element", parent)));
		}
		let container = arena.push(NodeData::Element {
			tag: tag.to_owned(),
			svg: false,
			attributes: HashMap::new(),
			properties: HashMap::new(),
			styles: HashMap::new(),
			listeners: Vec::new(),
		});
		arena.node_mut(container)?.parent = Some(parent);
		arena.node_mut(parent)?.children.push(container);
		Ok(container)
	}

	#[must_use]
	pub fn mutations(&self) -> Vec<Mutation> {
		self.0.borrow().mutations.clone()
	}

	pub fn clear_mutations(&self) {
		self.0.borrow_mut().mutations.clear()
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> Vec<NodeId> {
		self.0.borrow().nodes.get(node.0).map(|node| node.children.clone()).unwrap_or_default()
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.0.borrow().nodes.get(node.0).and_then(|node| node.parent)
	}

	#[must_use]
	pub fn tag_name(&self, node: NodeId) -> Option<String> {
		match &self.0.borrow().nodes.get(node.0)?.data {
			NodeData::Element { tag, .. } => Some(tag.clone()),
			NodeData::Text(_) => None,
		}
	}

	#[must_use]
	pub fn is_svg(&self, node: NodeId) -> bool {
		matches!(self.0.borrow().nodes.get(node.0).map(|node| &node.data), Some(NodeData::Element { svg: true, .. }))
	}

	/// The content of a text node.
	#[must_use]
	pub fn text(&self, node: NodeId) -> Option<String> {
		match &self.0.borrow().nodes.get(node.0)?.data {
			NodeData::Text(text) => Some(text.clone()),
			NodeData::Element { .. } => None,
		}
	}

	#[must_use]
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
		match &self.0.borrow().nodes.get(node.0)?.data {
			NodeData::Element { attributes, .. } => attributes.get(name).cloned(),
			NodeData::Text(_) => None,
		}
	}

	#[must_use]
	pub fn property(&self, node: NodeId, name: &str) -> Option<PropValue<Self>> {
		match &self.0.borrow().nodes.get(node.0)?.data {
			NodeData::Element { properties, .. } => properties.get(name).cloned(),
			NodeData::Text(_) => None,
		}
	}

	#[must_use]
	pub fn style(&self, node: NodeId, name: &str) -> Option<String> {
		match &self.0.borrow().nodes.get(node.0)?.data {
			NodeData::Element { styles, .. } => styles.get(name).cloned(),
			NodeData::Text(_) => None,
		}
	}

	#[must_use]
	pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
		match self.0.borrow().nodes.get(node.0).map(|node| &node.data) {
			Some(NodeData::Element { listeners, .. }) => listeners.iter().filter(|(bound, _)| bound == event).count(),
			_ => 0,
		}
	}

	/// Calls every listener bound to `event` on `node`, returning how many ran.
	///
	/// The document is not borrowed while listeners run, so they may trigger renders.
	pub fn dispatch(&self, node: NodeId, event: &str) -> usize {
		let listeners: Vec<_> = match self.0.borrow().nodes.get(node.0).map(|node| &node.data) {
			Some(NodeData::Element { listeners, .. }) => listeners.iter().filter(|(bound, _)| bound == event).map(|(_, listener)| listener.clone()).collect(),
			_ => Vec::new(),
		};
		let event = MemoryEvent {
			name: event.to_owned(),
			target: node,
		};
		for listener in &listeners {
			listener.call(&event);
		}
		listeners.len()
	}

	/// Serializes `node` and its subtree as markup, with attributes sorted by name.
	#[must_use]
	pub fn to_markup(&self, node: NodeId) -> String {
		let mut markup = String::new();
		self.0.borrow().write_markup(node, &mut markup);
		markup
	}

	/// Serializes the children of `node`.
	#[must_use]
	pub fn inner_markup(&self, node: NodeId) -> String {
		let arena = self.0.borrow();
		let mut markup = String::new();
		if let Some(node) = arena.nodes.get(node.0) {
			for &child in &node.children {
				arena.write_markup(child, &mut markup);
			}
		}
		markup
	}

	fn record(&self, mutation: Mutation) {
		trace!(?mutation, "Recorded.");
		self.0.borrow_mut().mutations.push(mutation)
	}
}

impl Default for MemoryDocument {
	fn default() -> Self {
		Self::new()
	}
}

impl Debug for MemoryDocument {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let arena = self.0.borrow();
		f.debug_struct("MemoryDocument").field("nodes", &arena.nodes.len()).field("mutations", &arena.mutations.len()).finish()
	}
}

impl Platform for MemoryDocument {
	type Node = NodeId;
	type Event = MemoryEvent;

	fn create_element(&self, tag: &str, svg: bool) -> Result<NodeId, Error> {
		let node = self.0.borrow_mut().push(NodeData::Element {
			tag: tag.to_owned(),
			svg,
			attributes: HashMap::new(),
			properties: HashMap::new(),
			styles: HashMap::new(),
			listeners: Vec::new(),
		});
		self.record(Mutation::CreateElement {
			node,
			tag: tag.to_owned(),
			svg,
		});
		Ok(node)
	}

	fn create_text_node(&self, text: &str) -> Result<NodeId, Error> {
		let node = self.0.borrow_mut().push(NodeData::Text(text.to_owned()));
		self.record(Mutation::CreateText { node, text: text.to_owned() });
		Ok(node)
	}

	fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), Error> {
		{
			let mut arena = self.0.borrow_mut();
			if let NodeData::Text(_) = arena.node(*parent)?.data {
				return Err(Error::Platform(format!("cannot append to text node {:?}", parent)));
			}
			arena.detach(*child)?;
			arena.node_mut(*child)?.parent = Some(*parent);
			arena.node_mut(*parent)?.children.push(*child);
		}
		self.record(Mutation::AppendChild { parent: *parent, child: *child });
		Ok(())
	}

	fn remove_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), Error> {
		{
			let mut arena = self.0.borrow_mut();
			if arena.node(*child)?.parent != Some(*parent) {
				return Err(Error::Platform(format!("{:?} is not a child of {:?}", child, parent)));
			}
			arena.detach(*child)?;
		}
		self.record(Mutation::RemoveChild { parent: *parent, child: *child });
		Ok(())
	}

	fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), Error> {
		self.0.borrow_mut().element_mut(*node)?.attributes.insert(name.to_owned(), value.to_owned());
		self.record(Mutation::SetAttribute {
			node: *node,
			name: name.to_owned(),
			value: value.to_owned(),
		});
		Ok(())
	}

	fn remove_attribute(&self, node: &NodeId, name: &str) -> Result<(), Error> {
		self.0.borrow_mut().element_mut(*node)?.attributes.remove(name);
		self.record(Mutation::RemoveAttribute { node: *node, name: name.to_owned() });
		Ok(())
	}

	fn set_property(&self, node: &NodeId, name: &str, value: &PropValue<Self>) -> Result<(), Error> {
		self.0.borrow_mut().element_mut(*node)?.properties.insert(name.to_owned(), value.clone());
		self.record(Mutation::SetProperty { node: *node, name: name.to_owned() });
		Ok(())
	}

	fn remove_property(&self, node: &NodeId, name: &str) -> Result<(), Error> {
		self.0.borrow_mut().element_mut(*node)?.properties.remove(name);
		self.record(Mutation::RemoveProperty { node: *node, name: name.to_owned() });
		Ok(())
	}

	fn set_style(&self, node: &NodeId, name: &str, value: &str) -> Result<(), Error> {
		self.0.borrow_mut().element_mut(*node)?.styles.insert(name.to_owned(), value.to_owned());
		self.record(Mutation::SetStyle {
			node: *node,
			name: name.to_owned(),
			value: value.to_owned(),
		});
		Ok(())
	}

	fn remove_style(&self, node: &NodeId, name: &str) -> Result<(), Error> {
		self.0.borrow_mut().element_mut(*node)?.styles.remove(name);
		self.record(Mutation::RemoveStyle { node: *node, name: name.to_owned() });
		Ok(())
	}

	fn add_event_listener(&self, node: &NodeId, event: &str, listener: &Listener<Self>) -> Result<(), Error> {
		self.0.borrow_mut().element_mut(*node)?.listeners.push((event.to_owned(), listener.clone()));
		self.record(Mutation::AddEventListener { node: *node, event: event.to_owned() });
		Ok(())
	}

	fn remove_event_listener(&self, node: &NodeId, event: &str, listener: &Listener<Self>) -> Result<(), Error> {
		{
			let mut arena = self.0.borrow_mut();
			let listeners = arena.element_mut(*node)?.listeners;
			match listeners.iter().position(|(bound, bound_listener)| bound == event && bound_listener == listener) {
				Some(index) => {
					listeners.remove(index);
				}
				None => return Err(Error::Platform(format!("no {:?} listener {:?} on {:?}", event, listener, node))),
			}
		}
		self.record(Mutation::RemoveEventListener { node: *node, event: event.to_owned() });
		Ok(())
	}

	fn set_text(&self, node: &NodeId, text: &str) -> Result<(), Error> {
		match &mut self.0.borrow_mut().node_mut(*node)?.data {
			NodeData::Text(content) => *content = text.to_owned(),
			NodeData::Element { .. } => return Err(Error::Platform(format!("{:?} is not a text node", node))),
		}
		self.record(Mutation::SetText { node: *node, text: text.to_owned() });
		Ok(())
	}

	/// Supports `#id`, `.class` and tag name selectors, searching below [`MemoryDocument::body`].
	fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, Error> {
		let arena = self.0.borrow();
		let found = if let Some(id) = selector.strip_prefix('#') {
			arena.find(arena.body, &|node: &Node| matches!(&node.data, NodeData::Element { attributes, .. } if attributes.get("id").map(String::as_str) == Some(id)))
		} else if let Some(class) = selector.strip_prefix('.') {
			arena.find(arena.body, &|node: &Node| matches!(&node.data, NodeData::Element { attributes, .. } if attributes.get("class").map_or(false, |classes| classes.split_whitespace().any(|c| c == class))))
		} else {
			arena.find(arena.body, &|node: &Node| matches!(&node.data, NodeData::Element { tag, .. } if tag.eq_ignore_ascii_case(selector)))
		};
		trace!(selector = ?Content(selector), ?found, "Queried.");
		Ok(found)
	}
}
