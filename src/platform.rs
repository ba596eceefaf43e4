use crate::{Error, Listener, PropValue};
use core::fmt::Debug;

/// The host node API the engine materializes vnodes onto.
///
/// Implementations are cheap handles (`Clone`) onto a shared node tree,
/// since component [`Updater`](`crate::Updater`)s keep one around to re-render later.
///
/// Appending a node that already has a parent must move it, as in the DOM.
pub trait Platform: Clone + 'static {
	/// A reference to one platform node. Equality is node identity.
	type Node: Clone + PartialEq + Debug + 'static;
	/// The argument passed to event listeners.
	type Event: 'static;

	/// Creates an element, in the SVG namespace iff `svg` is `true`.
	fn create_element(&self, tag: &str, svg: bool) -> Result<Self::Node, Error>;
	fn create_text_node(&self, text: &str) -> Result<Self::Node, Error>;

	fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), Error>;
	fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), Error>;

	fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), Error>;
	fn remove_attribute(&self, node: &Self::Node, name: &str) -> Result<(), Error>;

	/// Assigns a property directly on the node object, bypassing string attributes.
	fn set_property(&self, node: &Self::Node, name: &str, value: &PropValue<Self>) -> Result<(), Error>;
	fn remove_property(&self, node: &Self::Node, name: &str) -> Result<(), Error>;

	fn set_style(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), Error>;
	fn remove_style(&self, node: &Self::Node, name: &str) -> Result<(), Error>;

	fn add_event_listener(&self, node: &Self::Node, event: &str, listener: &Listener<Self>) -> Result<(), Error>;
	fn remove_event_listener(&self, node: &Self::Node, event: &str, listener: &Listener<Self>) -> Result<(), Error>;

	/// Overwrites a text node's content.
	fn set_text(&self, node: &Self::Node, text: &str) -> Result<(), Error>;

	fn query_selector(&self, selector: &str) -> Result<Option<Self::Node>, Error>;
}
