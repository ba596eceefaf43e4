//! The vnode data model and its factory.

use crate::{
	component::{ComponentSlot, ComponentTag, FunctionalTag},
	flags::{ChildrenFlags, VNodeFlags, VNodeKind},
	Component, Platform,
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	iter::FromIterator,
};
use std::{collections::BTreeMap, rc::Rc};

/// An event listener reference. Equality is identity of the wrapped closure.
pub struct Listener<P: Platform>(Rc<dyn Fn(&P::Event)>);

impl<P: Platform> Listener<P> {
	pub fn new(handler: impl Fn(&P::Event) + 'static) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &P::Event) {
		(self.0)(event)
	}

	/// Identifies the wrapped closure, ignoring its vtable.
	#[must_use]
	pub fn address(&self) -> usize {
		Rc::as_ptr(&self.0) as *const () as usize
	}
}

impl<P: Platform> Clone for Listener<P> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<P: Platform> PartialEq for Listener<P> {
	fn eq(&self, other: &Self) -> bool {
		self.address() == other.address()
	}
}

impl<P: Platform> Debug for Listener<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Listener({:#x})", self.address())
	}
}

/// A single prop value.
pub enum PropValue<P: Platform> {
	Null,
	Bool(bool),
	Number(f64),
	Str(String),
	List(Vec<PropValue<P>>),
	Map(BTreeMap<String, PropValue<P>>),
	Listener(Listener<P>),
	Node(P::Node),
}

impl<P: Platform> PropValue<P> {
	/// Builds a [`PropValue::Map`], for example for `style` or conditional `class` values.
	pub fn map<K: Into<String>, V: Into<PropValue<P>>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
		Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}

	pub fn list<V: Into<PropValue<P>>>(items: impl IntoIterator<Item = V>) -> Self {
		Self::List(items.into_iter().map(Into::into).collect())
	}

	#[must_use]
	pub fn is_truthy(&self) -> bool {
		match self {
			Self::Null => false,
			Self::Bool(b) => *b,
			Self::Number(n) => *n != 0.0 && !n.is_nan(),
			Self::Str(s) => !s.is_empty(),
			Self::List(_) | Self::Map(_) | Self::Listener(_) | Self::Node(_) => true,
		}
	}

	/// The string form used for attributes and style properties.
	///
	/// [`None`] means the attribute should be absent.
	#[must_use]
	pub fn to_attribute_value(&self) -> Option<String> {
		match self {
			Self::Null | Self::Bool(false) => None,
			Self::Bool(true) => Some(String::new()),
			Self::Number(n) => Some(n.to_string()),
			Self::Str(s) => Some(s.clone()),
			Self::List(items) => Some(items.iter().filter_map(Self::to_attribute_value).collect::<Vec<_>>().join(",")),
			Self::Map(_) | Self::Listener(_) | Self::Node(_) => None,
		}
	}
}

impl<P: Platform> Clone for PropValue<P> {
	fn clone(&self) -> Self {
		match self {
			Self::Null => Self::Null,
			Self::Bool(b) => Self::Bool(*b),
			Self::Number(n) => Self::Number(*n),
			Self::Str(s) => Self::Str(s.clone()),
			Self::List(items) => Self::List(items.clone()),
			Self::Map(entries) => Self::Map(entries.clone()),
			Self::Listener(listener) => Self::Listener(listener.clone()),
			Self::Node(node) => Self::Node(node.clone()),
		}
	}
}

impl<P: Platform> PartialEq for PropValue<P> {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Number(a), Self::Number(b)) => a == b,
			(Self::Str(a), Self::Str(b)) => a == b,
			(Self::List(a), Self::List(b)) => a == b,
			(Self::Map(a), Self::Map(b)) => a == b,
			(Self::Listener(a), Self::Listener(b)) => a == b,
			(Self::Node(a), Self::Node(b)) => a == b,
			_ => false,
		}
	}
}

impl<P: Platform> Debug for PropValue<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("Null"),
			Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
			Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
			Self::Str(s) => f.debug_tuple("Str").field(&crate::logging::Content(s)).finish(),
			Self::List(items) => f.debug_tuple("List").field(items).finish(),
			Self::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
			Self::Listener(listener) => Debug::fmt(listener, f),
			Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
		}
	}
}

macro_rules! prop_value_from {
	($($source:ty => |$value:ident| $conversion:expr),*$(,)?) => {$(
		impl<P: Platform> From<$source> for PropValue<P> {
			fn from($value: $source) -> Self {
				$conversion
			}
		}
	)*};
}

prop_value_from! {
	bool => |value| Self::Bool(value),
	f64 => |value| Self::Number(value),
	i32 => |value| Self::Number(value.into()),
	u32 => |value| Self::Number(value.into()),
	&str => |value| Self::Str(value.to_owned()),
	String => |value| Self::Str(value),
	Listener<P> => |value| Self::Listener(value),
	Vec<PropValue<P>> => |value| Self::List(value),
	BTreeMap<String, PropValue<P>> => |value| Self::Map(value),
}

/// The prop map of a vnode, ordered by key so that application order is deterministic.
pub struct Props<P: Platform>(BTreeMap<String, PropValue<P>>);

impl<P: Platform> Props<P> {
	#[must_use]
	pub fn new() -> Self {
		Self(BTreeMap::new())
	}

	#[must_use]
	pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue<P>>) -> Self {
		self.insert(key, value);
		self
	}

	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue<P>>) -> Option<PropValue<P>> {
		self.0.insert(key.into(), value.into())
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&PropValue<P>> {
		self.0.get(key)
	}

	#[must_use]
	pub fn contains_key(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue<P>)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<P: Platform> Default for Props<P> {
	fn default() -> Self {
		Self::new()
	}
}

impl<P: Platform> Clone for Props<P> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl<P: Platform> PartialEq for Props<P> {
	fn eq(&self, other: &Self) -> bool {
		self.0 == other.0
	}
}

impl<P: Platform> Debug for Props<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.0.iter()).finish()
	}
}

impl<P: Platform, K: Into<String>, V: Into<PropValue<P>>> FromIterator<(K, V)> for Props<P> {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

/// Where a portal places its children.
pub enum PortalTarget<P: Platform> {
	Selector(String),
	Node(P::Node),
}

impl<P: Platform> PortalTarget<P> {
	fn from_prop(value: &PropValue<P>) -> Option<Self> {
		match value {
			PropValue::Str(selector) => Some(Self::Selector(selector.clone())),
			PropValue::Node(node) => Some(Self::Node(node.clone())),
			_ => None,
		}
	}
}

impl<P: Platform> Clone for PortalTarget<P> {
	fn clone(&self) -> Self {
		match self {
			Self::Selector(selector) => Self::Selector(selector.clone()),
			Self::Node(node) => Self::Node(node.clone()),
		}
	}
}

impl<P: Platform> PartialEq for PortalTarget<P> {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Selector(a), Self::Selector(b)) => a == b,
			(Self::Node(a), Self::Node(b)) => a == b,
			_ => false,
		}
	}
}

impl<P: Platform> Debug for PortalTarget<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Selector(selector) => f.debug_tuple("Selector").field(selector).finish(),
			Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
		}
	}
}

/// What a vnode is built from.
///
/// Strings convert into element tags. The other forms are the fragment and portal sentinels
/// and the two component shapes.
pub enum Tag<P: Platform> {
	Element(String),
	Fragment,
	/// The target is taken from the `target` prop by [`create_element`].
	Portal(Option<PortalTarget<P>>),
	Stateful(ComponentTag<P>),
	Functional(FunctionalTag<P>),
}

impl<P: Platform> Tag<P> {
	#[must_use]
	pub fn fragment() -> Self {
		Self::Fragment
	}

	#[must_use]
	pub fn portal() -> Self {
		Self::Portal(None)
	}

	/// A stateful component constructed through [`Default`].
	#[must_use]
	pub fn stateful<C: Component<P> + Default>() -> Self {
		Self::Stateful(ComponentTag::of::<C>())
	}

	/// A stateful component constructed by `constructor`. Identity is still the type `C`.
	pub fn stateful_with<C: Component<P>>(constructor: impl Fn() -> C + 'static) -> Self {
		Self::Stateful(ComponentTag::with_constructor(constructor))
	}

	#[must_use]
	pub fn functional(render: fn(&Props<P>) -> VNode<P>) -> Self {
		Self::Functional(FunctionalTag::new(render))
	}

	/// The element tag name, if this is an element tag.
	#[must_use]
	pub fn element_name(&self) -> Option<&str> {
		match self {
			Self::Element(name) => Some(name),
			_ => None,
		}
	}
}

impl<P: Platform> PartialEq for Tag<P> {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Element(a), Self::Element(b)) => a == b,
			(Self::Fragment, Self::Fragment) => true,
			(Self::Portal(a), Self::Portal(b)) => a == b,
			(Self::Stateful(a), Self::Stateful(b)) => a == b,
			(Self::Functional(a), Self::Functional(b)) => a == b,
			_ => false,
		}
	}
}

impl<P: Platform> Debug for Tag<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Element(name) => f.debug_tuple("Element").field(name).finish(),
			Self::Fragment => f.write_str("Fragment"),
			Self::Portal(target) => f.debug_tuple("Portal").field(target).finish(),
			Self::Stateful(tag) => f.debug_tuple("Stateful").field(tag).finish(),
			Self::Functional(tag) => f.debug_tuple("Functional").field(tag).finish(),
		}
	}
}

impl<P: Platform> From<&str> for Tag<P> {
	fn from(name: &str) -> Self {
		Self::Element(name.to_owned())
	}
}

impl<P: Platform> From<String> for Tag<P> {
	fn from(name: String) -> Self {
		Self::Element(name)
	}
}

/// Normalized children, as stored on a vnode.
pub enum Children<P: Platform> {
	None,
	Single(Box<VNode<P>>),
	Multiple(Vec<VNode<P>>),
	/// The payload of a text vnode. Not a child list.
	Text(String),
}

impl<P: Platform> Debug for Children<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::None => f.write_str("None"),
			Self::Single(child) => f.debug_tuple("Single").field(child).finish(),
			Self::Multiple(children) => f.debug_tuple("Multiple").field(children).finish(),
			Self::Text(text) => f.debug_tuple("Text").field(&crate::logging::Content(text)).finish(),
		}
	}
}

/// The shapes [`create_element`] accepts for children.
pub enum ChildrenInput<P: Platform> {
	Null,
	List(Vec<VNode<P>>),
	VNode(VNode<P>),
	/// Any other value, already coerced to its string form. Becomes a text vnode.
	Value(String),
}

impl<P: Platform> From<()> for ChildrenInput<P> {
	fn from((): ()) -> Self {
		Self::Null
	}
}

impl<P: Platform> From<VNode<P>> for ChildrenInput<P> {
	fn from(vnode: VNode<P>) -> Self {
		Self::VNode(vnode)
	}
}

impl<P: Platform> From<Vec<VNode<P>>> for ChildrenInput<P> {
	fn from(list: Vec<VNode<P>>) -> Self {
		Self::List(list)
	}
}

impl<P: Platform> From<Option<VNode<P>>> for ChildrenInput<P> {
	fn from(vnode: Option<VNode<P>>) -> Self {
		vnode.map_or(Self::Null, Self::VNode)
	}
}

macro_rules! children_from_display {
	($($source:ty),*$(,)?) => {$(
		impl<P: Platform> From<$source> for ChildrenInput<P> {
			fn from(value: $source) -> Self {
				Self::Value(value.to_string())
			}
		}
	)*};
}

children_from_display!(&str, String, char, bool, i32, i64, u32, u64, usize, f64);

pub(crate) type RenderedSlot<P> = Rc<RefCell<Option<<P as Platform>::Node>>>;

/// A description of one UI node, plus the platform node it materialized as once mounted.
///
/// Kind, tag, props, children and arity are fixed at construction.
/// Mounting and patching only write the rendered node and (for components) the engine-owned instance record.
pub struct VNode<P: Platform> {
	kind: VNodeKind,
	tag: Option<Tag<P>>,
	props: Option<Props<P>>,
	children: Children<P>,
	child_flags: ChildrenFlags,
	key: Option<String>,
	rendered: RenderedSlot<P>,
	pub(crate) component: RefCell<Option<ComponentSlot<P>>>,
	pub(crate) portal_target: RefCell<Option<P::Node>>,
}

impl<P: Platform> VNode<P> {
	fn new(kind: VNodeKind, tag: Option<Tag<P>>, props: Option<Props<P>>, children: Children<P>, child_flags: ChildrenFlags) -> Self {
		Self {
			kind,
			tag,
			props,
			children,
			child_flags,
			key: None,
			rendered: Rc::default(),
			component: RefCell::new(None),
			portal_target: RefCell::new(None),
		}
	}

	#[must_use]
	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn kind(&self) -> VNodeKind {
		self.kind
	}

	#[must_use]
	pub fn flags(&self) -> VNodeFlags {
		self.kind.flags()
	}

	/// [`None`] for text vnodes.
	#[must_use]
	pub fn tag(&self) -> Option<&Tag<P>> {
		self.tag.as_ref()
	}

	#[must_use]
	pub fn props(&self) -> Option<&Props<P>> {
		self.props.as_ref()
	}

	#[must_use]
	pub fn children(&self) -> &Children<P> {
		&self.children
	}

	#[must_use]
	pub fn child_flags(&self) -> ChildrenFlags {
		self.child_flags
	}

	#[must_use]
	pub fn key(&self) -> Option<&str> {
		self.key.as_deref()
	}

	/// The text payload of a text vnode.
	#[must_use]
	pub fn text(&self) -> Option<&str> {
		match &self.children {
			Children::Text(text) => Some(text),
			_ => None,
		}
	}

	/// The platform node this vnode materialized as, once mounted.
	///
	/// For fragments this is the first child's node (or a placeholder), for portals the placeholder,
	/// and for components the root node of their rendered subtree.
	#[must_use]
	pub fn rendered_node(&self) -> Option<P::Node> {
		self.rendered.borrow().clone()
	}

	pub(crate) fn set_rendered_node(&self, node: Option<P::Node>) {
		*self.rendered.borrow_mut() = node;
	}

	pub(crate) fn rendered_slot(&self) -> RenderedSlot<P> {
		Rc::clone(&self.rendered)
	}
}

impl<P: Platform> Debug for VNode<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("VNode")
			.field("kind", &self.kind)
			.field("tag", &self.tag)
			.field("key", &self.key)
			.field("props", &self.props)
			.field("child_flags", &self.child_flags)
			.field("children", &self.children)
			.field("rendered", &*self.rendered.borrow())
			.finish()
	}
}

/// Builds a vnode from a tag, props and children, classifying it once.
///
/// - An element named exactly `"svg"` is an SVG element.
/// - A portal reads its target (selector string or node) from `props["target"]`.
/// - An empty or [`ChildrenInput::Null`] child list has no children; a one-element list is unwrapped.
/// - Longer lists are keyed, with `"|{index}"` synthesized for children that lack a key.
///   These keys are positional and so not stable across reordering.
/// - Other values become a single text vnode.
pub fn create_element<P: Platform>(tag: impl Into<Tag<P>>, props: Option<Props<P>>, children: impl Into<ChildrenInput<P>>) -> VNode<P> {
	let tag = match tag.into() {
		Tag::Portal(_) => Tag::Portal(props.as_ref().and_then(|props| props.get("target")).and_then(PortalTarget::from_prop)),
		tag => tag,
	};
	let kind = match &tag {
		Tag::Element(name) => VNodeKind::Element { svg: name == "svg" },
		Tag::Fragment => VNodeKind::Fragment,
		Tag::Portal(_) => VNodeKind::Portal,
		Tag::Stateful(_) => VNodeKind::StatefulComponent,
		Tag::Functional(_) => VNodeKind::FunctionalComponent,
	};

	let (children, child_flags) = match children.into() {
		ChildrenInput::Null => (Children::None, ChildrenFlags::NO_CHILDREN),
		ChildrenInput::List(mut list) => {
			if list.len() > 1 {
				(Children::Multiple(normalize_vnodes(list)), ChildrenFlags::KEYS_VNODES)
			} else if let Some(only) = list.pop() {
				(Children::Single(Box::new(only)), ChildrenFlags::SINGLE_VNODE)
			} else {
				(Children::None, ChildrenFlags::NO_CHILDREN)
			}
		}
		ChildrenInput::VNode(vnode) => (Children::Single(Box::new(vnode)), ChildrenFlags::SINGLE_VNODE),
		ChildrenInput::Value(text) => (Children::Single(Box::new(create_text_vnode(text))), ChildrenFlags::SINGLE_VNODE),
	};

	VNode::new(kind, Some(tag), props, children, child_flags)
}

fn normalize_vnodes<P: Platform>(children: Vec<VNode<P>>) -> Vec<VNode<P>> {
	children
		.into_iter()
		.enumerate()
		.map(|(i, child)| match child.key {
			Some(_) => child,
			None => child.with_key(format!("|{}", i)),
		})
		.collect()
}

/// A text vnode. The payload is leaf data, so its arity is [`ChildrenFlags::NO_CHILDREN`].
pub fn create_text_vnode<P: Platform>(text: impl Into<String>) -> VNode<P> {
	VNode::new(VNodeKind::Text, None, None, Children::Text(text.into()), ChildrenFlags::NO_CHILDREN)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::MemoryDocument;

	type VNode = super::VNode<MemoryDocument>;

	fn text(text: &str) -> VNode {
		create_text_vnode(text)
	}

	#[test]
	fn element_classification() {
		let div: VNode = create_element("div", None, ());
		assert_eq!(div.kind(), VNodeKind::Element { svg: false });
		assert_eq!(div.flags(), VNodeFlags::ELEMENT_HTML);
		assert_eq!(div.child_flags(), ChildrenFlags::NO_CHILDREN);
		assert!(matches!(div.children(), Children::None));

		let svg: VNode = create_element("svg", None, ());
		assert_eq!(svg.flags(), VNodeFlags::ELEMENT_SVG);

		let fragment: VNode = create_element(Tag::fragment(), None, ());
		assert_eq!(fragment.flags(), VNodeFlags::FRAGMENT);
	}

	#[test]
	fn single_child_is_unwrapped() {
		let one: VNode = create_element("p", None, vec![text("a")]);
		assert_eq!(one.child_flags(), ChildrenFlags::SINGLE_VNODE);
		assert!(matches!(one.children(), Children::Single(child) if child.text() == Some("a") && child.key().is_none()));

		let empty: VNode = create_element("p", None, Vec::<VNode>::new());
		assert_eq!(empty.child_flags(), ChildrenFlags::NO_CHILDREN);
	}

	#[test]
	fn list_children_get_positional_keys() {
		let list: VNode = create_element("ul", None, vec![text("a"), text("b").with_key("explicit"), text("c")]);
		assert_eq!(list.child_flags(), ChildrenFlags::KEYS_VNODES);
		let keys: Vec<_> = match list.children() {
			Children::Multiple(children) => children.iter().map(VNode::key).collect(),
			other => panic!("expected multiple children, got {:?}", other),
		};
		assert_eq!(keys, [Some("|0"), Some("explicit"), Some("|2")]);
	}

	#[test]
	fn scalars_become_text() {
		for (children, expected) in [(ChildrenInput::from("hi"), "hi"), (ChildrenInput::from(42_i32), "42"), (ChildrenInput::from(true), "true")] {
			let vnode: VNode = create_element("span", None, children);
			assert_eq!(vnode.child_flags(), ChildrenFlags::SINGLE_VNODE);
			match vnode.children() {
				Children::Single(child) => {
					assert_eq!(child.flags(), VNodeFlags::TEXT);
					assert_eq!(child.child_flags(), ChildrenFlags::NO_CHILDREN);
					assert_eq!(child.text(), Some(expected));
					assert!(child.tag().is_none());
				}
				other => panic!("expected a single text child, got {:?}", other),
			}
		}
	}

	#[test]
	fn portal_reads_target_prop() {
		let portal: VNode = create_element(Tag::portal(), Some(Props::new().with("target", "#modal")), text("x"));
		assert_eq!(portal.flags(), VNodeFlags::PORTAL);
		assert_eq!(portal.tag(), Some(&Tag::Portal(Some(PortalTarget::Selector("#modal".to_owned())))));

		let untargeted: VNode = create_element(Tag::portal(), None, ());
		assert_eq!(untargeted.tag(), Some(&Tag::Portal(None)));
	}

	#[test]
	fn components_classify_by_shape() {
		#[derive(Default)]
		struct Counter;
		impl Component<MemoryDocument> for Counter {
			fn render(&mut self, _: &Props<MemoryDocument>) -> VNode {
				create_text_vnode("0")
			}
		}
		fn label(_: &Props<MemoryDocument>) -> VNode {
			create_text_vnode("label")
		}

		let stateful: VNode = create_element(Tag::stateful::<Counter>(), None, ());
		assert_eq!(stateful.flags(), VNodeFlags::COMPONENT_STATEFUL_NORMAL);
		assert!(stateful.flags().intersects(VNodeFlags::COMPONENT));
		assert_eq!(stateful.tag(), create_element(Tag::stateful::<Counter>(), None, ()).tag());

		let functional: VNode = create_element(Tag::functional(label), None, ());
		assert_eq!(functional.flags(), VNodeFlags::COMPONENT_FUNCTIONAL);
		assert_ne!(functional.tag(), stateful.tag());
	}

	#[test]
	fn listener_identity() {
		let a = Listener::<MemoryDocument>::new(|_| ());
		let b = Listener::<MemoryDocument>::new(|_| ());
		assert_eq!(a, a.clone());
		assert_ne!(a, b);
	}
}
