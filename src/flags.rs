//! Classification of vnodes by kind and by children arity.

use bitflags::bitflags;

bitflags! {
	/// Node-kind bits. Composite masks allow group tests like "is any component" in one `intersects`.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct VNodeFlags: u16 {
		const ELEMENT_HTML = 1;
		const ELEMENT_SVG = 1 << 1;
		const COMPONENT_STATEFUL_NORMAL = 1 << 2;
		const COMPONENT_STATEFUL_SHOULD_KEEP_ALIVE = 1 << 3;
		const COMPONENT_STATEFUL_KEPT_ALIVE = 1 << 4;
		const COMPONENT_FUNCTIONAL = 1 << 5;
		const TEXT = 1 << 6;
		const FRAGMENT = 1 << 7;
		const PORTAL = 1 << 8;

		const ELEMENT = Self::ELEMENT_HTML.bits() | Self::ELEMENT_SVG.bits();
		const COMPONENT_STATEFUL = Self::COMPONENT_STATEFUL_NORMAL.bits()
			| Self::COMPONENT_STATEFUL_SHOULD_KEEP_ALIVE.bits()
			| Self::COMPONENT_STATEFUL_KEPT_ALIVE.bits();
		const COMPONENT = Self::COMPONENT_STATEFUL.bits() | Self::COMPONENT_FUNCTIONAL.bits();
	}
}

bitflags! {
	/// Children arity, fixed when the vnode is created.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct ChildrenFlags: u8 {
		const NO_CHILDREN = 1;
		const SINGLE_VNODE = 1 << 1;
		const KEYS_VNODES = 1 << 2;
		const NONE_KEYED_VNODES = 1 << 3;

		const MULTIPLE_VNODES = Self::KEYS_VNODES.bits() | Self::NONE_KEYED_VNODES.bits();
	}
}

/// The closed set of vnode kinds that mount and patch dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VNodeKind {
	Element { svg: bool },
	StatefulComponent,
	FunctionalComponent,
	Text,
	Fragment,
	Portal,
}

impl VNodeKind {
	/// The single kind bit this kind is classified as.
	#[must_use]
	pub fn flags(self) -> VNodeFlags {
		match self {
			Self::Element { svg: false } => VNodeFlags::ELEMENT_HTML,
			Self::Element { svg: true } => VNodeFlags::ELEMENT_SVG,
			Self::StatefulComponent => VNodeFlags::COMPONENT_STATEFUL_NORMAL,
			Self::FunctionalComponent => VNodeFlags::COMPONENT_FUNCTIONAL,
			Self::Text => VNodeFlags::TEXT,
			Self::Fragment => VNodeFlags::FRAGMENT,
			Self::Portal => VNodeFlags::PORTAL,
		}
	}
}

impl ChildrenFlags {
	/// Collapses the arity into the three cases the child-list policy distinguishes.
	#[must_use]
	pub fn arity(self) -> Arity {
		if self.intersects(Self::SINGLE_VNODE) {
			Arity::Single
		} else if self.intersects(Self::MULTIPLE_VNODES) {
			Arity::Multiple
		} else {
			Arity::None
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
	None,
	Single,
	Multiple,
}
