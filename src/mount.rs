//! First-time materialization of vnode subtrees.

use crate::{
	attributes::apply_prop,
	component::{update_instance, ComponentSlot, FunctionalHandle, Instance},
	flags::VNodeKind,
	logging::Content,
	vnode::{create_text_vnode, Children},
	Error, Platform, PortalTarget, Tag, VNode,
};
use core::cell::RefCell;
use std::rc::Rc;
use tracing::{error, instrument, trace_span};

/// Materializes `vnode` and its subtree, appending the result to `container`.
///
/// # Errors
///
/// Platform failures, a portal target that can't be found, and invalid `class` values.
/// The tree is left partially mounted in that case.
#[instrument(skip(platform, vnode))]
pub fn mount<P: Platform>(platform: &P, vnode: &VNode<P>, container: &P::Node) -> Result<(), Error> {
	mount_in(platform, vnode, container, false)
}

/// `svg` is [`true`] inside an SVG element, where elements are created in the SVG namespace.
pub(crate) fn mount_in<P: Platform>(platform: &P, vnode: &VNode<P>, container: &P::Node, svg: bool) -> Result<(), Error> {
	match vnode.kind() {
		VNodeKind::Element { svg: svg_element } => mount_element(platform, vnode, container, svg || svg_element),
		VNodeKind::StatefulComponent => mount_stateful_component(platform, vnode, container, svg),
		VNodeKind::FunctionalComponent => mount_functional_component(platform, vnode, container, svg),
		VNodeKind::Text => mount_text(platform, vnode, container),
		VNodeKind::Fragment => mount_fragment(platform, vnode, container, svg),
		VNodeKind::Portal => mount_portal(platform, vnode, container),
	}
}

pub(crate) fn mount_children<P: Platform>(platform: &P, children: &Children<P>, container: &P::Node, svg: bool) -> Result<(), Error> {
	match children {
		Children::Single(child) => mount_in(platform, child, container, svg),
		Children::Multiple(children) => children.iter().try_for_each(|child| mount_in(platform, child, container, svg)),
		Children::None | Children::Text(_) => Ok(()),
	}
}

fn mount_element<P: Platform>(platform: &P, vnode: &VNode<P>, container: &P::Node, svg: bool) -> Result<(), Error> {
	let name = vnode.tag().and_then(Tag::element_name).unwrap_or_default();
	let span = trace_span!("Mounting element", tag = name, svg);
	let _enter = span.enter();

	let element = platform.create_element(name, svg)?;
	vnode.set_rendered_node(Some(element.clone()));

	if let Some(props) = vnode.props() {
		for (key, value) in props.iter() {
			apply_prop(platform, &element, key, None, Some(value))?;
		}
	}

	mount_children(platform, vnode.children(), &element, svg)?;
	platform.append_child(container, &element)
}

fn mount_stateful_component<P: Platform>(platform: &P, vnode: &VNode<P>, container: &P::Node, svg: bool) -> Result<(), Error> {
	let tag = match vnode.tag() {
		Some(Tag::Stateful(tag)) => tag,
		tag => {
			error!("Stateful component vnode with tag {:?}. Skipping.", tag);
			return Ok(());
		}
	};

	let instance = Rc::new(RefCell::new(Instance::new(
		tag,
		vnode.props().cloned().unwrap_or_default(),
		container.clone(),
		svg,
		vnode.rendered_slot(),
	)));
	*vnode.component.borrow_mut() = Some(ComponentSlot::Stateful(Rc::clone(&instance)));
	update_instance(platform, &instance)
}

fn mount_functional_component<P: Platform>(platform: &P, vnode: &VNode<P>, container: &P::Node, svg: bool) -> Result<(), Error> {
	let tag = match vnode.tag() {
		Some(Tag::Functional(tag)) => tag,
		tag => {
			error!("Functional component vnode with tag {:?}. Skipping.", tag);
			return Ok(());
		}
	};

	let mut handle = Box::new(FunctionalHandle::new(
		tag.clone(),
		vnode.props().cloned().unwrap_or_default(),
		container.clone(),
		svg,
		vnode.rendered_slot(),
	));
	let result = handle.update(platform);
	*vnode.component.borrow_mut() = Some(ComponentSlot::Functional(handle));
	result
}

pub(crate) fn mount_text<P: Platform>(platform: &P, vnode: &VNode<P>, container: &P::Node) -> Result<(), Error> {
	let text = vnode.text().unwrap_or_default();
	let span = trace_span!("Mounting text", text = ?Content(text));
	let _enter = span.enter();

	let node = platform.create_text_node(text)?;
	vnode.set_rendered_node(Some(node.clone()));
	platform.append_child(container, &node)
}

/// Mounts an empty text node that marks a position, returning it.
pub(crate) fn mount_placeholder<P: Platform>(platform: &P, container: &P::Node) -> Result<Option<P::Node>, Error> {
	let placeholder: VNode<P> = create_text_vnode("");
	mount_text(platform, &placeholder, container)?;
	Ok(placeholder.rendered_node())
}

fn mount_fragment<P: Platform>(platform: &P, vnode: &VNode<P>, container: &P::Node, svg: bool) -> Result<(), Error> {
	let span = trace_span!("Mounting fragment", child_flags = ?vnode.child_flags());
	let _enter = span.enter();

	match vnode.children() {
		Children::Single(child) => {
			mount_in(platform, child, container, svg)?;
			vnode.set_rendered_node(child.rendered_node());
		}
		Children::Multiple(children) => {
			mount_children(platform, vnode.children(), container, svg)?;
			vnode.set_rendered_node(children.first().and_then(|first| first.rendered_node()));
		}
		Children::None | Children::Text(_) => vnode.set_rendered_node(mount_placeholder(platform, container)?),
	}
	Ok(())
}

/// Finds the node a portal's children go into.
pub(crate) fn resolve_target<P: Platform>(platform: &P, tag: Option<&Tag<P>>) -> Result<P::Node, Error> {
	match tag {
		Some(Tag::Portal(Some(PortalTarget::Selector(selector)))) => platform.query_selector(selector)?.ok_or_else(|| Error::MissingTarget(selector.clone())),
		Some(Tag::Portal(Some(PortalTarget::Node(node)))) => Ok(node.clone()),
		_ => Err(Error::MissingPortalTarget),
	}
}

fn mount_portal<P: Platform>(platform: &P, vnode: &VNode<P>, container: &P::Node) -> Result<(), Error> {
	let span = trace_span!("Mounting portal", target = ?vnode.tag());
	let _enter = span.enter();

	let target = resolve_target(platform, vnode.tag())?;
	mount_children(platform, vnode.children(), &target, false)?;
	*vnode.portal_target.borrow_mut() = Some(target);

	vnode.set_rendered_node(mount_placeholder(platform, container)?);
	Ok(())
}
