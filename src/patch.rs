//! Reconciliation of a previously mounted vnode tree against its successor.

use crate::{
	attributes::{apply_prop, unbind_listeners},
	component::{update_instance, ComponentSlot},
	flags::{Arity, ChildrenFlags, VNodeFlags, VNodeKind},
	logging::Content,
	mount::{mount_in, mount_placeholder, resolve_target},
	vnode::Children,
	Error, Platform, VNode,
};
use core::slice;
use tracing::{error, instrument, trace, trace_span, warn};

/// Reconciles the mounted `prev` against `next`, both inside `container`.
///
/// `next` takes over `prev`'s platform nodes and component instances wherever they are reused.
/// `prev` should be discarded afterwards.
///
/// # Errors
///
/// Platform failures, a portal target that can't be found, invalid `class` values and re-entrant component updates.
/// Kind or arity mismatches are never errors; they are resolved by replacement.
#[instrument(skip(platform, prev, next))]
pub fn patch<P: Platform>(platform: &P, prev: &VNode<P>, next: &VNode<P>, container: &P::Node) -> Result<(), Error> {
	patch_in(platform, prev, next, container, false)
}

pub(crate) fn patch_in<P: Platform>(platform: &P, prev: &VNode<P>, next: &VNode<P>, container: &P::Node, svg: bool) -> Result<(), Error> {
	if prev.flags() != next.flags() {
		return replace(platform, prev, next, container, svg);
	}

	match next.kind() {
		VNodeKind::Element { svg: svg_element } => patch_element(platform, prev, next, container, svg || svg_element),
		VNodeKind::StatefulComponent | VNodeKind::FunctionalComponent => patch_component(platform, prev, next, container, svg),
		VNodeKind::Text => patch_text(platform, prev, next),
		VNodeKind::Fragment => patch_fragment(platform, prev, next, container, svg),
		VNodeKind::Portal => patch_portal(platform, prev, next),
	}
}

/// Removes `prev` entirely and mounts `next` fresh in its place.
fn replace<P: Platform>(platform: &P, prev: &VNode<P>, next: &VNode<P>, container: &P::Node, svg: bool) -> Result<(), Error> {
	let span = trace_span!("Replacing", prev = ?prev.flags(), next = ?next.flags());
	let _enter = span.enter();

	remove(platform, prev, container)?;
	mount_in(platform, next, container, svg)
}

/// Detaches everything `vnode` materialized from `container`,
/// then unbinds listeners and runs `unmounted` hooks throughout the removed subtree.
pub(crate) fn remove<P: Platform>(platform: &P, vnode: &VNode<P>, container: &P::Node) -> Result<(), Error> {
	detach(platform, vnode, container)?;
	unbind(platform, vnode)
}

fn detach<P: Platform>(platform: &P, vnode: &VNode<P>, container: &P::Node) -> Result<(), Error> {
	match vnode.kind() {
		VNodeKind::Element { .. } | VNodeKind::Text => detach_rendered(platform, vnode, container),
		VNodeKind::Fragment => match vnode.child_flags().arity() {
			Arity::None => detach_rendered(platform, vnode, container),
			Arity::Single | Arity::Multiple => child_list(vnode.children()).iter().try_for_each(|child| detach(platform, child, container)),
		},
		VNodeKind::Portal => {
			let target = vnode.portal_target.borrow().clone();
			match target {
				Some(target) => child_list(vnode.children()).iter().try_for_each(|child| detach(platform, child, &target))?,
				None => warn!("Detaching a portal without resolved target. Its children stay where they are."),
			}
			detach_rendered(platform, vnode, container)
		}
		VNodeKind::StatefulComponent | VNodeKind::FunctionalComponent => match &*vnode.component.borrow() {
			Some(ComponentSlot::Stateful(instance)) => {
				let instance = instance.try_borrow().map_err(|_| Error::ReentrantUpdate)?;
				match &instance.subtree {
					Some(subtree) => detach(platform, subtree, container),
					None => Ok(()),
				}
			}
			Some(ComponentSlot::Functional(handle)) => match &handle.previous {
				Some(subtree) => detach(platform, subtree, container),
				None => Ok(()),
			},
			None => {
				warn!("Detaching a component that was never mounted.");
				Ok(())
			}
		},
	}
}

fn detach_rendered<P: Platform>(platform: &P, vnode: &VNode<P>, container: &P::Node) -> Result<(), Error> {
	match vnode.rendered_node() {
		Some(node) => platform.remove_child(container, &node),
		None => {
			warn!("Detaching a {:?} vnode that was never mounted.", vnode.kind());
			Ok(())
		}
	}
}

/// Children first, so `unmounted` hooks run innermost-first.
fn unbind<P: Platform>(platform: &P, vnode: &VNode<P>) -> Result<(), Error> {
	match vnode.kind() {
		VNodeKind::Text => Ok(()),
		VNodeKind::Element { .. } => {
			child_list(vnode.children()).iter().try_for_each(|child| unbind(platform, child))?;
			match (vnode.rendered_node(), vnode.props()) {
				(Some(node), Some(props)) => unbind_listeners(platform, &node, props),
				_ => Ok(()),
			}
		}
		VNodeKind::Fragment | VNodeKind::Portal => child_list(vnode.children()).iter().try_for_each(|child| unbind(platform, child)),
		VNodeKind::StatefulComponent | VNodeKind::FunctionalComponent => match &*vnode.component.borrow() {
			Some(ComponentSlot::Stateful(instance)) => {
				let mut instance = instance.try_borrow_mut().map_err(|_| Error::ReentrantUpdate)?;
				if let Some(subtree) = &instance.subtree {
					unbind(platform, subtree)?;
				}
				if vnode.flags().intersects(VNodeFlags::COMPONENT_STATEFUL_NORMAL) {
					instance.destroy();
				}
				Ok(())
			}
			Some(ComponentSlot::Functional(handle)) => match &handle.previous {
				Some(subtree) => unbind(platform, subtree),
				None => Ok(()),
			},
			None => Ok(()),
		},
	}
}

/// The children of a vnode as a slice, empty for text payloads.
pub(crate) fn child_list<P: Platform>(children: &Children<P>) -> &[VNode<P>] {
	match children {
		Children::Single(child) => slice::from_ref(&**child),
		Children::Multiple(children) => children,
		Children::None | Children::Text(_) => &[],
	}
}

fn patch_element<P: Platform>(platform: &P, prev: &VNode<P>, next: &VNode<P>, container: &P::Node, svg: bool) -> Result<(), Error> {
	if prev.tag() != next.tag() {
		return replace(platform, prev, next, container, svg);
	}

	let span = trace_span!("Patching element", tag = ?next.tag());
	let _enter = span.enter();

	let element = match prev.rendered_node() {
		Some(element) => element,
		None => {
			error!("Patching an element that was never mounted. Mounting afresh.");
			return mount_in(platform, next, container, svg);
		}
	};
	next.set_rendered_node(Some(element.clone()));

	if let Some(next_props) = next.props() {
		for (key, next_value) in next_props.iter() {
			let prev_value = prev.props().and_then(|prev_props| prev_props.get(key));
			if prev_value == Some(next_value) {
				continue;
			}
			apply_prop(platform, &element, key, prev_value, Some(next_value))?;
		}
	}

	if let Some(prev_props) = prev.props() {
		for (key, prev_value) in prev_props.iter() {
			if !next.props().map_or(false, |next_props| next_props.contains_key(key)) {
				apply_prop(platform, &element, key, Some(prev_value), None)?;
			}
		}
	}

	patch_children(platform, prev.child_flags(), next.child_flags(), prev.children(), next.children(), &element, svg)
}

/// Reconciles two child lists by arity.
///
/// Only single-to-single recurses into [`patch`]. Every other transition detaches all previous children
/// and mounts all next ones, without matching keys.
fn patch_children<P: Platform>(
	platform: &P,
	prev_flags: ChildrenFlags,
	next_flags: ChildrenFlags,
	prev_children: &Children<P>,
	next_children: &Children<P>,
	container: &P::Node,
	svg: bool,
) -> Result<(), Error> {
	match (prev_flags.arity(), next_flags.arity(), prev_children, next_children) {
		(Arity::Single, Arity::Single, Children::Single(prev), Children::Single(next)) => patch_in(platform, prev, next, container, svg),
		(Arity::None, Arity::None, ..) => Ok(()),
		(prev_arity, next_arity, ..) => {
			trace!(?prev_arity, ?next_arity, "Replacing child list.");
			for prev in child_list(prev_children) {
				remove(platform, prev, container)?;
			}
			for next in child_list(next_children) {
				mount_in(platform, next, container, svg)?;
			}
			Ok(())
		}
	}
}

fn patch_component<P: Platform>(platform: &P, prev: &VNode<P>, next: &VNode<P>, container: &P::Node, svg: bool) -> Result<(), Error> {
	if prev.tag() != next.tag() {
		return replace(platform, prev, next, container, svg);
	}

	// On failure the record goes back to `prev`, which the caller keeps.
	let slot = prev.component.borrow_mut().take();
	match slot {
		Some(ComponentSlot::Stateful(instance)) => {
			let rebound = instance.try_borrow_mut().map(|mut instance| {
				instance.props = next.props().cloned().unwrap_or_default();
				instance.container = container.clone();
				instance.svg = svg;
				instance.owner = next.rendered_slot();
			});
			let result = match rebound {
				Ok(()) => update_instance(platform, &instance),
				Err(_) => Err(Error::ReentrantUpdate),
			};
			match result {
				Ok(()) => *next.component.borrow_mut() = Some(ComponentSlot::Stateful(instance)),
				Err(_) => {
					if let Ok(mut instance) = instance.try_borrow_mut() {
						instance.owner = prev.rendered_slot();
						*instance.owner.borrow_mut() = instance.subtree.as_ref().and_then(VNode::rendered_node);
					}
					*prev.component.borrow_mut() = Some(ComponentSlot::Stateful(instance));
				}
			}
			result
		}
		Some(ComponentSlot::Functional(mut handle)) => {
			handle.props = next.props().cloned().unwrap_or_default();
			handle.container = container.clone();
			handle.svg = svg;
			handle.owner = next.rendered_slot();
			let result = handle.update(platform);
			let owner = if result.is_ok() {
				next
			} else {
				handle.owner = prev.rendered_slot();
				*handle.owner.borrow_mut() = handle.previous.as_ref().and_then(VNode::rendered_node);
				prev
			};
			*owner.component.borrow_mut() = Some(ComponentSlot::Functional(handle));
			result
		}
		None => {
			error!("Patching a component that was never mounted. Mounting afresh.");
			mount_in(platform, next, container, svg)
		}
	}
}

fn patch_text<P: Platform>(platform: &P, prev: &VNode<P>, next: &VNode<P>) -> Result<(), Error> {
	let node = prev.rendered_node();
	next.set_rendered_node(node.clone());

	let (prev_text, next_text) = (prev.text().unwrap_or_default(), next.text().unwrap_or_default());
	if prev_text == next_text {
		trace!("Text unchanged.");
		return Ok(());
	}

	let span = trace_span!("Patching text", prev = ?Content(prev_text), next = ?Content(next_text));
	let _enter = span.enter();
	match node {
		Some(node) => platform.set_text(&node, next_text),
		None => {
			error!("Patching text that was never mounted.");
			Ok(())
		}
	}
}

fn patch_fragment<P: Platform>(platform: &P, prev: &VNode<P>, next: &VNode<P>, container: &P::Node, svg: bool) -> Result<(), Error> {
	let span = trace_span!("Patching fragment", prev = ?prev.child_flags(), next = ?next.child_flags());
	let _enter = span.enter();

	let (prev_arity, next_arity) = (prev.child_flags().arity(), next.child_flags().arity());
	if prev_arity == Arity::None && next_arity != Arity::None {
		trace!("Removing fragment placeholder.");
		if let Some(placeholder) = prev.rendered_node() {
			platform.remove_child(container, &placeholder)?;
		}
	}

	patch_children(platform, prev.child_flags(), next.child_flags(), prev.children(), next.children(), container, svg)?;

	match next.children() {
		Children::Single(child) => next.set_rendered_node(child.rendered_node()),
		Children::Multiple(children) => next.set_rendered_node(children.first().and_then(|first| first.rendered_node())),
		Children::None | Children::Text(_) => {
			if prev_arity == Arity::None {
				next.set_rendered_node(prev.rendered_node());
			} else {
				next.set_rendered_node(mount_placeholder(platform, container)?);
			}
		}
	}
	Ok(())
}

fn patch_portal<P: Platform>(platform: &P, prev: &VNode<P>, next: &VNode<P>) -> Result<(), Error> {
	let span = trace_span!("Patching portal", prev = ?prev.tag(), next = ?next.tag());
	let _enter = span.enter();

	let prev_target = match prev.portal_target.borrow().clone() {
		Some(target) => target,
		None => {
			error!("Patching a portal that was never mounted.");
			return Err(Error::MissingPortalTarget);
		}
	};

	patch_children(platform, prev.child_flags(), next.child_flags(), prev.children(), next.children(), &prev_target, false)?;
	next.set_rendered_node(prev.rendered_node());

	let next_target = if prev.tag() == next.tag() {
		prev_target
	} else {
		let next_target = resolve_target(platform, next.tag())?;
		if next_target != prev_target {
			trace!("Moving portal children to new target.");
			for child in child_list(next.children()) {
				for node in top_level_nodes(child)? {
					platform.append_child(&next_target, &node)?;
				}
			}
		}
		next_target
	};
	*next.portal_target.borrow_mut() = Some(next_target);
	Ok(())
}

/// The platform nodes `vnode` placed directly into its container, in order.
fn top_level_nodes<P: Platform>(vnode: &VNode<P>) -> Result<Vec<P::Node>, Error> {
	let mut nodes = Vec::new();
	collect_top_level_nodes(vnode, &mut nodes)?;
	Ok(nodes)
}

fn collect_top_level_nodes<P: Platform>(vnode: &VNode<P>, nodes: &mut Vec<P::Node>) -> Result<(), Error> {
	match vnode.kind() {
		VNodeKind::Fragment if vnode.child_flags().arity() != Arity::None => {
			for child in child_list(vnode.children()) {
				collect_top_level_nodes(child, nodes)?;
			}
		}
		VNodeKind::StatefulComponent | VNodeKind::FunctionalComponent => match &*vnode.component.borrow() {
			Some(ComponentSlot::Stateful(instance)) => {
				if let Some(subtree) = &instance.try_borrow().map_err(|_| Error::ReentrantUpdate)?.subtree {
					collect_top_level_nodes(subtree, nodes)?;
				}
			}
			Some(ComponentSlot::Functional(handle)) => {
				if let Some(subtree) = &handle.previous {
					collect_top_level_nodes(subtree, nodes)?;
				}
			}
			None => (),
		},
		_ => nodes.extend(vnode.rendered_node()),
	}
	Ok(())
}
