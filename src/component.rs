//! Component tags, the engine-owned component records and their update protocol.

use crate::{
	mount::mount_in,
	patch::patch_in,
	vnode::RenderedSlot,
	Error, Platform, Props, VNode,
};
use core::{
	any::{type_name, TypeId},
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::rc::{Rc, Weak};
use tracing::{trace, trace_span, warn};

/// An application-authored stateful component.
///
/// The engine constructs it through its [`ComponentTag`], binds the vnode's props to it and keeps it alive
/// for as long as the component stays in the tree.
pub trait Component<P: Platform>: 'static {
	/// Produces a fresh subtree for the current props.
	fn render(&mut self, props: &Props<P>) -> VNode<P>;

	/// Called once, right after the first subtree was mounted.
	///
	/// Store `updater` to re-render after changing state.
	/// Updating from within this hook or from [`Component::render`] fails with [`Error::ReentrantUpdate`].
	fn mounted(&mut self, updater: &Updater<P>) {
		let _ = updater;
	}

	/// Called when the component is removed from the tree.
	fn unmounted(&mut self) {}
}

/// Identifies and constructs a stateful component. Two tags are equal iff they construct the same type.
pub struct ComponentTag<P: Platform> {
	type_id: TypeId,
	name: &'static str,
	construct: Rc<dyn Fn() -> Box<dyn Component<P>>>,
}

impl<P: Platform> ComponentTag<P> {
	#[must_use]
	pub fn of<C: Component<P> + Default>() -> Self {
		Self::with_constructor(C::default)
	}

	pub fn with_constructor<C: Component<P>>(constructor: impl Fn() -> C + 'static) -> Self {
		Self {
			type_id: TypeId::of::<C>(),
			name: type_name::<C>(),
			construct: Rc::new(move || Box::new(constructor()) as Box<dyn Component<P>>),
		}
	}

	#[must_use]
	pub fn name(&self) -> &'static str {
		self.name
	}

	fn construct(&self) -> Box<dyn Component<P>> {
		(self.construct)()
	}
}

impl<P: Platform> Clone for ComponentTag<P> {
	fn clone(&self) -> Self {
		Self {
			type_id: self.type_id,
			name: self.name,
			construct: Rc::clone(&self.construct),
		}
	}
}

impl<P: Platform> PartialEq for ComponentTag<P> {
	fn eq(&self, other: &Self) -> bool {
		self.type_id == other.type_id
	}
}

impl<P: Platform> Debug for ComponentTag<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

/// A functional component: a plain function from props to a subtree. Equality is function identity.
pub struct FunctionalTag<P: Platform> {
	render: fn(&Props<P>) -> VNode<P>,
}

impl<P: Platform> FunctionalTag<P> {
	#[must_use]
	pub fn new(render: fn(&Props<P>) -> VNode<P>) -> Self {
		Self { render }
	}

	fn address(&self) -> usize {
		self.render as usize
	}
}

impl<P: Platform> Clone for FunctionalTag<P> {
	fn clone(&self) -> Self {
		Self { render: self.render }
	}
}

impl<P: Platform> PartialEq for FunctionalTag<P> {
	fn eq(&self, other: &Self) -> bool {
		self.address() == other.address()
	}
}

impl<P: Platform> Debug for FunctionalTag<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "fn@{:#x}", self.address())
	}
}

/// Where a stateful component instance is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
	/// Constructed, first subtree not mounted yet.
	Unmounted,
	Mounted,
	/// Re-rendering and patching its subtree.
	Updating,
	/// Removed from the tree. Further updates are refused.
	Destroyed,
}

/// The engine's record of a stateful component.
pub(crate) struct Instance<P: Platform> {
	component: Box<dyn Component<P>>,
	name: &'static str,
	pub(crate) props: Props<P>,
	/// Shared with [`Updater`]s, which read it while the instance is borrowed.
	lifecycle: Rc<Cell<Lifecycle>>,
	pub(crate) subtree: Option<VNode<P>>,
	pub(crate) container: P::Node,
	pub(crate) svg: bool,
	/// The rendered-node slot of the vnode currently owning this instance.
	pub(crate) owner: RenderedSlot<P>,
}

impl<P: Platform> Instance<P> {
	pub(crate) fn new(tag: &ComponentTag<P>, props: Props<P>, container: P::Node, svg: bool, owner: RenderedSlot<P>) -> Self {
		Self {
			component: tag.construct(),
			name: tag.name(),
			props,
			lifecycle: Rc::new(Cell::new(Lifecycle::Unmounted)),
			subtree: None,
			container,
			svg,
			owner,
		}
	}

	/// Runs the `unmounted` hook once.
	pub(crate) fn destroy(&mut self) {
		if self.lifecycle.get() != Lifecycle::Destroyed {
			trace!(component = self.name, "Unmounting component.");
			self.lifecycle.set(Lifecycle::Destroyed);
			self.component.unmounted();
		}
	}
}

/// The engine's record of a functional component, standing in for an instance.
pub(crate) struct FunctionalHandle<P: Platform> {
	render: FunctionalTag<P>,
	pub(crate) props: Props<P>,
	/// The subtree returned by the previous call.
	pub(crate) previous: Option<VNode<P>>,
	pub(crate) container: P::Node,
	pub(crate) svg: bool,
	pub(crate) owner: RenderedSlot<P>,
}

impl<P: Platform> FunctionalHandle<P> {
	pub(crate) fn new(render: FunctionalTag<P>, props: Props<P>, container: P::Node, svg: bool, owner: RenderedSlot<P>) -> Self {
		Self {
			render,
			props,
			previous: None,
			container,
			svg,
			owner,
		}
	}

	/// Mounts the function's subtree on first call and diffs against the previous subtree afterwards.
	pub(crate) fn update(&mut self, platform: &P) -> Result<(), Error> {
		let next = (self.render.render)(&self.props);
		let result = match self.previous.take() {
			None => {
				let span = trace_span!("Mounting functional component", render = ?self.render);
				let _enter = span.enter();
				mount_in(platform, &next, &self.container, self.svg)
			}
			Some(previous) => {
				let span = trace_span!("Updating functional component", render = ?self.render);
				let _enter = span.enter();
				patch_in(platform, &previous, &next, &self.container, self.svg)
			}
		};
		*self.owner.borrow_mut() = next.rendered_node();
		self.previous = Some(next);
		result
	}
}

/// The component record attached to a mounted component vnode.
pub(crate) enum ComponentSlot<P: Platform> {
	Stateful(Rc<RefCell<Instance<P>>>),
	Functional(Box<FunctionalHandle<P>>),
}

/// A handle to re-render a mounted stateful component, handed out through [`Component::mounted`].
///
/// It does not keep the component alive.
pub struct Updater<P: Platform> {
	instance: Weak<RefCell<Instance<P>>>,
	lifecycle: Rc<Cell<Lifecycle>>,
	platform: P,
}

impl<P: Platform> Updater<P> {
	/// Re-renders the component and patches its previous subtree against the new one.
	///
	/// # Errors
	///
	/// - [`Error::ReentrantUpdate`] if called while the component is rendering,
	/// - [`Error::InstanceDropped`] if the component is gone or was unmounted,
	/// - and anything patching the subtree fails with.
	pub fn update(&self) -> Result<(), Error> {
		let instance = self.instance.upgrade().ok_or(Error::InstanceDropped)?;
		update_instance(&self.platform, &instance)
	}

	/// The component's current state, also from within its own hooks.
	///
	/// [`None`] once the instance was dropped.
	#[must_use]
	pub fn lifecycle(&self) -> Option<Lifecycle> {
		(self.instance.strong_count() > 0).then(|| self.lifecycle.get())
	}
}

impl<P: Platform> Clone for Updater<P> {
	fn clone(&self) -> Self {
		Self {
			instance: Weak::clone(&self.instance),
			lifecycle: Rc::clone(&self.lifecycle),
			platform: self.platform.clone(),
		}
	}
}

impl<P: Platform> Debug for Updater<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Updater").field("lifecycle", &self.lifecycle()).finish()
	}
}

/// The update capability of a stateful component.
///
/// The first call mounts the rendered subtree and runs the `mounted` hook.
/// Later calls only ever patch.
pub(crate) fn update_instance<P: Platform>(platform: &P, instance: &Rc<RefCell<Instance<P>>>) -> Result<(), Error> {
	let mut guard = instance.try_borrow_mut().map_err(|_| Error::ReentrantUpdate)?;
	let updater = Updater {
		instance: Rc::downgrade(instance),
		lifecycle: Rc::clone(&guard.lifecycle),
		platform: platform.clone(),
	};
	let instance = &mut *guard;

	match instance.lifecycle.get() {
		Lifecycle::Unmounted => {
			let span = trace_span!("Mounting stateful component", component = instance.name);
			let _enter = span.enter();

			let subtree = instance.component.render(&instance.props);
			mount_in(platform, &subtree, &instance.container, instance.svg)?;
			instance.lifecycle.set(Lifecycle::Mounted);
			*instance.owner.borrow_mut() = subtree.rendered_node();
			instance.subtree = Some(subtree);
			instance.component.mounted(&updater);
			Ok(())
		}

		Lifecycle::Mounted => {
			let span = trace_span!("Updating stateful component", component = instance.name);
			let _enter = span.enter();

			instance.lifecycle.set(Lifecycle::Updating);
			let next = instance.component.render(&instance.props);
			let result = match instance.subtree.take() {
				Some(previous) => patch_in(platform, &previous, &next, &instance.container, instance.svg),
				None => {
					warn!("Mounted component {} had no subtree. Mounting afresh.", instance.name);
					mount_in(platform, &next, &instance.container, instance.svg)
				}
			};
			*instance.owner.borrow_mut() = next.rendered_node();
			instance.subtree = Some(next);
			instance.lifecycle.set(Lifecycle::Mounted);
			result
		}

		Lifecycle::Updating => Err(Error::ReentrantUpdate),

		Lifecycle::Destroyed => {
			warn!(component = instance.name, props = instance.props.len(), "Refusing to update an unmounted component.");
			Err(Error::InstanceDropped)
		}
	}
}
