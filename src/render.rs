use crate::{mount::mount_in, patch::patch_in, patch::remove, Error, Platform, VNode};
use tracing::{error, instrument, trace};

/// Renders vnode trees into containers, remembering what each container currently shows.
///
/// # Correct Use
///
/// The containers must not be modified by anything else between renders,
/// other than through component [`Updater`](`crate::Updater`)s of the rendered trees.
pub struct Renderer<P: Platform> {
	platform: P,
	/// Container identity to the vnode last rendered into it.
	rendered: Vec<(P::Node, VNode<P>)>,
}

impl<P: Platform> Renderer<P> {
	#[must_use]
	pub fn new(platform: P) -> Self {
		Self { platform, rendered: Vec::new() }
	}

	#[must_use]
	pub fn platform(&self) -> &P {
		&self.platform
	}

	/// Mounts, patches or tears down the content of `container`:
	///
	/// - nothing recorded, `vnode` present: mount and record it,
	/// - both present: patch the recorded vnode against `vnode` and record `vnode`,
	/// - recorded, `vnode` absent: detach the recorded tree and forget it,
	/// - neither: nothing.
	///
	/// # Errors
	///
	/// Whatever mounting, patching or detaching fails with.
	/// On failure the previously recorded vnode stays recorded, but the container's content is unspecified.
	#[instrument(skip(self, vnode))]
	pub fn render(&mut self, vnode: Option<VNode<P>>, container: &P::Node) -> Result<(), Error> {
		let index = self.rendered.iter().position(|(rendered_into, _)| rendered_into == container);
		let result = match (index, vnode) {
			(None, Some(next)) => mount_in(&self.platform, &next, container, false).map(|()| self.rendered.push((container.clone(), next))),
			(Some(index), Some(next)) => patch_in(&self.platform, &self.rendered[index].1, &next, container, false).map(|()| self.rendered[index].1 = next),
			(Some(index), None) => {
				let (_, prev) = self.rendered.swap_remove(index);
				remove(&self.platform, &prev, container)
			}
			(None, None) => {
				trace!("Nothing rendered before or now.");
				Ok(())
			}
		};
		if let Err(error) = &result {
			error!("Render failed: {}", error);
		}
		result
	}

	/// The vnode last rendered into `container`.
	#[must_use]
	pub fn current(&self, container: &P::Node) -> Option<&VNode<P>> {
		self.rendered.iter().find(|(rendered_into, _)| rendered_into == container).map(|(_, vnode)| vnode)
	}
}
