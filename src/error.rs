use thiserror::Error;

/// Everything that can go wrong while mounting, patching or updating.
///
/// All failures are synchronous and local to the call that caused them.
/// The engine does not roll back partially applied mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	/// A `class` prop value was neither a string, a list nor a map.
	#[error("class value must be string, array, or mapping")]
	InvalidClassValue,

	/// A portal's selector did not match any node.
	#[error("portal target {0:?} not found")]
	MissingTarget(String),

	/// A portal vnode was created without a `target` prop.
	#[error("portal has no target")]
	MissingPortalTarget,

	/// A component's update was invoked while that same component was already rendering.
	#[error("component update re-entered while already updating")]
	ReentrantUpdate,

	/// An [`Updater`](`crate::Updater`) outlived the component instance it was created for.
	#[error("component instance was dropped")]
	InstanceDropped,

	/// The host platform refused an operation.
	#[error("platform error: {0}")]
	Platform(String),
}
