use core::fmt::{self, Debug, Formatter};

/// Wraps page content for log fields.
///
/// Without the `dangerous-logging` feature, only the length is written out.
pub(crate) struct Content<'a>(pub &'a str);

impl Debug for Content<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if cfg!(feature = "dangerous-logging") {
			Debug::fmt(self.0, f)
		} else {
			write!(f, "<{} bytes>", self.0.len())
		}
	}
}
