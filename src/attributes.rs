use crate::{logging::Content, Error, Platform, PropValue, Props};
use std::collections::BTreeMap;
use tracing::{trace, warn};

/// Applies a single prop transition (`prev` to `next`) onto `node`.
///
/// Mounting passes [`None`] as `prev`. Patching passes [`None`] as `next` for removed keys.
///
/// - `style` sets every style in `next` and clears the ones only in `prev`.
/// - `class` is normalized through [`normalize_class`].
/// - `on*` keys swap event listeners, bound to the lower-cased name after the prefix.
/// - `value`, `type`, `checked`, `selected`, `muted` and keys with an uppercase letter are node properties.
/// - Everything else is a string attribute.
///
/// # Errors
///
/// [`Error::InvalidClassValue`] for malformed `class` values, and whatever the platform reports.
pub fn apply_prop<P: Platform>(platform: &P, node: &P::Node, key: &str, prev: Option<&PropValue<P>>, next: Option<&PropValue<P>>) -> Result<(), Error> {
	match key {
		"style" => patch_style(platform, node, prev, next),

		"class" => match next {
			Some(PropValue::Null) | None => platform.remove_attribute(node, "class"),
			Some(value) => platform.set_attribute(node, "class", &normalize_class(value)?),
		},

		_ if is_event(key) => {
			let event = event_name(key);
			match prev {
				Some(PropValue::Listener(listener)) => platform.remove_event_listener(node, &event, listener)?,
				Some(PropValue::Null) | None => (),
				Some(other) => warn!("Previous value of event prop {:?} was not a listener: {:?}", key, other),
			}
			match next {
				Some(PropValue::Listener(listener)) => platform.add_event_listener(node, &event, listener),
				Some(PropValue::Null) | None => Ok(()),
				Some(other) => {
					warn!("Ignoring non-listener value for event prop {:?}: {:?}", key, other);
					Ok(())
				}
			}
		}

		_ if is_dom_property(key) => match next {
			Some(value) => platform.set_property(node, key, value),
			None => platform.remove_property(node, key),
		},

		_ => match next.and_then(PropValue::to_attribute_value) {
			Some(value) => {
				trace!(key, value = ?Content(&value), "Setting attribute.");
				platform.set_attribute(node, key, &value)
			}
			None => platform.remove_attribute(node, key),
		},
	}
}

/// Unbinds every `on*` listener in `props` from `node`, which is leaving the tree.
pub(crate) fn unbind_listeners<P: Platform>(platform: &P, node: &P::Node, props: &Props<P>) -> Result<(), Error> {
	for (key, value) in props.iter() {
		if let PropValue::Listener(listener) = value {
			if is_event(key) {
				trace!(key, ?listener, "Unbinding listener.");
				platform.remove_event_listener(node, &event_name(key), listener)?;
			}
		}
	}
	Ok(())
}

fn is_event(key: &str) -> bool {
	key.len() > 2 && key.starts_with("on")
}

fn event_name(key: &str) -> String {
	key[2..].to_ascii_lowercase()
}

fn is_dom_property(key: &str) -> bool {
	matches!(key, "value" | "type" | "checked" | "selected" | "muted") || key.bytes().any(|b| b.is_ascii_uppercase())
}

fn style_map<'a, P: Platform>(key: &str, value: Option<&'a PropValue<P>>) -> Option<&'a BTreeMap<String, PropValue<P>>> {
	match value {
		Some(PropValue::Map(styles)) => Some(styles),
		Some(PropValue::Null) | None => None,
		Some(other) => {
			warn!("Ignoring non-map {} style value: {:?}", key, other);
			None
		}
	}
}

fn patch_style<P: Platform>(platform: &P, node: &P::Node, prev: Option<&PropValue<P>>, next: Option<&PropValue<P>>) -> Result<(), Error> {
	let prev = style_map("previous", prev);
	let next = style_map("next", next);

	if let Some(next) = next {
		for (name, value) in next {
			match value.to_attribute_value() {
				Some(value) => platform.set_style(node, name, &value)?,
				None => platform.remove_style(node, name)?,
			}
		}
	}

	if let Some(prev) = prev {
		for name in prev.keys() {
			if !next.map_or(false, |next| next.contains_key(name)) {
				platform.remove_style(node, name)?;
			}
		}
	}
	Ok(())
}

/// Flattens a `class` prop into a newline-separated class list.
///
/// Strings are kept as they are, lists are flattened recursively and maps contribute their keys with truthy values.
///
/// # Errors
///
/// [`Error::InvalidClassValue`] for any other value, also when nested.
pub fn normalize_class<P: Platform>(value: &PropValue<P>) -> Result<String, Error> {
	match value {
		PropValue::Str(class) => Ok(class.clone()),
		PropValue::List(items) => Ok(items
			.iter()
			.map(normalize_class)
			.collect::<Result<Vec<_>, _>>()?
			.into_iter()
			.filter(|class| !class.is_empty())
			.collect::<Vec<_>>()
			.join("\n")),
		PropValue::Map(entries) => Ok(entries
			.iter()
			.filter(|(_, enabled)| enabled.is_truthy())
			.map(|(class, _)| class.as_str())
			.collect::<Vec<_>>()
			.join("\n")),
		_ => Err(Error::InvalidClassValue),
	}
}
