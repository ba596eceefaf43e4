use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};
use twig_dom::{create_element, create_text_vnode, memory::MemoryDocument, memory::Mutation, Component, Error, Lifecycle, Tag, Updater};

use harness_::{only_child, setup, Props, VNode, Value};

#[derive(Default, Clone)]
struct Tracker {
	count: Rc<Cell<u32>>,
	renders: Rc<Cell<u32>>,
	mounted: Rc<Cell<u32>>,
	unmounted: Rc<Cell<u32>>,
	updater: Rc<RefCell<Option<Updater<MemoryDocument>>>>,
}

impl Tracker {
	fn updater(&self) -> Updater<MemoryDocument> {
		self.updater.borrow().clone().expect("not mounted")
	}
}

struct Counter(Tracker);

impl Component<MemoryDocument> for Counter {
	fn render(&mut self, props: &Props) -> VNode {
		self.0.renders.set(self.0.renders.get() + 1);
		create_element(
			"span",
			Some(Props::new().with("data-label", props.get("label").cloned().unwrap_or(Value::Null))),
			self.0.count.get().to_string(),
		)
	}

	fn mounted(&mut self, updater: &Updater<MemoryDocument>) {
		self.0.mounted.set(self.0.mounted.get() + 1);
		*self.0.updater.borrow_mut() = Some(updater.clone());
	}

	fn unmounted(&mut self) {
		self.0.unmounted.set(self.0.unmounted.get() + 1);
	}
}

fn counter(tracker: &Tracker, label: &str) -> VNode {
	let tracker = tracker.clone();
	create_element(Tag::stateful_with(move || Counter(tracker.clone())), Some(Props::new().with("label", label)), ())
}

#[test]
fn update_never_re_mounts() {
	let (mut renderer, container) = setup();
	let document = renderer.platform().clone();
	let tracker = Tracker::default();

	renderer.render(Some(counter(&tracker, "a")), &container).unwrap();
	let span = only_child(&document, container);
	assert_eq!(document.to_markup(span), r#"<span data-label="a">0</span>"#);
	assert_eq!((tracker.renders.get(), tracker.mounted.get()), (1, 1));
	assert_eq!(renderer.current(&container).and_then(VNode::rendered_node), Some(span));

	let updater = tracker.updater();
	assert_eq!(updater.lifecycle(), Some(Lifecycle::Mounted));
	document.clear_mutations();

	tracker.count.set(5);
	updater.update().unwrap();
	assert_eq!(only_child(&document, container), span);
	assert_eq!(document.to_markup(span), r#"<span data-label="a">5</span>"#);
	assert_eq!((tracker.renders.get(), tracker.mounted.get()), (2, 1));
	assert!(!document.mutations().iter().any(|mutation| matches!(mutation, Mutation::CreateElement { .. } | Mutation::CreateText { .. })));

	renderer.render(Some(counter(&tracker, "b")), &container).unwrap();
	assert_eq!(only_child(&document, container), span);
	assert_eq!(document.to_markup(span), r#"<span data-label="b">5</span>"#);
	assert_eq!((tracker.renders.get(), tracker.mounted.get(), tracker.unmounted.get()), (3, 1, 0));
}

#[test]
fn teardown_unmounts_and_drops() {
	let (mut renderer, container) = setup();
	let document = renderer.platform().clone();
	let tracker = Tracker::default();

	renderer.render(Some(create_element("section", None, counter(&tracker, "nested"))), &container).unwrap();
	let updater = tracker.updater();

	renderer.render(None, &container).unwrap();
	assert_eq!(tracker.unmounted.get(), 1);
	assert_eq!(document.inner_markup(container), "");
	assert_eq!(updater.lifecycle(), None);
	assert_eq!(updater.update(), Err(Error::InstanceDropped));
}

#[derive(Default)]
struct Other;

impl Component<MemoryDocument> for Other {
	fn render(&mut self, _: &Props) -> VNode {
		create_text_vnode("other")
	}
}

#[test]
fn tag_change_replaces_instance() {
	let (mut renderer, container) = setup();
	let document = renderer.platform().clone();
	let tracker = Tracker::default();

	renderer.render(Some(counter(&tracker, "a")), &container).unwrap();
	renderer.render(Some(create_element(Tag::stateful::<Other>(), None, ())), &container).unwrap();
	assert_eq!(tracker.unmounted.get(), 1);
	assert_eq!(document.inner_markup(container), "other");

	renderer.render(Some(counter(&tracker, "b")), &container).unwrap();
	assert_eq!(tracker.mounted.get(), 2);
	assert_eq!(document.inner_markup(container), r#"<span data-label="b">0</span>"#);
}

#[derive(Default)]
struct Reentrant {
	updater: Rc<RefCell<Option<Updater<MemoryDocument>>>>,
	nested: Rc<RefCell<Option<Result<(), Error>>>>,
}

impl Component<MemoryDocument> for Reentrant {
	fn render(&mut self, _: &Props) -> VNode {
		if let Some(updater) = &*self.updater.borrow() {
			*self.nested.borrow_mut() = Some(updater.update());
		}
		create_text_vnode("reentrant")
	}

	fn mounted(&mut self, updater: &Updater<MemoryDocument>) {
		*self.updater.borrow_mut() = Some(updater.clone());
	}
}

#[test]
fn reentrant_update_is_refused() {
	let (mut renderer, container) = setup();
	let updater = Rc::new(RefCell::new(None));
	let nested = Rc::new(RefCell::new(None));
	let tag = {
		let (updater, nested) = (Rc::clone(&updater), Rc::clone(&nested));
		Tag::stateful_with(move || Reentrant {
			updater: Rc::clone(&updater),
			nested: Rc::clone(&nested),
		})
	};

	renderer.render(Some(create_element(tag, None, ())), &container).unwrap();
	assert_eq!(*nested.borrow(), None);

	let outer: Updater<MemoryDocument> = updater.borrow().clone().unwrap();
	outer.update().unwrap();
	assert_eq!(*nested.borrow(), Some(Err(Error::ReentrantUpdate)));
	assert_eq!(outer.lifecycle(), Some(Lifecycle::Mounted));
}

#[derive(Default)]
struct Toggle(Rc<Cell<bool>>, Rc<RefCell<Option<Updater<MemoryDocument>>>>);

impl Component<MemoryDocument> for Toggle {
	fn render(&mut self, _: &Props) -> VNode {
		create_element(if self.0.get() { "em" } else { "span" }, None, ())
	}

	fn mounted(&mut self, updater: &Updater<MemoryDocument>) {
		*self.1.borrow_mut() = Some(updater.clone());
	}
}

#[test]
fn updater_refreshes_owner_node() {
	let (mut renderer, container) = setup();
	let document = renderer.platform().clone();
	let on = Rc::new(Cell::new(false));
	let updater = Rc::new(RefCell::new(None));
	let tag = {
		let (on, updater) = (Rc::clone(&on), Rc::clone(&updater));
		Tag::stateful_with(move || Toggle(Rc::clone(&on), Rc::clone(&updater)))
	};

	renderer.render(Some(create_element(tag, None, ())), &container).unwrap();
	let span = only_child(&document, container);

	on.set(true);
	let updater: Updater<MemoryDocument> = updater.borrow().clone().unwrap();
	updater.update().unwrap();
	let em = only_child(&document, container);
	assert_ne!(em, span);
	assert_eq!(document.tag_name(em).as_deref(), Some("em"));
	assert_eq!(renderer.current(&container).and_then(VNode::rendered_node), Some(em));
}

fn label(props: &Props) -> VNode {
	let text = match props.get("text") {
		Some(Value::Str(text)) => text.clone(),
		_ => String::new(),
	};
	create_element("b", None, text)
}

#[test]
fn functional_component_diffs_its_subtree() {
	let (mut renderer, container) = setup();
	let document = renderer.platform().clone();

	renderer
		.render(Some(create_element(Tag::functional(label), Some(Props::new().with("text", "one")), ())), &container)
		.unwrap();
	let b = only_child(&document, container);
	let text = only_child(&document, b);
	assert_eq!(renderer.current(&container).and_then(VNode::rendered_node), Some(b));
	document.clear_mutations();

	renderer
		.render(Some(create_element(Tag::functional(label), Some(Props::new().with("text", "two")), ())), &container)
		.unwrap();
	assert_eq!(only_child(&document, container), b);
	assert_eq!(document.mutations(), [Mutation::SetText { node: text, text: "two".to_owned() }]);
	assert_eq!(renderer.current(&container).and_then(VNode::rendered_node), Some(b));

	renderer.render(Some(create_element("b", None, "two")), &container).unwrap();
	assert_ne!(only_child(&document, container), b);
}

struct Watcher {
	updater: Option<Updater<MemoryDocument>>,
	seen: Rc<RefCell<Vec<Option<Lifecycle>>>>,
}

impl Watcher {
	fn note(&self) {
		if let Some(updater) = &self.updater {
			self.seen.borrow_mut().push(updater.lifecycle());
		}
	}
}

impl Component<MemoryDocument> for Watcher {
	fn render(&mut self, _: &Props) -> VNode {
		self.note();
		create_text_vnode("watched")
	}

	fn mounted(&mut self, updater: &Updater<MemoryDocument>) {
		self.updater = Some(updater.clone());
		self.note();
	}

	fn unmounted(&mut self) {
		self.note();
	}
}

#[test]
fn lifecycle_is_visible_from_hooks() {
	let (mut renderer, container) = setup();
	let seen = Rc::new(RefCell::new(Vec::new()));
	let tag = || {
		let seen = Rc::clone(&seen);
		Tag::stateful_with(move || Watcher {
			updater: None,
			seen: Rc::clone(&seen),
		})
	};

	renderer.render(Some(create_element(tag(), None, ())), &container).unwrap();
	assert_eq!(*seen.borrow(), [Some(Lifecycle::Mounted)]);

	renderer.render(Some(create_element(tag(), None, ())), &container).unwrap();
	renderer.render(None, &container).unwrap();
	assert_eq!(*seen.borrow(), [Some(Lifecycle::Mounted), Some(Lifecycle::Updating), Some(Lifecycle::Destroyed)]);
}
