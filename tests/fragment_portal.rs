use twig_dom::{create_element, create_text_vnode, Error, Platform, Tag};

use harness_::{only_child, setup, Props, VNode, Value};

fn fragment(children: Vec<VNode>) -> VNode {
	create_element(Tag::fragment(), None, children)
}

#[test]
fn fragment_keeps_one_placeholder() {
	let (mut renderer, container) = setup();
	let document = renderer.platform().clone();

	renderer.render(Some(fragment(vec![])), &container).unwrap();
	let placeholder = only_child(&document, container);
	assert_eq!(document.text(placeholder).as_deref(), Some(""));
	assert_eq!(renderer.current(&container).and_then(VNode::rendered_node), Some(placeholder));

	renderer.render(Some(fragment(vec![create_text_vnode("a"), create_text_vnode("b")])), &container).unwrap();
	let children = document.children(container);
	assert_eq!(children.len(), 2);
	assert!(!children.contains(&placeholder));
	assert_eq!(document.inner_markup(container), "ab");
	assert_eq!(renderer.current(&container).and_then(VNode::rendered_node), Some(children[0]));

	renderer.render(Some(fragment(vec![create_text_vnode("c")])), &container).unwrap();
	let single = only_child(&document, container);
	assert_eq!(document.text(single).as_deref(), Some("c"));

	renderer.render(Some(fragment(vec![])), &container).unwrap();
	let placeholder = only_child(&document, container);
	assert_eq!(document.text(placeholder).as_deref(), Some(""));
	assert_eq!(renderer.current(&container).and_then(VNode::rendered_node), Some(placeholder));

	renderer.render(Some(fragment(vec![])), &container).unwrap();
	assert_eq!(only_child(&document, container), placeholder);

	renderer.render(None, &container).unwrap();
	assert!(document.children(container).is_empty());
}

fn portal(target: impl Into<Value>, children: Vec<VNode>) -> VNode {
	create_element(Tag::portal(), Some(Props::new().with("target", target.into())), children)
}

#[test]
fn portal_placement() {
	let (mut renderer, y) = setup();
	let document = renderer.platform().clone();
	let x = document.create_container(document.body(), "aside").unwrap();
	document.set_attribute(&x, "id", "modal").unwrap();

	renderer
		.render(Some(portal("#modal", vec![create_element("p", None, "a"), create_element("p", None, "b")])), &y)
		.unwrap();
	assert_eq!(document.inner_markup(x), "<p>a</p><p>b</p>");
	let placeholder = only_child(&document, y);
	assert_eq!(document.text(placeholder).as_deref(), Some(""));

	renderer.render(Some(portal("#modal", vec![create_element("p", None, "c")])), &y).unwrap();
	assert_eq!(document.inner_markup(x), "<p>c</p>");
	assert_eq!(only_child(&document, y), placeholder);

	renderer.render(None, &y).unwrap();
	assert!(document.children(x).is_empty());
	assert!(document.children(y).is_empty());
}

#[test]
fn portal_target_move() {
	let (mut renderer, y) = setup();
	let document = renderer.platform().clone();
	let x = document.create_container(document.body(), "aside").unwrap();
	let z = document.create_container(document.body(), "aside").unwrap();

	renderer.render(Some(portal(Value::Node(x), vec![create_element("p", None, "moving")])), &y).unwrap();
	let p = only_child(&document, x);

	renderer.render(Some(portal(Value::Node(z), vec![create_element("p", None, "moved")])), &y).unwrap();
	assert!(document.children(x).is_empty());
	assert_eq!(only_child(&document, z), p);
	assert_eq!(document.inner_markup(z), "<p>moved</p>");
	assert_eq!(document.children(y).len(), 1);

	renderer.render(None, &y).unwrap();
	assert!(document.children(z).is_empty());
}

#[test]
fn missing_targets() {
	let (mut renderer, container) = setup();

	let error = renderer.render(Some(portal("#nowhere", vec![create_text_vnode("lost")])), &container).unwrap_err();
	assert_eq!(error, Error::MissingTarget("#nowhere".to_owned()));
	assert!(renderer.current(&container).is_none());

	let untargeted = create_element(Tag::portal(), None, create_text_vnode("lost"));
	assert_eq!(renderer.render(Some(untargeted), &container), Err(Error::MissingPortalTarget));
}
