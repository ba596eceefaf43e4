#![cfg(target_arch = "wasm32")]

use twig_dom::{create_element, create_text_vnode, web::WebPlatform, PropValue, Props, Renderer, Tag};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{Element, Node};

wasm_bindgen_test_configure!(run_in_browser);

fn container(platform: &WebPlatform) -> Element {
	let document = platform.document();
	let container = document.create_element("div").unwrap();
	document.body().unwrap().append_child(&container).unwrap();
	container
}

#[wasm_bindgen_test]
fn text_create_diff_remove() {
	let platform = WebPlatform::from_window().unwrap();
	let container = container(&platform);
	let node: Node = container.clone().into();
	let mut renderer = Renderer::new(platform);

	renderer.render(Some(create_text_vnode("Hello twig-dom!")), &node).unwrap();
	assert_eq!(container.inner_html(), "Hello twig-dom!");
	let text = container.first_child().unwrap();

	renderer.render(Some(create_text_vnode("Hello again!")), &node).unwrap();
	assert_eq!(container.inner_html(), "Hello again!");
	assert_eq!(container.first_child().unwrap(), text);

	renderer.render(None, &node).unwrap();
	assert_eq!(container.child_nodes().length(), 0);
}

#[wasm_bindgen_test]
fn element_props() {
	let platform = WebPlatform::from_window().unwrap();
	let container = container(&platform);
	let node: Node = container.clone().into();
	let mut renderer = Renderer::new(platform);

	renderer
		.render(
			Some(create_element(
				"input",
				Some(
					Props::new()
						.with("class", PropValue::<WebPlatform>::list(vec!["a", "b"]))
						.with("style", PropValue::<WebPlatform>::map(vec![("color", "red")]))
						.with("value", "typed")
						.with("data-x", "1"),
				),
				(),
			)),
			&node,
		)
		.unwrap();

	let input = container.first_element_child().unwrap();
	assert_eq!(input.get_attribute("class").as_deref(), Some("a\nb"));
	assert_eq!(input.get_attribute("data-x").as_deref(), Some("1"));
	assert_eq!(input.get_attribute("value"), None);
	assert_eq!(js_sys::Reflect::get(&input, &"value".into()).unwrap().as_string().as_deref(), Some("typed"));
	assert!(input.get_attribute("style").unwrap().contains("red"));

	renderer.render(None, &node).unwrap();
}

#[wasm_bindgen_test]
fn svg_namespace() {
	let platform = WebPlatform::from_window().unwrap();
	let container = container(&platform);
	let node: Node = container.clone().into();
	let mut renderer = Renderer::new(platform);

	renderer.render(Some(create_element("svg", None, create_element("circle", None, ()))), &node).unwrap();
	let svg = container.first_element_child().unwrap();
	let circle = svg.first_element_child().unwrap();
	assert_eq!(svg.namespace_uri().as_deref(), Some("http://www.w3.org/2000/svg"));
	assert_eq!(circle.namespace_uri().as_deref(), Some("http://www.w3.org/2000/svg"));
	assert!(circle.dyn_ref::<web_sys::HtmlElement>().is_none());
}

#[wasm_bindgen_test]
fn portal_into_body() {
	let platform = WebPlatform::from_window().unwrap();
	let target = container(&platform);
	target.set_id("portal-target");
	let host = container(&platform);
	let node: Node = host.clone().into();
	let mut renderer = Renderer::new(platform);

	renderer
		.render(Some(create_element(Tag::portal(), Some(Props::new().with("target", "#portal-target")), create_element("p", None, "ported"))), &node)
		.unwrap();
	assert_eq!(target.inner_html(), "<p>ported</p>");
	assert_eq!(host.child_nodes().length(), 1);
	assert_eq!(host.inner_html(), "");
}
