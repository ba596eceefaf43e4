#![cfg(target_arch = "wasm32")]

use std::{cell::RefCell, rc::Rc};
use twig_dom::{create_element, web::WebPlatform, Listener, Props, Renderer};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

#[wasm_bindgen_test]
fn click() {
	unsafe {
		if !LOG_INITIALIZED {
			//TODO: Fail on Warning or Error.
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}

	let platform = WebPlatform::from_window().unwrap();
	let body = platform.document().body().unwrap();
	let mut renderer = Renderer::new(platform.clone());

	let click_count = Rc::new(RefCell::new(0));
	let listener = Listener::<WebPlatform>::new({
		let click_count = Rc::clone(&click_count);
		move |event| {
			let event: &JsValue = event.as_ref();
			event.dyn_ref::<web_sys::Event>().expect("Expected Event but received something else.");
			*click_count.borrow_mut() += 1;
		}
	});

	let vdom = || create_element("BUTTON", Some(Props::new().with("id", "test-button").with("onClick", listener.clone())), ());

	assert_eq!(*click_count.borrow(), 0);
	renderer.render(Some(vdom()), &body.clone().into()).unwrap();
	assert_eq!(*click_count.borrow(), 0);
	assert_eq!(platform.live_listener_count(), 1);

	let button: HtmlElement = window().unwrap().document().unwrap().get_element_by_id("test-button").unwrap().dyn_into().unwrap();
	button.click();
	assert_eq!(*click_count.borrow(), 1);

	renderer.render(Some(vdom()), &body.clone().into()).unwrap();
	button.click();
	assert_eq!(*click_count.borrow(), 2);
	assert_eq!(platform.live_listener_count(), 1);

	renderer.render(None, &body.into()).unwrap();
	assert!(button.parent_node().is_none());
	assert_eq!(platform.live_listener_count(), 0);
	button.click();
	assert_eq!(*click_count.borrow(), 2);
}
