#![cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Split a lightbox caption from WebAssembly.
///
/// Takes the text of the widget's title field (may be empty) and of its
/// description field, and returns a JavaScript object with `title`, `meta`
/// and `kind`, or null on serialization failure.
///
/// # Examples (JavaScript)
/// ```javascript
/// import { split } from 'lightframe-caption';
///
/// const caption = split("", "Sunset over the bay\nJuly 4, 2021 • Harbor");
/// console.log(caption.title); // "Sunset over the bay"
/// console.log(caption.meta);  // "July 4, 2021 • Harbor"
/// ```
#[wasm_bindgen]
pub fn split(raw_title: &str, raw_body: &str) -> JsValue {
    let caption = crate::split_caption(raw_title, raw_body);
    serde_wasm_bindgen::to_value(&caption).unwrap_or(JsValue::NULL)
}
