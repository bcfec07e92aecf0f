//! Conversions between the browser's fetch objects and the neutral model.

use std::collections::HashMap;

use js_sys::{Array, Reflect, Uint8Array};
use pwa_core::{Method, Request, RequestDestination, RequestMode, Response, ResponseType};
use url::Url;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// Best-effort message of a thrown JS value.
pub fn js_error(value: JsValue) -> String {
    if let Some(message) = value.as_string() {
        return message;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{:?}", value)
}

/// Read a string property.
pub fn js_string(target: &JsValue, key: &str) -> Option<String> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .and_then(|value| value.as_string())
}

/// Await a promise, mapping rejection to its message.
pub async fn resolve(promise: js_sys::Promise) -> Result<JsValue, String> {
    JsFuture::from(promise).await.map_err(js_error)
}

fn read_headers(headers: &web_sys::Headers) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let Ok(Some(entries)) = js_sys::try_iter(headers) else {
        return out;
    };
    for entry in entries.flatten() {
        let pair = Array::from(&entry);
        if let (Some(key), Some(value)) = (pair.get(0).as_string(), pair.get(1).as_string()) {
            out.insert(key, value);
        }
    }
    out
}

/// Convert an intercepted request. The body is not read; only GET is intercepted.
pub fn from_web_request(request: &web_sys::Request) -> Result<Request, String> {
    let url = Url::parse(&request.url()).map_err(|e| e.to_string())?;
    let method = Method::from_bytes(request.method().as_bytes()).map_err(|e| e.to_string())?;

    let mode = match js_string(request, "mode").as_deref() {
        Some("navigate") => RequestMode::Navigate,
        Some("same-origin") => RequestMode::SameOrigin,
        Some("no-cors") => RequestMode::NoCors,
        _ => RequestMode::Cors,
    };
    let destination = js_string(request, "destination")
        .map(|value| RequestDestination::from_platform(&value))
        .unwrap_or_default();

    let mut converted = Request::new(method, url)
        .with_mode(mode)
        .with_destination(destination);
    converted.headers = read_headers(&request.headers());
    Ok(converted)
}

/// Build a browser request. Navigation mode cannot be constructed, so it is dropped.
pub fn to_web_request(request: &Request) -> Result<web_sys::Request, String> {
    let init = web_sys::RequestInit::new();
    init.set_method(request.method.as_str());

    let headers = web_sys::Headers::new().map_err(js_error)?;
    for (key, value) in &request.headers {
        headers.set(key, value).map_err(js_error)?;
    }
    init.set_headers(&headers);

    if let Some(body) = &request.body {
        init.set_body(&Uint8Array::from(body.as_slice()));
    }

    web_sys::Request::new_with_str_and_init(request.url.as_str(), &init).map_err(js_error)
}

/// Read a browser response fully into the neutral model.
pub async fn from_web_response(response: web_sys::Response) -> Result<Response, String> {
    let response_type = js_string(&response, "type")
        .map(|value| ResponseType::from_platform(&value))
        .unwrap_or_default();

    let body = match response.array_buffer() {
        Ok(promise) => Uint8Array::new(&resolve(promise).await?).to_vec(),
        Err(e) => return Err(js_error(e)),
    };

    Ok(Response {
        status: response.status(),
        response_type,
        url: Url::parse(&response.url()).ok(),
        headers: read_headers(&response.headers()),
        body,
    })
}

/// Build a browser response from the neutral model.
pub fn to_web_response(response: &Response) -> Result<web_sys::Response, String> {
    let init = web_sys::ResponseInit::new();
    init.set_status(response.status);

    let headers = web_sys::Headers::new().map_err(js_error)?;
    for (key, value) in &response.headers {
        headers.set(key, value).map_err(js_error)?;
    }
    init.set_headers(&headers);

    if response.body.is_empty() {
        return web_sys::Response::new_with_opt_buffer_source_and_init(None, &init)
            .map_err(js_error);
    }
    let bytes = Uint8Array::from(response.body.as_slice());
    let body: &js_sys::Object = &bytes;
    web_sys::Response::new_with_opt_buffer_source_and_init(Some(body), &init).map_err(js_error)
}

/// Resolve a JS value that should be a `Response`.
pub fn as_web_response(value: JsValue) -> Option<web_sys::Response> {
    if value.is_undefined() || value.is_null() {
        return None;
    }
    value.dyn_into::<web_sys::Response>().ok()
}
