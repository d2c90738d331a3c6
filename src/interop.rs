//! interop.rs
//!
//! Custom Yew hook to load Stripe.js v3 at runtime (no inline JS).
//!
//! # Overview
//! `use_stripejs(src)` injects a single
//! `<script id="stripejs-sdk" src="{src}" defer>`
//! into `<head>` on first use and reports [`StripeJsStatus::Loading`]
//! until the script’s `load` event fires, then [`StripeJsStatus::Ready`].
//! A script that fails to download (`error` event) or cannot be
//! injected reports [`StripeJsStatus::Failed`].
//! A component mounting while another one's script is still
//! downloading waits on the same `<script>` element.
//!
//! # Usage
//! ```rust,ignore
//! use yew::prelude::*;
//! use yew_course_checkout::use_stripejs;
//!
//! #[function_component(App)]
//! fn app() -> Html {
//!     match use_stripejs("https://js.stripe.com/v3/") {
//!         StripeJsStatus::Ready => html! { <p>{"✅ Stripe.js loaded"}</p> },
//!         StripeJsStatus::Loading => html! { <p>{"⏳ Loading Stripe.js..."}</p> },
//!         StripeJsStatus::Failed => html! { <p>{"❌ Stripe.js unavailable"}</p> },
//!     }
//! }
//! ```

use wasm_bindgen::{prelude::Closure, JsCast, JsValue};
use web_sys::js_sys::Reflect;
use web_sys::{Document, HtmlScriptElement};
use yew::functional::hook;
use yew::prelude::*;

use crate::error::CheckoutError;
use crate::stripe::StripeError;

/// Id of the injected `<script>` element.
pub const STRIPE_SCRIPT_ID: &str = "stripejs-sdk";

/// Where loading Stripe.js got to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StripeJsStatus {
    Loading,
    Ready,
    Failed,
}

impl StripeJsStatus {
    pub fn is_ready(self) -> bool {
        self == StripeJsStatus::Ready
    }
}

/// The error reported when Stripe.js from `src` is unavailable.
pub fn stripe_js_unavailable(src: &str) -> StripeError {
    StripeError::new(format!("Stripe.js could not be loaded from {}", src))
}

/// `true` once `window.Stripe` exists.
fn stripe_global_present() -> bool {
    web_sys::window()
        .and_then(|win| Reflect::has(&win, &JsValue::from_str("Stripe")).ok())
        .unwrap_or(false)
}

/// Find the Stripe.js `<script>`, inserting it into `<head>` if missing.
fn find_or_insert_script(document: &Document, src: &str) -> Result<HtmlScriptElement, CheckoutError> {
    if let Some(existing) = document.get_element_by_id(STRIPE_SCRIPT_ID) {
        return existing
            .dyn_into::<HtmlScriptElement>()
            .map_err(|_| CheckoutError::js(format!("#{} is not a <script>", STRIPE_SCRIPT_ID)));
    }

    let script: HtmlScriptElement = document
        .create_element("script")
        .map_err(|e| CheckoutError::js(format!("{:?}", e)))?
        .dyn_into()
        .map_err(|_| CheckoutError::js("created element is not a <script>"))?;
    script.set_id(STRIPE_SCRIPT_ID);
    script.set_src(src);
    script.set_defer(true);

    document
        .head()
        .ok_or_else(|| CheckoutError::js("document has no <head>"))?
        .append_child(&script)
        .map_err(|e| CheckoutError::js(format!("{:?}", e)))?;
    tracing::debug!(src, "injected Stripe.js");
    Ok(script)
}

/// Custom hook: load Stripe.js exactly once per page and track its status.
///
/// # Returns
/// - `Loading` while the `<script>` is being fetched & parsed.
/// - `Ready` once `window.Stripe` exists.
/// - `Failed` if the script could not be injected or fired `error` (logged).
#[hook]
pub fn use_stripejs(src: &str) -> StripeJsStatus {
    let status = use_state(|| {
        if stripe_global_present() {
            StripeJsStatus::Ready
        } else {
            StripeJsStatus::Loading
        }
    });

    {
        let status = status.clone();
        use_effect_with(src.to_owned(), move |src| {
            if !status.is_ready() {
                let script = web_sys::window()
                    .and_then(|win| win.document())
                    .ok_or_else(|| CheckoutError::js("no document"))
                    .and_then(|document| find_or_insert_script(&document, src));

                match script {
                    Ok(script) => {
                        // Each runs at most once, then is freed by the JS GC
                        let on_load = {
                            let status = status.clone();
                            Closure::once_into_js(move || status.set(StripeJsStatus::Ready))
                        };
                        let on_error = {
                            let src = src.clone();
                            Closure::once_into_js(move || {
                                tracing::error!("Stripe.js failed to load from {}", src);
                                status.set(StripeJsStatus::Failed);
                            })
                        };
                        for (event, listener) in [("load", on_load), ("error", on_error)] {
                            if let Err(e) =
                                script.add_event_listener_with_callback(event, listener.unchecked_ref())
                            {
                                tracing::error!("cannot watch Stripe.js {}: {:?}", event, e);
                            }
                        }
                    }
                    Err(err) => {
                        tracing::error!("cannot load Stripe.js: {}", err);
                        status.set(StripeJsStatus::Failed);
                    }
                }
            }
            || ()
        });
    }

    *status
}
