//! stripe.rs
//!
//! High-level Rust API over the Stripe.js Card Element for Yew applications.
//!
//! This module provides:
//! - `CardElementOptions` to customize the style of the Card Element.
//! - `CardWidget::mount()` to initialize Stripe, create Elements, mount the Card Element
//!   and forward its `change` events as typed [`CardChangeEvent`]s.
//! - `CardWidget::confirm_card_payment()` (via [`PaymentConfirmer`]) to confirm a
//!   PaymentIntent with the card the customer typed, SCA/3DS handled by Stripe.js.
//! - `CardWidget::unmount()` for teardown.
//!
//! # Example Usage
//! ```rust,ignore
//! use yew_course_checkout::{CardWidget, CardElementOptions, PaymentConfirmer};
//!
//! let on_change = Callback::from(|ev: CardChangeEvent| tracing::debug!(empty = ev.empty));
//! let widget = CardWidget::mount("pk_test_...", &CardElementOptions::default(), "#card-element", on_change)?;
//! match widget.confirm_card_payment(&secret).await {
//!     Ok(info) => tracing::info!(id = %info.id, "paid"),
//!     Err(err) => tracing::warn!("declined: {}", err.message),
//! }
//! ```

use std::rc::Rc;

use async_trait::async_trait;
use gloo_utils::format::JsValueSerdeExt;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::js_sys::{Object, Reflect};
use yew::Callback;

use crate::bindings::{new_stripe, JsCardElement, JsElements, JsStripe};
use crate::intent::ClientSecret;
use crate::session::PaymentConfirmer;
use crate::validation::CardChangeEvent;

/// Customization for `elements.create("card", ...)`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardElementOptions {
    /// Stripe Elements style object (`base`, `invalid`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<JsonValue>,

    /// Hide the postal code field of the Card Element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_postal_code: Option<bool>,
}

/// Minimal information about a confirmed PaymentIntent.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PaymentIntentInfo {
    /// The PaymentIntent’s identifier (e.g. `pi_12345`).
    #[serde(default)]
    pub id: String,
    /// The final status (e.g. `"succeeded"`).
    #[serde(default)]
    pub status: String,
    /// Amount in the smallest currency unit.
    #[serde(default)]
    pub amount: u64,
    /// ISO currency code, lowercase as Stripe returns it.
    #[serde(default)]
    pub currency: String,
}

/// Structured representation of a Stripe.js error.
#[derive(Clone, Debug, PartialEq, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct StripeError {
    /// Human-readable message explaining what went wrong.
    pub message: String,
    /// Stripe’s error type (e.g. `"card_error"`).
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Optional Stripe error code (e.g. `"card_declined"`).
    #[serde(default)]
    pub code: Option<String>,
}

impl StripeError {
    /// An error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        StripeError {
            message: message.into(),
            error_type: None,
            code: None,
        }
    }
}

/// Shape of the object `confirmCardPayment` resolves with.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmCardPaymentResponse {
    #[serde(default)]
    error: Option<StripeError>,
    #[serde(default)]
    payment_intent: Option<PaymentIntentInfo>,
}

impl ConfirmCardPaymentResponse {
    fn into_result(self) -> Result<PaymentIntentInfo, StripeError> {
        match (self.error, self.payment_intent) {
            (Some(err), _) => Err(err),
            (None, Some(intent)) => Ok(intent),
            (None, None) => Err(StripeError::new(
                "Stripe returned neither an error nor a payment intent",
            )),
        }
    }
}

/// A mounted Stripe Card Element together with the Stripe instance that owns it.
///
/// Cloning is cheap: all handles are JS references and the change listener is
/// shared, so it stays alive as long as any clone does.
#[derive(Clone, Debug)]
pub struct CardWidget {
    stripe: JsStripe,
    _elements: JsElements,
    card: JsCardElement,
    _on_change: Rc<Closure<dyn FnMut(JsValue)>>,
}

impl CardWidget {
    /// Initialize Stripe.js, create Elements, and mount a Card Element.
    ///
    /// # Arguments
    /// - `publishable_key`: Your Stripe publishable key (e.g. `"pk_test_…"`)
    /// - `options`: style for the Card Element.
    /// - `selector`: CSS selector of the mount node (e.g. `"#card-element"`).
    /// - `on_change`: receives every `change` event of the Card Element.
    ///
    /// # Errors
    /// Returns a `StripeError` when Stripe.js is missing or rejects a call.
    pub fn mount(
        publishable_key: &str,
        options: &CardElementOptions,
        selector: &str,
        on_change: Callback<CardChangeEvent>,
    ) -> Result<Self, StripeError> {
        // 1) Create the Stripe instance
        let stripe = new_stripe(publishable_key).map_err(js_error_to_stripe_error)?;

        // 2) Initialize Elements
        let elements = stripe.elements().map_err(js_error_to_stripe_error)?;

        // 3) Create the Card Element; style must arrive as plain objects, not Maps
        let options_js = options
            .serialize(&Serializer::json_compatible())
            .map_err(|e| StripeError::new(e.to_string()))?;
        let card = elements
            .create_element("card", options_js)
            .map_err(js_error_to_stripe_error)?;

        // 4) Forward change events
        let listener = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            match from_value::<CardChangeEvent>(event) {
                Ok(change) => on_change.emit(change),
                Err(err) => tracing::warn!("unreadable card change event: {}", err),
            }
        });
        card.on("change", listener.as_ref().unchecked_ref())
            .map_err(js_error_to_stripe_error)?;

        // 5) Mount to DOM
        card.mount(selector).map_err(js_error_to_stripe_error)?;
        tracing::debug!(selector, "card element mounted");

        Ok(CardWidget {
            stripe,
            _elements: elements,
            card,
            _on_change: Rc::new(listener),
        })
    }

    /// Remove the Card Element from the DOM.
    pub fn unmount(&self) -> Result<(), StripeError> {
        self.card.unmount().map_err(js_error_to_stripe_error)
    }

    /// Build `{ payment_method: { card } }` for `confirmCardPayment`.
    fn payment_method_data(&self) -> Result<JsValue, StripeError> {
        let payment_method = Object::new();
        Reflect::set(&payment_method, &"card".into(), self.card.as_ref())
            .map_err(js_error_to_stripe_error)?;
        let data = Object::new();
        Reflect::set(&data, &"payment_method".into(), &payment_method)
            .map_err(js_error_to_stripe_error)?;
        Ok(data.into())
    }
}

#[async_trait(?Send)]
impl PaymentConfirmer for CardWidget {
    async fn confirm_card_payment(
        &self,
        secret: &ClientSecret,
    ) -> Result<PaymentIntentInfo, StripeError> {
        let data = self.payment_method_data()?;

        // Call stripe.confirmCardPayment(...)
        let promise = self
            .stripe
            .confirm_card_payment(secret.expose(), data)
            .map_err(js_error_to_stripe_error)?;

        // Await result; Stripe resolves (not rejects) with `{ error }` on declines
        let resolved = JsFuture::from(promise)
            .await
            .map_err(js_error_to_stripe_error)?;
        let response: ConfirmCardPaymentResponse = resolved
            .into_serde()
            .map_err(|e| StripeError::new(format!("Unreadable Stripe response: {}", e)))?;
        response.into_result()
    }
}

/// Convert any JS exception or Promise rejection into `StripeError`.
pub(crate) fn js_error_to_stripe_error(js_val: JsValue) -> StripeError {
    // Try structured error first
    if let Ok(err) = from_value::<StripeError>(js_val.clone()) {
        err
    } else {
        StripeError::new(js_val.as_string().unwrap_or_else(|| format!("{:?}", js_val)))
    }
}
