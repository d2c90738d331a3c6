//! Checkout error types
//!
//! Every failure the checkout can run into resolves to a [`CheckoutError`],
//! which the component renders inline and hands to the `on_error` callback.

use wasm_bindgen::JsValue;

use crate::stripe::StripeError;

/// Error type for the intent initializer, the card widget and configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckoutError {
    /// The intent endpoint could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The intent endpoint answered with a non-2xx status.
    #[error("Server error: {0}")]
    Status(u16),

    /// The intent endpoint answered with a body we could not read.
    #[error("Bad JSON: {0}")]
    Decode(String),

    /// The intent endpoint answered with an empty client secret.
    #[error("Payment intent response carried no client secret")]
    EmptySecret,

    /// Stripe.js reported an error.
    #[error("{0}")]
    Stripe(StripeError),

    /// A browser API was missing or threw.
    #[error("Browser error: {0}")]
    Js(String),

    /// The checkout configuration is unusable.
    #[error("Invalid checkout configuration: {0}")]
    Config(String),
}

impl CheckoutError {
    /// Create a browser error from any type that implements ToString
    pub fn js(msg: impl ToString) -> Self {
        CheckoutError::Js(msg.to_string())
    }

    /// Create a configuration error from any type that implements ToString
    pub fn config(msg: impl ToString) -> Self {
        CheckoutError::Config(msg.to_string())
    }
}

impl From<StripeError> for CheckoutError {
    fn from(err: StripeError) -> Self {
        CheckoutError::Stripe(err)
    }
}

impl From<gloo_net::Error> for CheckoutError {
    fn from(err: gloo_net::Error) -> Self {
        match err {
            gloo_net::Error::SerdeError(e) => CheckoutError::Decode(e.to_string()),
            other => CheckoutError::Network(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CheckoutError {
    fn from(err: serde_json::Error) -> Self {
        CheckoutError::Decode(err.to_string())
    }
}

impl From<CheckoutError> for JsValue {
    fn from(err: CheckoutError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
