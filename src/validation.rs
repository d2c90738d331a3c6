//! Bridge from Card Element `change` events to local form state.
//!
//! Card validation itself happens inside Stripe's iframe; this module only
//! projects what the widget reports.

use serde::Deserialize;

/// Error payload attached to a card change event.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CardInputError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// A `change` event emitted by the Stripe Card Element.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardChangeEvent {
    /// `true` when the card field holds no input.
    pub empty: bool,
    /// `true` when every part of the card field is filled in and valid.
    #[serde(default)]
    pub complete: bool,
    /// Detected card brand, e.g. `"visa"`.
    #[serde(default)]
    pub brand: Option<String>,
    /// Validation error for the current input, if any.
    #[serde(default)]
    pub error: Option<CardInputError>,
}

/// What the form knows about the card field.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationState {
    /// Submission is blocked because the card field is empty.
    pub disabled: bool,
    /// Message to show under the card field; empty when there is none.
    pub error_message: String,
}

impl Default for ValidationState {
    /// The card field starts out empty.
    fn default() -> Self {
        ValidationState {
            disabled: true,
            error_message: String::new(),
        }
    }
}

impl ValidationState {
    /// Overwrite the state with the latest event.
    pub fn apply(&mut self, event: &CardChangeEvent) {
        self.disabled = event.empty;
        self.error_message = event
            .error
            .as_ref()
            .map(|err| err.message.clone())
            .unwrap_or_default();
    }

    pub fn has_error(&self) -> bool {
        !self.error_message.is_empty()
    }
}
