mod bindings;
mod checkout_component;
mod components;
mod config;
mod error;
mod intent;
mod interop;
mod logging;
mod session;
mod stripe;
mod validation;

pub use bindings::*;
pub use checkout_component::*;
pub use components::*;
pub use config::*;
pub use error::*;
pub use intent::*;
pub use interop::*;
pub use logging::*;
pub use session::*;
pub use stripe::*;
pub use validation::*;
