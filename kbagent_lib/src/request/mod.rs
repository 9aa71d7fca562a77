//! API transport.
mod client;
mod reqwest;

#[cfg(any(test, feature = "stub"))]
pub mod stub;

pub use client::Client;
pub use client::get_reqwest_client;
