//! Bearer-token models and the decoder that derives their expiry.

pub mod credential;
pub mod decoder;
pub mod secret;

pub use credential::*;
pub use decoder::*;
pub use secret::*;
