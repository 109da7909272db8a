//! Component identifiers, redacted secrets, and the credential models the broker hands out.

pub mod credentials;
pub mod id;
pub mod secret;

pub use credentials::*;
pub use id::*;
pub use secret::*;
