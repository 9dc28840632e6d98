#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod constants;
pub mod credentials;
pub mod error;
pub mod provisioner;
pub mod store;
pub mod template;
pub mod version;

pub use crate::credentials::*;
pub use crate::error::*;
pub use crate::provisioner::*;
pub use crate::store::*;
pub use crate::version::*;
