//! Warden Core
//!
//! Shared vocabulary for the restriction engine: typed identifiers, the
//! invocation context handed to predicates, and the [`Restriction`] trait
//! every predicate implements.

pub mod context;
pub mod error;
pub mod traits;
pub mod types;

pub use context::*;
pub use error::*;
pub use traits::*;
pub use types::*;
