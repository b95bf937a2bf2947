//! State aggregates and the partial updates merged into them.
//!
//! - [`Aggregate`] - shallow merge contract implemented by every state type
//! - [`Update`] - a literal partial or a function of the previous state
//! - [`aggregate!`](crate::aggregate) - declares a struct and its partial
//! - `serde_json::Map` - a dynamically shaped aggregate

mod aggregate;
mod json;
mod macros;

pub use aggregate::{Aggregate, Update};
