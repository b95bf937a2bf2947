//! Glue for UI layers that render a projection of the store.
//!
//! A [`Selection`] only relies on the store's read and subscribe contract,
//! so any rendering framework can drive it: pass its re-render trigger as
//! the change callback and drop the selection when the component unmounts.

mod selection;

pub use selection::Selection;
