//! Records
//!
//! `RecordValidator` turns raw JSON into an immutable `Record`, or the first
//! `ValidationError` found. Computed fields are derived from a record on
//! access and never stored.

mod computed;
mod engine;
mod model;

pub use computed::resolve as resolve_computed;
pub use engine::RecordValidator;
pub use model::Record;

pub(crate) use computed::Num;
