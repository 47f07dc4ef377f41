//! Validation stages
//!
//! - `field`: per-field constraints
//! - `cross_field`: invariants over the whole record
//! - `transform`: normalizations applied after validation
//!
//! Every stage is a pure function of its inputs and fails fast.

mod cross_field;
mod errors;
mod field;
pub mod transform;
mod value;

pub use cross_field::CrossFieldValidator;
pub use errors::{ValidationError, ValidationResult};
pub use field::FieldValidator;
pub use transform::verify_secret;
pub use value::{
    compare, compare_typed, display_path, format_datetime, index_path, is_missing,
    json_type_name, make_path, parse_datetime, values_equal,
};
