pub mod error;
pub mod field_compare;
