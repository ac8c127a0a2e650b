pub mod field_model;
pub mod identifiers;
pub mod setter;
pub mod visibility;
