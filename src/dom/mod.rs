pub mod dom_model;
pub mod mutation;
pub mod page;
pub mod snapshot;
