pub mod constraint;
pub mod context;
pub mod request;
pub mod settings;
pub mod slot;
pub mod weights;
