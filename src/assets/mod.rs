pub mod decode;
pub mod store;
pub mod text;
