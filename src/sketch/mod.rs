pub mod pack;
pub mod path;
pub mod stream;
pub mod stroke;
pub mod timing;
