pub mod compiler;
pub mod plan;
