pub mod model;
pub mod presets;
