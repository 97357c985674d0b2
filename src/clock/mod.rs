pub mod canvas;
pub mod face;
