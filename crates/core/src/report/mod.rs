pub mod group;
pub mod render;
