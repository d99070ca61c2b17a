pub mod defaults;
pub mod editor;
pub mod identity;
pub mod render;
pub mod schema;
pub mod value;
