pub mod canvas;
pub mod history;
pub mod isometric;
pub mod text;
pub mod waterfall;
