pub mod input;
pub mod particles;
pub mod recycler;
pub mod scene;
