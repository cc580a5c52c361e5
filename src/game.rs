pub mod autoplay;
pub mod judgment;
pub mod node;
pub mod parsing;
pub mod player;
pub mod rail;
pub mod scheduler;
pub mod session;
