pub mod fps;
pub mod layout;
pub mod muloop;

pub use fps::FpsWindow;
pub use layout::{fit_container, stream_size};
pub use muloop::{LoopBudget, LoopMode, StopHandle};
