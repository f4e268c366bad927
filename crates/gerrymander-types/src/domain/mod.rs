pub mod account;
pub mod change;
pub mod event;

pub use account::*;
pub use change::*;
pub use event::*;
