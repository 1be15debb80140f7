pub mod health;
pub mod diagnostics;
pub mod messages;
pub mod room_id;
pub mod edit;
pub mod terminal;

pub use health::*;
pub use diagnostics::*;
pub use messages::*;
pub use room_id::*;
pub use edit::*;
pub use terminal::*;
