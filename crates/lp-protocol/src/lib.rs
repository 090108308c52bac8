pub mod chat;
pub mod intent;
pub mod order;
pub mod technician;

pub use chat::*;
pub use intent::*;
pub use order::*;
pub use technician::*;
