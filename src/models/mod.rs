pub mod chat;
pub mod disease;
pub mod prediction;
pub mod review;
pub mod user;

pub use chat::*;
pub use disease::*;
pub use prediction::*;
pub use review::*;
pub use user::*;
