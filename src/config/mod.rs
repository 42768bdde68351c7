pub mod types;
pub mod entities;
pub mod loader;
pub mod validator;

pub use types::*;
pub use entities::*;
pub use loader::*;
pub use validator::*;
