mod auth;
mod json;

pub use auth::{BearerToken, CurrentUser};
pub use json::{batch_items, JsonObject};
