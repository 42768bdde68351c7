mod api;
mod common;

pub use api::{api_routes, app};
pub use common::common_routes;
