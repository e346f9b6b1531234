mod response;
mod routes;

pub use response::{ApiResponse, NoContentResponse};
pub use routes::RouteModule;
