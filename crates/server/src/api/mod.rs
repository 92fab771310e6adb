pub mod handlers;
pub mod middleware;
pub mod predict;
pub mod routes;
pub mod runs;
pub mod train;

pub use routes::create_router;
