pub mod handlers;
pub mod server;

pub use handlers::ErrorResponse;
pub use server::ApiServer;
