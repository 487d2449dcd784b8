pub mod resolver;
pub mod server;

pub use server::ServerConfig;
