pub mod auth;
pub mod dto;
pub mod handlers;
pub mod routes;
pub mod server;

pub use server::HttpServer;
