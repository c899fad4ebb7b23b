// Middleware modules for the ClickShield backend

pub mod cors;

pub use cors::cors_middleware;
