pub mod connection;
pub mod lifecycle;
pub mod protocol;
pub mod registry;
pub mod routing;
pub mod server;
