pub mod observability;
pub mod stop_server;
