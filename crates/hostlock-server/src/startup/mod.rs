//! Server startup: logging, HTTP binding, and shutdown handling

pub mod http;
pub mod logging;
pub mod shutdown;

pub use http::run_server;
pub use logging::init_logging;
pub use shutdown::shutdown_signal;
