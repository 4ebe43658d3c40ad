pub mod file_logger;
pub mod log;

pub use log::init_logging;
