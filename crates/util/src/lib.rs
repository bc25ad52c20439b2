pub mod config;
pub mod date_handling;
pub mod query_string;
pub mod text_processing;

pub use config::*;
pub use date_handling::*;
pub use query_string::*;
pub use text_processing::*;
