pub mod error;
pub mod io;
pub mod logger;
pub mod mode;
pub mod validation;
