//! Command implementations.

pub mod check;
pub mod load;

pub use self::check::execute_check;
pub use self::load::execute_load;
