//! Record declaration macros

pub mod macros;
