pub mod authorize;
pub mod diagnostics;
pub mod send;
