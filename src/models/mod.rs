mod activation;
mod audit_log;
mod customer;
mod license;
mod release;

pub use activation::*;
pub use audit_log::*;
pub use customer::*;
pub use license::*;
pub use release::*;
