//! Command implementations.

mod info;
mod rays;
mod run;
mod validate;

pub use info::run_info;
pub use rays::run_rays;
pub use run::run_simulation;
pub use validate::run_validate;
