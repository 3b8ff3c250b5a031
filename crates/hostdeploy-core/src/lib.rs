pub mod backup;
pub mod bundle;
pub mod config;
pub mod deploy;
pub mod env;
pub mod error;
pub mod io;
pub mod paths;
pub mod script;
pub mod state;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::DeployConfig;
pub use deploy::{DeployReport, Deployer, Status};
pub use error::{DeployError, Failure, Result, RollbackOutcome};
pub use state::DeploymentState;
