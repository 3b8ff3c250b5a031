pub mod deploy;
pub mod rollback;
pub mod status;
pub mod validate;
