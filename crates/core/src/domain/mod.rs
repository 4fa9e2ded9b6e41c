pub mod billing;
pub mod intent;
