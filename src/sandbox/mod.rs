pub mod docker;
pub mod runner;
#[cfg(test)]
pub mod stubs;
pub mod traits;
