pub mod consuming;
pub mod judging;
pub mod processing;
