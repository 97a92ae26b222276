pub mod bluegreen;
pub mod monitor;
pub mod rolling;
