pub mod regression;

pub use regression::{evaluate, predict, rmse};
