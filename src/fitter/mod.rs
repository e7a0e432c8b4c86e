pub mod common;
pub mod fit_engine;
pub mod models;
pub mod report;
pub mod solver;
