mod analyze;

pub use analyze::run_analysis;
