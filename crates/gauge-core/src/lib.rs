pub mod aggregate;
pub mod config;
pub mod judge;
pub mod model;
pub mod pathquery;
pub mod pipeline;
pub mod precheck;
pub mod report;
pub mod scorers;
pub mod similarity;
pub mod thresholds;
