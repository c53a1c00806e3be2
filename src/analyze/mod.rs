pub mod client;
pub mod models;

pub use client::{AnalyzeClient, SensorApi};
pub use models::{Pipe, SensorDataFilters, SensorDescriptor, SensorRow};
