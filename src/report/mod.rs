pub mod destination;
pub mod generator;

pub use destination::ReportDestination;
pub use generator::{FileFailure, GenerationProgress, GenerationReport, ReportGenerator};
