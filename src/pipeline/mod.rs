//! End-to-end workflows over flat files.
//!
//! Each processor takes its input paths, validates that they exist, applies a
//! [`crate::config::ProcessorConfig`] and returns a report describing what
//! was read, dropped and written. Reporting to the terminal is left to the
//! caller.

pub mod alignment;
pub mod conversion;
pub mod correlation;
pub mod directions;
pub mod index;
pub mod timeline;

pub use alignment::{AlignmentProcessor, AlignmentReport, PointSummary};
pub use conversion::{ResampleProcessor, ResampleReport};
pub use correlation::{CorrelationProcessor, CorrelationReport};
pub use directions::{DirectionHistogramProcessor, DirectionReport};
pub use index::{IndexProcessor, IndexReport};
pub use timeline::{TimelineProcessor, TimelineReport};

#[cfg(test)]
mod tests;
