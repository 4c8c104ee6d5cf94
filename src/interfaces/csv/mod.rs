//! CSV interface: the operations file consumed by the CLI and the statistics report.

pub mod operation;
pub mod operation_reader;
pub mod stats_writer;
