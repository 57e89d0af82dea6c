//! CSV scripting surface used by the `paygate` binary.

pub mod operation;
pub mod operation_reader;
pub mod order_writer;
