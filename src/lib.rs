//! Core library for the report-compare command line application.
//!
//! The library compares two report definitions and, when they overlap enough,
//! records both reports and their overlap in a merged workbook. Format readers
//! and workbook adapters live under [`io`], the shared records inside
//! [`model`], scoring in [`similarity`], the merge decision in [`assemble`],
//! the owned workbook handle in [`workbook`] and the orchestration under
//! [`compare`].

pub mod assemble;
pub mod compare;
pub mod error;
pub mod io;
pub mod model;
pub mod similarity;
pub mod workbook;

pub use compare::{ComparisonOutcome, append_row, compare, compare_into};
pub use error::{ErrorKind, Result, ToolError};
