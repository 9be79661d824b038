#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! # datamorph
//!
//! Tabular data conversion and cleaning. Reads CSV, Excel and JSON into an
//! Arrow-backed [`Table`], optionally runs a cleaning pipeline over it, and
//! writes any of the same formats back out, with a Markdown report of every
//! change made along the way.
//!
//! ## Example
//!
//! ```no_run
//! use datamorph::{Cleaner, Table};
//!
//! # fn main() -> datamorph::Result<()> {
//! let table = Table::read("sales.csv")?;
//! let (cleaned, summary) = Cleaner::new().clean(&table)?;
//! println!("removed {} duplicate rows", summary.duplicates_removed);
//! cleaned.write("sales.json")?;
//! # Ok(())
//! # }
//! ```

pub mod clean;
pub mod error;
pub mod infer;
pub mod repair;
pub mod report;
pub mod table;

pub use clean::{CleanSummary, Cleaner};
pub use error::{Error, Result};
pub use infer::{SemanticType, TypeDetector};
pub use report::{build_report, ReportContext};
pub use table::{CsvOptions, JsonOptions, Table};
