//! # tiascan-core
//!
//! A library for extracting project metadata from TIA Portal project
//! files without TIA Portal installed.
//!
//! The project's binary container (`System/PEData.plf`) is an
//! undocumented, versioned database. This crate does not decode it
//! authoritatively; instead it recovers what it can: embedded compressed
//! pages are located by speculative decompression, and structured records
//! (hardware, CPU configuration, libraries, block interfaces, timestamps)
//! are pulled out of those pages with pattern heuristics that tolerate an
//! unknown, evolving schema.
//!
//! ## Architecture
//!
//! - [`scanner`]: segment recovery from the opaque byte stream
//! - [`extract`]: per-record-type heuristic decoders
//! - [`model`]: the project model and its textual summary
//! - [`project`]: directory resolution, orchestration, aggregation
//! - [`plf`]: the container's fixed preamble
//! - [`xref`]: the companion relational database adapter
//! - [`error`]: error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use tiascan_core::ProjectReader;
//!
//! let reader = ProjectReader::new("/projects/Plant")?;
//! let info = reader.read();
//! print!("{}", info.summary());
//! # Ok::<(), tiascan_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod error;
pub mod extract;
pub mod model;
pub mod plf;
pub mod project;
pub mod scanner;
pub mod xref;

// Re-export primary types for convenience
pub use error::{Error, Result};
pub use model::{
    BlockMember, CpuInfo, DeviceInfo, LibraryRef, ProgramBlock, ProjectInfo, Section,
};
pub use project::ProjectReader;
pub use scanner::{scan_file, Scanner, ScannerConfig, Segment};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
