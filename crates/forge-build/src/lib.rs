//! Compile generated C/C++ projects and turn toolchain output into data.
//!
//! - **diagnostics**: greedy line classifier for GCC/Clang/MSVC compiler and linker output
//! - **gtest**: googletest console output parser
//! - **toolchain**: closed toolchain table and command assembly
//! - **sources**: source, header and test discovery
//! - **driver**: `Builder` running the compiler and test binaries through a `CommandRunner`

pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod gtest;
pub mod sources;
pub mod toolchain;

pub use diagnostics::{DiagnosticEntry, ParsedDiagnostics, Severity, Stage, parse_compiler_output};
pub use driver::{
    BuildReport, Builder, CommandRunner, ProcessOutput, SystemRunner, TestSourceReport,
    TestSuiteReport,
};
pub use error::BuildError;
pub use gtest::{GtestSummary, TestCaseDetail, TestStatus, parse_gtest_output};
pub use toolchain::{CompileCommand, Toolchain, ToolchainChoice};
