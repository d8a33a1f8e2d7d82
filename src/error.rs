use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Analysis diagnostics are **not** errors: mismatches and unresolvable values are reported
/// through [`crate::diagnostics::Diagnostic`] records and never abort a run. This enum covers
/// the failure modes of the machinery itself, e.g. a front end handing the engine a body that
/// references locals or blocks which do not exist.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::Malformed`] - A body or symbol table handed in by a front end is inconsistent
/// - [`Error::SymbolNotFound`] - A handle does not resolve in the supplied symbol store
#[derive(Error, Debug)]
pub enum Error {
    /// A body or symbol table handed to the engine is inconsistent.
    ///
    /// This error indicates the front end produced an operation stream that references
    /// locals, blocks, or parameter slots outside the declared ranges. The error includes
    /// the source location where the inconsistency was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A declaration handle could not be resolved in the supplied symbol store.
    ///
    /// Handles are only meaningful against the symbol table they were created from;
    /// mixing handles across tables is a front-end defect and surfaces here.
    #[error("Symbol handle could not be resolved - {0}")]
    SymbolNotFound(String),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
