/*!

  Errors raised while building, checking, or reporting on a netlist.

*/

/// Errors that can occur when constructing a netlist or handling its inputs and outputs.
#[derive(Debug, thiserror::Error)]
pub enum NetlistError {
    /// An instance with this name is already registered.
    #[error("duplicate instance name '{0}'")]
    DuplicateInstance(String),

    /// An instance carries attributes the sizer cannot work with.
    #[error("invalid instance '{name}': {reason}")]
    InvalidInstance {
        /// The instance name
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// No instance with this name exists in the netlist.
    #[error("unknown instance '{0}'")]
    UnknownInstance(String),

    /// The cross-links between pins and nets are broken.
    #[error("inconsistent netlist: {0}")]
    Inconsistent(String),

    /// A sizing parameter is out of range.
    #[error("invalid sizing parameter: {0}")]
    InvalidConfig(String),

    /// Reading a preferences file or writing a size dump failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A preferences file could not be parsed.
    #[cfg(feature = "serde")]
    #[error("failed to parse preferences: {0}")]
    Parse(#[from] serde_json::Error),
}
