//! Codegen error types covering both transaction consumers.

/// Errors that can occur while building a transaction or rendering source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodegenError {
    /// An input bank title is empty, so no interface name can be derived.
    #[error("empty interface name")]
    EmptyInterfaceName,

    /// A bank title or parameter name is not a valid identifier.
    #[error("'{name}' is not a valid identifier")]
    InvalidIdentifier { name: String },

    /// An input-bank argument has no value to pass to the live builder.
    #[error("argument '{argument}' of {operation} has no value")]
    MissingArgument { operation: String, argument: String },

    /// A method receiver that is not a component address value.
    #[error("method '{method}' needs a component address, got {found}")]
    UnsupportedReceiver { method: String, found: String },
}
