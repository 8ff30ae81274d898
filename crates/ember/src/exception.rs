use std::{
    borrow::Cow,
    fmt::{self, Display},
};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// Runtime exception kinds raised by the object core.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>` implementations.
/// The string representation matches the variant name exactly (e.g., `TypeError` -> "TypeError").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
pub enum ExcType {
    /// Mismatched dynamic type, bad call arity or binding.
    TypeError,
    /// Value of the right type but out of the accepted domain (e.g. an enum discriminant).
    ValueError,
    /// Attribute missing or attribute storage not available on this kind.
    AttributeError,
    /// Allocation or memory limit exceeded.
    MemoryError,
    RuntimeError,
    /// Host-side failure reported by a native function status code.
    SystemError,
}

impl ExcType {
    /// Creates a TypeError for a checked extraction or type test that failed.
    ///
    /// Format: `expected 'int', got 'float'`
    #[must_use]
    pub fn type_error_expected(expected: &str, got: &str) -> RunError {
        SimpleException::new_msg(Self::TypeError, format!("expected '{expected}', got '{got}'")).into()
    }

    /// Creates a TypeError for too many positional arguments.
    ///
    /// Format: `f() takes 2 positional arguments but 3 were given`
    #[must_use]
    pub fn type_error_too_many_positional(name: &str, max: usize, actual: usize) -> RunError {
        let takes_word = if max == 1 { "argument" } else { "arguments" };
        let were = if actual == 1 { "was" } else { "were" };
        SimpleException::new_msg(
            Self::TypeError,
            format!("{name}() takes {max} positional {takes_word} but {actual} {were} given"),
        )
        .into()
    }

    /// Creates a TypeError for missing required positional arguments.
    ///
    /// Format: `f() missing 2 required positional arguments: 'a' and 'b'`
    #[must_use]
    pub fn type_error_missing_positional_with_names(name: &str, missing_names: &[&str]) -> RunError {
        let count = missing_names.len();
        let names_str = format_param_names(missing_names);
        if count == 1 {
            SimpleException::new_msg(
                Self::TypeError,
                format!("{name}() missing 1 required positional argument: {names_str}"),
            )
            .into()
        } else {
            SimpleException::new_msg(
                Self::TypeError,
                format!("{name}() missing {count} required positional arguments: {names_str}"),
            )
            .into()
        }
    }

    /// Creates a TypeError for a keyword that names an already-bound parameter.
    #[must_use]
    pub fn type_error_duplicate_arg(name: &str, param: &str) -> RunError {
        SimpleException::new_msg(
            Self::TypeError,
            format!("{name}() got multiple values for argument '{param}'"),
        )
        .into()
    }

    /// Creates a TypeError for a keyword with no matching parameter and no `**` sink.
    #[must_use]
    pub fn type_error_unexpected_keyword(name: &str, key: &str) -> RunError {
        SimpleException::new_msg(
            Self::TypeError,
            format!("{name}() got an unexpected keyword argument '{key}'"),
        )
        .into()
    }

    /// Creates a TypeError for a native function called with the wrong argument count.
    #[must_use]
    pub fn type_error_native_arity(name: &str, expected: usize, actual: usize) -> RunError {
        SimpleException::new_msg(
            Self::TypeError,
            format!("{name}() expected {expected} arguments, got {actual}"),
        )
        .into()
    }

    /// Creates an AttributeError for a missing attribute.
    #[must_use]
    pub fn attribute_error(type_name: &str, attr: &str) -> RunError {
        SimpleException::new_msg(
            Self::AttributeError,
            format!("'{type_name}' object has no attribute '{attr}'"),
        )
        .into()
    }

    /// Creates a ValueError for an integer that names no variant of an enum.
    #[must_use]
    pub fn value_error_invalid_variant(enum_name: &str, raw: impl Display) -> RunError {
        SimpleException::new_msg(Self::ValueError, format!("{raw} is not a valid {enum_name}")).into()
    }

    /// Creates a ValueError for an integer that does not fit the requested native type.
    #[must_use]
    pub fn value_error_out_of_range(target: &str, raw: i64) -> RunError {
        SimpleException::new_msg(Self::ValueError, format!("{raw} out of range for {target}")).into()
    }

    /// Creates a RuntimeError for a host-side contract violation that returns instead of panicking.
    #[must_use]
    pub fn runtime_error(msg: impl Display) -> RunError {
        SimpleException::new_msg(Self::RuntimeError, msg).into()
    }

    /// Creates a SystemError for a compact native call that reported failure.
    ///
    /// Format: `f() failed with status 3`
    #[must_use]
    pub fn system_error_status(name: &str, status: i32) -> RunError {
        SimpleException::new_msg(Self::SystemError, format!("{name}() failed with status {status}")).into()
    }
}

/// A raised exception: the kind plus an optional message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleException {
    exc_type: ExcType,
    arg: Option<String>,
}

impl SimpleException {
    /// Creates an exception with no message.
    #[must_use]
    pub fn new(exc_type: ExcType) -> Self {
        Self { exc_type, arg: None }
    }

    /// Creates an exception carrying `arg` as its message.
    #[must_use]
    pub fn new_msg(exc_type: ExcType, arg: impl fmt::Display) -> Self {
        Self {
            exc_type,
            arg: Some(arg.to_string()),
        }
    }

    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        self.exc_type
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.arg.as_deref()
    }
}

impl Display for SimpleException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "{}: {arg}", self.exc_type),
            None => write!(f, "{}", self.exc_type),
        }
    }
}

/// Error produced by any fallible runtime operation of the object core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// Internal error - indicates a bug in the runtime or its embedder, not in user code.
    Internal(Cow<'static, str>),
    /// Catchable runtime exception (e.g., TypeError from argument binding).
    Exc(Box<SimpleException>),
    /// Uncatchable exception from resource limits.
    ///
    /// User code must not be able to suppress a resource-limit violation.
    UncatchableExc(Box<SimpleException>),
}

impl RunError {
    /// Creates an internal error from a static message.
    #[must_use]
    pub fn internal(msg: &'static str) -> Self {
        Self::Internal(Cow::Borrowed(msg))
    }

    /// Returns the exception kind, or `None` for internal errors.
    #[must_use]
    pub fn exc_type(&self) -> Option<ExcType> {
        match self {
            Self::Internal(_) => None,
            Self::Exc(exc) | Self::UncatchableExc(exc) => Some(exc.exc_type()),
        }
    }

    /// Returns the exception message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Internal(msg) => Some(msg),
            Self::Exc(exc) | Self::UncatchableExc(exc) => exc.message(),
        }
    }
}

impl From<SimpleException> for RunError {
    fn from(exc: SimpleException) -> Self {
        Self::Exc(Box::new(exc))
    }
}

impl Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
            Self::Exc(exc) | Self::UncatchableExc(exc) => write!(f, "{exc}"),
        }
    }
}

impl std::error::Error for RunError {}

/// Formats parameter names the way call errors list them: `'a'`, `'a' and 'b'`, `'a', 'b' and 'c'`.
fn format_param_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => format!("'{only}'"),
        [first, second] => format!("'{first}' and '{second}'"),
        [rest @ .., last] => {
            let rest: Vec<_> = rest.iter().map(|n| format!("'{n}'")).collect();
            format!("{} and '{last}'", rest.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_names_join_like_call_errors() {
        assert_eq!(format_param_names(&["a"]), "'a'");
        assert_eq!(format_param_names(&["a", "b"]), "'a' and 'b'");
        assert_eq!(format_param_names(&["a", "b", "c"]), "'a', 'b' and 'c'");
    }

    #[test]
    fn missing_positional_message() {
        let err = ExcType::type_error_missing_positional_with_names("f", &["b"]);
        assert_eq!(err.exc_type(), Some(ExcType::TypeError));
        assert_eq!(err.message(), Some("f() missing 1 required positional argument: 'b'"));
    }

    #[test]
    fn exc_type_round_trips_through_strum() {
        let parsed: ExcType = "AttributeError".parse().unwrap();
        assert_eq!(parsed, ExcType::AttributeError);
        let name: &'static str = ExcType::SystemError.into();
        assert_eq!(name, "SystemError");
    }
}
