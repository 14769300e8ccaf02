//! Error types for resolution and invocation.

use thiserror::Error;

/// An error raised by the body of an invoked member.
///
/// `trace` holds the frames captured when the host first delivered the
/// fault, innermost first. Rethrowing keeps the fault (and its trace)
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Fault {
    pub kind: String,
    pub message: String,
    pub trace: Vec<String>,
}

impl Fault {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            trace: Vec::new(),
        }
    }

    /// Record a frame the fault passed through.
    pub fn push_frame(&mut self, frame: impl Into<String>) {
        self.trace.push(frame.into());
    }
}

/// Engine errors surface to member bodies as faults. A rethrown fault is
/// passed through as-is so nested reflective calls add no wrapper layers.
impl From<ReflectError> for Fault {
    fn from(err: ReflectError) -> Self {
        match err {
            ReflectError::Rethrown(fault) => fault,
            other => Fault::new(other.kind(), other.to_string()),
        }
    }
}

/// Errors produced by the resolution engine and the host.
#[derive(Debug, Clone, Error)]
pub enum ReflectError {
    /// A required input was absent.
    #[error("value cannot be null (parameter '{0}')")]
    ArgumentNull(&'static str),

    /// An instance member was accessed without an instance.
    #[error("cannot access instance member '{0}' without a target")]
    MemberAccess(String),

    /// No method or constructor matched the supplied arguments.
    #[error("method '{type_name}.{member}' not found")]
    MissingMethod { type_name: String, member: String },

    /// No field, property or event matched.
    #[error("member '{type_name}.{member}' not found")]
    MissingMember { type_name: String, member: String },

    /// An explicitly supplied open member could not be closed.
    #[error("unable to infer usage of '{member}' from supplied arguments")]
    CannotInfer { member: String },

    #[error("'{member}' expects {expected} argument(s), got {found}")]
    ArgumentCount {
        member: String,
        expected: usize,
        found: usize,
    },

    #[error("type '{type_name}' expects {expected} type argument(s), got {found}")]
    TypeArgumentCount {
        type_name: String,
        expected: usize,
        found: usize,
    },

    /// The target object is not an instance of the member's declaring type.
    #[error("object of type '{found}' does not match target type '{expected}'")]
    TargetMismatch { expected: String, found: String },

    /// A value could not be converted to the requested type.
    #[error("cannot convert value of type '{found}' to '{expected}'")]
    InvalidCast { expected: String, found: String },

    /// The property has no accessor for the requested direction.
    #[error("property '{0}' cannot be accessed in this direction")]
    NoAccessor(String),

    /// The single wrapper layer the host puts around callee failures.
    #[error("exception has been thrown by the target of an invocation ('{member}')")]
    TargetInvocation {
        member: String,
        #[source]
        fault: Fault,
    },

    /// A callee failure re-raised under its own identity.
    #[error(transparent)]
    Rethrown(Fault),
}

impl ReflectError {
    /// Short name of the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            ReflectError::ArgumentNull(_) => "ArgumentNull",
            ReflectError::MemberAccess(_) => "MemberAccess",
            ReflectError::MissingMethod { .. } => "MissingMethod",
            ReflectError::MissingMember { .. } => "MissingMember",
            ReflectError::CannotInfer { .. } => "InvalidOperation",
            ReflectError::ArgumentCount { .. } => "TargetParameterCount",
            ReflectError::TypeArgumentCount { .. } => "Argument",
            ReflectError::TargetMismatch { .. } => "Target",
            ReflectError::InvalidCast { .. } => "InvalidCast",
            ReflectError::NoAccessor(_) => "Argument",
            ReflectError::TargetInvocation { .. } => "TargetInvocation",
            ReflectError::Rethrown(_) => "Rethrown",
        }
    }

    /// Strip exactly one invocation wrapper, leaving other errors untouched.
    pub fn unwrap_invocation(self) -> Self {
        match self {
            ReflectError::TargetInvocation { fault, .. } => ReflectError::Rethrown(fault),
            other => other,
        }
    }

    /// The callee fault, when this error carries one.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            ReflectError::Rethrown(fault) | ReflectError::TargetInvocation { fault, .. } => {
                Some(fault)
            }
            _ => None,
        }
    }

    /// Whether resolution found no compatible member.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            ReflectError::MissingMethod { .. } | ReflectError::MissingMember { .. }
        )
    }
}

/// Result type for engine operations.
pub type ReflectResult<T> = Result<T, ReflectError>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_unwrap_invocation_strips_one_layer() {
        let mut fault = Fault::new("Overflow", "too big");
        fault.push_frame("Calculator.Add");
        let wrapped = ReflectError::TargetInvocation {
            member: "Calculator.Add".to_string(),
            fault: fault.clone(),
        };

        let unwrapped = wrapped.unwrap_invocation();
        assert_eq!(unwrapped.fault(), Some(&fault));
        assert_eq!(unwrapped.to_string(), "Overflow: too big");

        // A second pass is a no-op.
        let again = unwrapped.unwrap_invocation();
        assert!(matches!(again, ReflectError::Rethrown(f) if f == fault));
    }

    #[test]
    fn test_rethrown_is_transparent() {
        let fault = Fault::new("Io", "disk full");
        let err = ReflectError::Rethrown(fault.clone());
        assert_eq!(err.to_string(), fault.to_string());
        assert!(err.source().is_none());
    }

    #[test]
    fn test_wrapper_exposes_source() {
        let err = ReflectError::TargetInvocation {
            member: "Box.get_Value".to_string(),
            fault: Fault::new("Null", "no value"),
        };
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("Null: no value"));
    }

    #[test]
    fn test_fault_from_engine_error() {
        let fault = Fault::new("Custom", "boom");
        assert_eq!(Fault::from(ReflectError::Rethrown(fault.clone())), fault);

        let missing = Fault::from(ReflectError::MissingMethod {
            type_name: "Calc".to_string(),
            member: "Sub".to_string(),
        });
        assert_eq!(missing.kind, "MissingMethod");
        assert_eq!(missing.message, "method 'Calc.Sub' not found");
    }
}
