use thiserror::Error;

/// Result type alias using DeepCmpError
pub type Result<T> = std::result::Result<T, DeepCmpError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Structural differences between two values are never errors; they are the
/// product of a comparison. The kinds below cover the conditions that stop an
/// invocation before traversal starts (policy configuration) and misuse of the
/// value-building API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Policy configuration
    InvalidRulePath,
    InvalidPattern,
    UnresolvedType,
    ConflictingRule,
    UnknownComparator,
    MissingParameter,
    InvalidConfig,

    // Value construction
    InvalidMutation,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidRulePath => "ERR_INVALID_RULE_PATH",
            ExErrorKind::InvalidPattern => "ERR_INVALID_PATTERN",
            ExErrorKind::UnresolvedType => "ERR_UNRESOLVED_TYPE",
            ExErrorKind::ConflictingRule => "ERR_CONFLICTING_RULE",
            ExErrorKind::UnknownComparator => "ERR_UNKNOWN_COMPARATOR",
            ExErrorKind::MissingParameter => "ERR_MISSING_PARAMETER",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::InvalidMutation => "ERR_INVALID_MUTATION",
        }
    }

    /// True for kinds raised while validating a comparison policy
    pub fn is_policy_configuration(&self) -> bool {
        !matches!(self, ExErrorKind::InvalidMutation)
    }
}

/// Canonical structured error type
///
/// Carries the classification kind plus optional context for debugging and
/// for programmatic handling by callers.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    path: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            path: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the rule path, pattern or type name the error refers to
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the path context, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for deepcmp operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeepCmpError {
    // ===== Policy configuration =====
    /// An ignore rule or field comparator uses a malformed rule path
    #[error("Invalid rule path '{path}': {reason}")]
    InvalidRulePath { path: String, reason: String },

    /// An ignore regex does not compile
    #[error("Invalid field pattern '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    /// A type comparator or ignored type names a type that cannot be resolved
    #[error("Cannot resolve type '{type_name}'")]
    UnresolvedType { type_name: String },

    /// The same rule path is both ignored and given a comparator
    #[error("Rule path '{path}' is both ignored and has a comparator")]
    ConflictingRule { path: String },

    /// A configuration file names a comparator that does not exist
    #[error("Unknown comparator '{name}'")]
    UnknownComparator { name: String },

    /// A named comparator was configured without a required parameter
    #[error("Comparator '{name}' requires parameter '{parameter}'")]
    MissingComparatorParameter { name: String, parameter: String },

    /// A configuration document could not be parsed
    #[error("Invalid policy configuration: {reason}")]
    InvalidConfig { reason: String },

    // ===== Value construction =====
    /// A mutation helper was applied to a value of the wrong shape
    #[error("Cannot {op} on a value of type '{type_name}'")]
    InvalidMutation { op: String, type_name: String },
}

impl DeepCmpError {
    /// True when the error comes from validating a comparison policy
    pub fn is_policy_error(&self) -> bool {
        !matches!(self, DeepCmpError::InvalidMutation { .. })
    }
}

/// Conversion from DeepCmpError to ExError
impl From<DeepCmpError> for ExError {
    fn from(err: DeepCmpError) -> Self {
        match err {
            DeepCmpError::InvalidRulePath { path, reason } => {
                ExError::new(ExErrorKind::InvalidRulePath)
                    .with_op("resolve_policy")
                    .with_path(path)
                    .with_message(reason)
            }

            DeepCmpError::InvalidRegex { pattern, reason } => {
                ExError::new(ExErrorKind::InvalidPattern)
                    .with_op("resolve_policy")
                    .with_path(pattern)
                    .with_message(reason)
            }

            DeepCmpError::UnresolvedType { type_name } => {
                ExError::new(ExErrorKind::UnresolvedType)
                    .with_op("resolve_policy")
                    .with_path(type_name)
                    .with_message("Type cannot be resolved")
            }

            DeepCmpError::ConflictingRule { path } => ExError::new(ExErrorKind::ConflictingRule)
                .with_op("resolve_policy")
                .with_path(path)
                .with_message("Path is both ignored and compared with a custom comparator"),

            DeepCmpError::UnknownComparator { name } => {
                ExError::new(ExErrorKind::UnknownComparator)
                    .with_op("load_policy_config")
                    .with_message(format!("Unknown comparator '{}'", name))
            }

            DeepCmpError::MissingComparatorParameter { name, parameter } => {
                ExError::new(ExErrorKind::MissingParameter)
                    .with_op("load_policy_config")
                    .with_message(format!(
                        "Comparator '{}' requires parameter '{}'",
                        name, parameter
                    ))
            }

            DeepCmpError::InvalidConfig { reason } => ExError::new(ExErrorKind::InvalidConfig)
                .with_op("load_policy_config")
                .with_message(reason),

            DeepCmpError::InvalidMutation { op, type_name } => {
                ExError::new(ExErrorKind::InvalidMutation)
                    .with_op(op)
                    .with_message(format!("Unsupported on type '{}'", type_name))
            }
        }
    }
}

impl From<toml::de::Error> for DeepCmpError {
    fn from(err: toml::de::Error) -> Self {
        DeepCmpError::InvalidConfig {
            reason: err.to_string(),
        }
    }
}
