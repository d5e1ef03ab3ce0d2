//! Error types for plan execution.
//!
//! Every failure the engine surfaces to a caller carries an [`ErrorContext`]
//! describing the operation and chart it happened in. Recoverable backend
//! conditions (null responses, backend-reported errors) are not errors at this
//! level; they degrade into empty series inside the assembler.

use std::fmt;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Structured context for engine errors.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "execute_plan", "dispatch_batch")
    pub operation: Option<String>,
    /// Title of the chart being processed, if any
    pub chart: Option<String>,
    /// Category labels of the combination being queried
    pub combination: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether retrying the same call may succeed
    pub retryable: bool,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_chart(mut self, chart: impl Into<String>) -> Self {
        self.chart = Some(chart.into());
        self
    }

    pub fn with_combination(mut self, combination: impl Into<String>) -> Self {
        self.combination = Some(combination.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref chart) = self.chart {
            parts.push(format!("chart={}", chart));
        }
        if let Some(ref combination) = self.combination {
            parts.push(format!("combination={}", combination));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for plan execution
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The plan violates a structural invariant and was rejected before any query ran.
    #[error("Invalid plan: {message} {context}")]
    InvalidPlan {
        message: String,
        context: ErrorContext,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {message} {context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    /// Metric catalog could not be loaded or parsed.
    #[error("Metadata error: {message} {context}")]
    Metadata {
        message: String,
        context: ErrorContext,
    },

    /// A backend call failed in a way the client could not map to "no result".
    #[error("Query fault: {message} {context}")]
    QueryFault {
        message: String,
        context: ErrorContext,
    },

    /// A dispatched task panicked or was cancelled.
    #[error("Task fault: {message} {context}")]
    TaskFault {
        message: String,
        context: ErrorContext,
    },

    #[error("Internal error: {message} {context}")]
    Internal {
        message: String,
        context: ErrorContext,
    },
}

impl EngineError {
    pub fn invalid_plan(message: impl Into<String>) -> Self {
        Self::InvalidPlan {
            message: message.into(),
            context: ErrorContext::new("validate_plan"),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn metadata(message: impl Into<String>) -> Self {
        Self::Metadata {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn query_fault(message: impl Into<String>) -> Self {
        Self::QueryFault {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn task_fault(message: impl Into<String>) -> Self {
        Self::TaskFault {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::InvalidPlan { context, .. }
            | Self::Configuration { context, .. }
            | Self::Metadata { context, .. }
            | Self::QueryFault { context, .. }
            | Self::TaskFault { context, .. }
            | Self::Internal { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::InvalidPlan { context, .. }
            | Self::Configuration { context, .. }
            | Self::Metadata { context, .. }
            | Self::QueryFault { context, .. }
            | Self::TaskFault { context, .. }
            | Self::Internal { context, .. } => context,
        }
    }

    /// Replace the full context.
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        *self.context_mut() = context;
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    pub fn with_chart(mut self, chart: impl Into<String>) -> Self {
        self.context_mut().chart = Some(chart.into());
        self
    }

    pub fn with_combination(mut self, combination: impl Into<String>) -> Self {
        self.context_mut().combination = Some(combination.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.context_mut().details = Some(details.into());
        self
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let ctx = ErrorContext::new("dispatch_batch")
            .with_chart("Age by sex")
            .with_combination("Male")
            .retryable();
        assert_eq!(
            ctx.to_string(),
            "[operation=dispatch_batch, chart=Age by sex, combination=Male, retryable=true]"
        );
    }

    #[test]
    fn test_error_builders() {
        let err = EngineError::query_fault("connection reset")
            .with_operation("query")
            .with_chart("Door to needle");
        assert_eq!(err.context().operation.as_deref(), Some("query"));
        assert!(err.to_string().starts_with("Query fault: connection reset"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_invalid_plan_operation() {
        let err = EngineError::invalid_plan("empty metrics");
        assert_eq!(err.context().operation.as_deref(), Some("validate_plan"));
    }
}
