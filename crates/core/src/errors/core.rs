use thiserror::Error;

/// Core error type for the armature composition engine
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Discovery failed for module '{module}': {message}")]
    DiscoveryFailed { module: String, message: String },

    #[error("Cannot instantiate contribution '{type_name}' for capability '{capability}': {message}")]
    ContributionInstantiation {
        capability: String,
        type_name: String,
        message: String,
    },

    #[error("Contribution '{contribution}' failed in '{hook}': {source}")]
    ContributionHook {
        contribution: String,
        hook: &'static str,
        source: Box<CoreError>,
    },

    #[error("Service not found: {service_type}")]
    ServiceNotFound { service_type: String },

    #[error("No satisfiable constructor for '{target}' after {attempts} candidate(s)")]
    NoSatisfiableConstructor {
        target: String,
        attempts: usize,
        source: Option<Box<CoreError>>,
    },

    #[error("Engine is in state '{actual}', expected '{expected}'")]
    EngineState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Scoped service '{service_type}' resolved without an active scope")]
    ScopeRequired { service_type: String },

    #[error("Invalid service registration: {message}")]
    InvalidRegistration { message: String },

    #[error("No mapping registered from '{source_type}' to '{dest_type}'")]
    MappingNotFound {
        source_type: String,
        dest_type: String,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Lock error on resource: {resource}")]
    LockError { resource: String },
}

impl CoreError {
    /// Create a new discovery failure
    pub fn discovery_failed(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DiscoveryFailed {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Create a new contribution instantiation error
    pub fn contribution_instantiation(
        capability: impl Into<String>,
        type_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ContributionInstantiation {
            capability: capability.into(),
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Create a new contribution hook error
    pub fn contribution_hook(
        contribution: impl Into<String>,
        hook: &'static str,
        source: CoreError,
    ) -> Self {
        Self::ContributionHook {
            contribution: contribution.into(),
            hook,
            source: Box::new(source),
        }
    }

    /// Create a new service not found error
    pub fn service_not_found(service_type: impl Into<String>) -> Self {
        Self::ServiceNotFound {
            service_type: service_type.into(),
        }
    }

    /// Create a new no-satisfiable-constructor error
    pub fn no_satisfiable_constructor(
        target: impl Into<String>,
        attempts: usize,
        last_failure: Option<CoreError>,
    ) -> Self {
        Self::NoSatisfiableConstructor {
            target: target.into(),
            attempts,
            source: last_failure.map(Box::new),
        }
    }

    /// Create a new engine state error
    pub fn engine_state(expected: &'static str, actual: &'static str) -> Self {
        Self::EngineState { expected, actual }
    }

    /// Create a new scope required error
    pub fn scope_required(service_type: impl Into<String>) -> Self {
        Self::ScopeRequired {
            service_type: service_type.into(),
        }
    }

    /// Create a new invalid registration error
    pub fn invalid_registration(message: impl Into<String>) -> Self {
        Self::InvalidRegistration {
            message: message.into(),
        }
    }

    /// Create a new mapping not found error
    pub fn mapping_not_found(
        source_type: impl Into<String>,
        dest_type: impl Into<String>,
    ) -> Self {
        Self::MappingNotFound {
            source_type: source_type.into(),
            dest_type: dest_type.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new lock error
    pub fn lock(resource: impl Into<String>) -> Self {
        Self::LockError {
            resource: resource.into(),
        }
    }

    /// Check if the error is a service not found error
    pub fn is_service_not_found(&self) -> bool {
        matches!(self, Self::ServiceNotFound { .. })
    }

    /// Check if the error is an engine state violation
    pub fn is_engine_state(&self) -> bool {
        matches!(self, Self::EngineState { .. })
    }

    /// Check if the error is fatal to the bootstrap phase
    ///
    /// Discovery failures are contained and logged; everything else raised
    /// during configuration aborts the phase.
    pub fn is_fatal_to_bootstrap(&self) -> bool {
        !matches!(self, Self::DiscoveryFailed { .. })
    }

    /// The last inner failure attached to a fallback-construction error, if any
    pub fn last_constructor_failure(&self) -> Option<&CoreError> {
        match self {
            Self::NoSatisfiableConstructor { source, .. } => source.as_deref(),
            _ => None,
        }
    }
}
