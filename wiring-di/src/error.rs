use crate::instance::{Key, TypeKey};
use itertools::Itertools;
use std::error::Error;
use std::rc::Rc;
use thiserror::Error;

/// Shared pointer to an error reported by a producer.
pub type ErrorPtr = Rc<dyn Error>;

/// Error type producers return. Any [Error] converts into it with `?`.
pub type ProducerError = Box<dyn Error>;

/// Errors related to configuring and binding registration records.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum RegistrationError {
    #[error("This registration record is not valid anymore. No operations are allowed.")]
    Invalidated,
    #[error("This registration record is already bound to '{key}'. Probably bound more than once.")]
    AlreadyBound { key: Key },
    #[error("The key '{key}' is already bound to '{existing}' and replacement was not requested.")]
    KeyConflict { key: Key, existing: String },
    #[error("The type {exposed} is not assignable to type {required}")]
    TypeMismatch { exposed: TypeKey, required: TypeKey },
    #[error("Cannot define both positional params and positional name bindings.")]
    MixedPositionalInputs,
    #[error("The operation '{operation}' is not supported on '{producer}' records.")]
    UnsupportedOperation {
        operation: &'static str,
        producer: String,
    },
    #[error("The container owning this registration record no longer exists.")]
    RegistryDropped,
}

/// Errors related to composing containers.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum ContainerError {
    #[error("Adding the sub container '{child}' to the container '{parent}' will create a circular chain of containers")]
    ContainerCycle { parent: String, child: String },
    #[error("The container '{parent}' has no sub container named '{name}'")]
    UnknownSubContainer { parent: String, name: String },
}

/// A single problem found while resolving the parameters of one producer.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum ParameterError {
    #[error("The parameter '{0}' has no given value, name binding, registered type or default value, and cannot be resolved.")]
    Unresolvable(String),
    #[error("The variadic parameter '{parameter}' is bound to '{key}', which is not registered.")]
    UnregisteredVariadicBinding { parameter: String, key: Key },
    #[error("Too many positional arguments given ({given}, accepting {accepted}), or a variadic parameter is missing")]
    TooManyPositionalArguments { given: usize, accepted: usize },
    #[error("Too many positional name bindings given ({given}, accepting {accepted}), or a variadic parameter is missing")]
    TooManyPositionalNameBindings { given: usize, accepted: usize },
    #[error("The given keyword arguments [{}] are either wrong, or a variadic keyword parameter is missing", .0.join(", "))]
    UnrecognizedKeywordArguments(Vec<String>),
    #[error("The given keyword name bindings [{}] are either wrong, or a variadic keyword parameter is missing", .0.join(", "))]
    UnrecognizedKeywordNameBindings(Vec<String>),
}

/// Errors related to resolving instances.
#[derive(Error, Clone, Debug)]
pub enum ResolutionError {
    #[error("The key '{key}' is not registered in the container '{container}'")]
    UnknownKey { key: Key, container: String },
    #[error("'{producer}' registered to '{key}' has a circular dependency on itself. Set the problematic parameter explicitly.")]
    CircularDependency { producer: String, key: Key },
    #[error("Errors while trying to resolve parameters for '{producer}' in container '{container}': [{}]", .errors.iter().join(", "))]
    UnresolvableParameters {
        producer: String,
        container: String,
        errors: Vec<ParameterError>,
    },
    #[error("'{producer}' failed to produce an instance: {cause}")]
    ProducerFailed { producer: String, cause: ErrorPtr },
    #[error("Tried to downcast an instance of {actual} to incompatible type: {expected}")]
    IncompatibleInstance { expected: TypeKey, actual: TypeKey },
    #[error("This registration record is not valid anymore and cannot be resolved.")]
    Invalidated,
    #[error("The container owning the registration record no longer exists.")]
    RegistryDropped,
}

/// Errors returned by typed access to producer [Arguments](crate::signature::Arguments).
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum ArgumentError {
    #[error("Missing argument: {0}")]
    Missing(String),
    #[error("Argument '{name}' holds {actual}, not {expected}")]
    IncompatibleType {
        name: String,
        expected: TypeKey,
        actual: TypeKey,
    },
}

#[cfg(test)]
mod tests {
    use crate::error::{ParameterError, ResolutionError};

    #[test]
    fn should_aggregate_parameter_errors_in_message() {
        let error = ResolutionError::UnresolvableParameters {
            producer: "factory".to_string(),
            container: "main".to_string(),
            errors: vec![
                ParameterError::Unresolvable("a".to_string()),
                ParameterError::UnrecognizedKeywordArguments(vec![
                    "e".to_string(),
                    "f".to_string(),
                ]),
            ],
        };

        let message = error.to_string();
        assert!(message.contains("'factory'"));
        assert!(message.contains("'main'"));
        assert!(message.contains("'a'"));
        assert!(message.contains("[e, f]"));
    }
}
