//! The recursive resolution algorithm. Each record resolves the parameters of its producer, in
//! declaration order, picking the first applicable source:
//!
//! 1. an explicit value,
//! 2. an explicit name binding,
//! 3. the declared default, when defaults are preferred,
//! 4. a record registered for the declared type,
//! 5. a record registered for the parameter name, when the container allows it,
//! 6. the declared default.
//!
//! A name binding to a key which is not registered skips steps 3 and 4.
//!
//! Parameter errors are gathered for the whole producer, so a single failure reports every
//! problem at once. Errors of nested records are fatal and propagate unchanged.

use crate::error::{ParameterError, ResolutionError};
use crate::instance::{Instance, Key};
use crate::record::{NameBindings, Params, RecordPtr};
use crate::registry::RegistryPtr;
use crate::signature::{Arguments, Parameter, ParameterKind, Signature};
use std::rc::Rc;
use tracing::{debug, trace};

/// Resolves a record with a fresh in-flight stack.
pub(crate) fn resolve(record: &RecordPtr, prefer_defaults: bool) -> Result<Instance, ResolutionError> {
    let mut in_flight = Vec::new();
    resolve_record(record, None, prefer_defaults, &mut in_flight)
}

/// Resolves a record found under `key`. Nested records are always reached through a key, so the
/// key is only absent for the outermost record.
fn resolve_record(
    record: &RecordPtr,
    key: Option<&Key>,
    prefer_defaults: bool,
    in_flight: &mut Vec<RecordPtr>,
) -> Result<Instance, ResolutionError> {
    let (producer, registry, params, name_bindings, param_names_as_bindings) = {
        let record = record.borrow();
        if !record.is_valid() {
            return Err(ResolutionError::Invalidated);
        }

        if let Some(instance) = record.instantiation().reuse(record.cached()) {
            trace!(producer = %record.producer().description(), "Reusing cached instance.");
            return Ok(instance);
        }

        let registry = record.registry().ok_or(ResolutionError::RegistryDropped)?;
        (
            record.producer().clone(),
            registry,
            record.params().clone(),
            record.name_bindings().clone(),
            record.param_names_as_bindings(),
        )
    };

    if let Some(key) = key {
        if in_flight.iter().any(|visited| Rc::ptr_eq(visited, record)) {
            return Err(ResolutionError::CircularDependency {
                producer: producer.description(),
                key: key.clone(),
            });
        }
    }

    in_flight.push(record.clone());

    let mut resolver = ParameterResolver {
        registry: &registry,
        params: &params,
        name_bindings: &name_bindings,
        param_names_as_bindings,
        prefer_defaults,
        in_flight: &mut *in_flight,
        errors: Vec::new(),
    };

    let arguments = resolver.resolve_arguments(producer.signature());
    let errors = resolver.errors;

    in_flight.pop();

    let arguments = arguments?;
    if !errors.is_empty() {
        return Err(ResolutionError::UnresolvableParameters {
            producer: producer.description(),
            container: registry.borrow().name().to_string(),
            errors,
        });
    }

    let instance = producer
        .produce(arguments)
        .map_err(|cause| ResolutionError::ProducerFailed {
            producer: producer.description(),
            cause: cause.into(),
        })?;

    let mut record = record.borrow_mut();
    let instance = match record.view() {
        Some(view) => view.apply(&instance)?,
        None => instance,
    };

    let instantiation = record.instantiation();
    instantiation.store(record.cache_mut(), &instance);

    Ok(instance)
}

/// Looks up a key in the registry chain and resolves the found record, if any.
pub(crate) fn resolve_key(
    registry: &RegistryPtr,
    key: &Key,
    prefer_defaults: bool,
    in_flight: &mut Vec<RecordPtr>,
) -> Result<Option<Instance>, ResolutionError> {
    let record = registry.borrow().lookup(key);
    match record {
        Some(record) => {
            debug!(key = %key, "Resolving.");
            resolve_record(&record, Some(key), prefer_defaults, in_flight).map(Some)
        }
        None => Ok(None),
    }
}

struct ParameterResolver<'a> {
    registry: &'a RegistryPtr,
    params: &'a Params,
    name_bindings: &'a NameBindings,
    param_names_as_bindings: bool,
    prefer_defaults: bool,
    in_flight: &'a mut Vec<RecordPtr>,
    errors: Vec<ParameterError>,
}

impl<'a> ParameterResolver<'a> {
    fn resolve_arguments(&mut self, signature: &Signature) -> Result<Arguments, ResolutionError> {
        let mut arguments = Arguments::new(signature);

        for (index, parameter) in signature.positional().enumerate() {
            if let Some(value) = self.resolve_parameter(parameter, Some(index))? {
                arguments.push(value);
            }
        }

        self.resolve_variadic(signature, &mut arguments)?;

        for parameter in signature.keyword_only() {
            if let Some(value) = self.resolve_parameter(parameter, None)? {
                arguments.insert(parameter.name().to_string(), value);
            }
        }

        self.resolve_variadic_keyword(signature, &mut arguments)?;

        Ok(arguments)
    }

    fn resolve_parameter(
        &mut self,
        parameter: &Parameter,
        index: Option<usize>,
    ) -> Result<Option<Instance>, ResolutionError> {
        debug_assert!(index.is_none() || parameter.kind() == ParameterKind::Positional);

        let name = parameter.name();

        if let Some(value) = self.params.input_for(index, name) {
            trace!(parameter = name, "Using explicit value.");
            return Ok(Some(value.clone()));
        }

        let name_bindings = self.name_bindings;
        if let Some(key) = name_bindings.input_for(index, name) {
            if let Some(value) = self.resolve_nested(key)? {
                trace!(parameter = name, key = %key, "Using name binding.");
                return Ok(Some(value));
            }

            // a missing binding leaves only the parameter name and the default
            trace!(parameter = name, key = %key, "Name binding not registered.");
        } else {
            if self.prefer_defaults {
                if let Some(default) = parameter.default() {
                    trace!(parameter = name, "Using preferred default value.");
                    return Ok(Some(default.clone()));
                }
            }

            if let Some(declared_type) = parameter.declared_type() {
                if let Some(value) = self.resolve_nested(&Key::Type(declared_type))? {
                    trace!(parameter = name, declared_type = %declared_type, "Using declared type.");
                    return Ok(Some(value));
                }
            }
        }

        if self.param_names_as_bindings {
            if let Some(value) = self.resolve_nested(&Key::name(name))? {
                trace!(parameter = name, "Using parameter name as binding.");
                return Ok(Some(value));
            }
        }

        if let Some(default) = parameter.default() {
            trace!(parameter = name, "Using default value.");
            return Ok(Some(default.clone()));
        }

        self.errors.push(ParameterError::Unresolvable(name.to_string()));
        Ok(None)
    }

    fn resolve_variadic(
        &mut self,
        signature: &Signature,
        arguments: &mut Arguments,
    ) -> Result<(), ResolutionError> {
        let accepted = signature.positional_count();

        let (params, name_bindings) = (self.params, self.name_bindings);

        let values = params.positional_inputs();
        if values.len() > accepted {
            if signature.is_variadic() {
                for value in &values[accepted..] {
                    arguments.push(value.clone());
                }
            } else {
                self.errors.push(ParameterError::TooManyPositionalArguments {
                    given: values.len(),
                    accepted,
                });
            }

            return Ok(());
        }

        let bindings = name_bindings.positional_inputs();
        if bindings.len() > accepted {
            if signature.is_variadic() {
                for (index, key) in bindings.iter().enumerate().skip(accepted) {
                    match self.resolve_nested(key)? {
                        Some(value) => arguments.push(value),
                        None => self.errors.push(ParameterError::UnregisteredVariadicBinding {
                            parameter: index.to_string(),
                            key: key.clone(),
                        }),
                    }
                }
            } else {
                self.errors.push(ParameterError::TooManyPositionalNameBindings {
                    given: bindings.len(),
                    accepted,
                });
            }
        }

        Ok(())
    }

    fn resolve_variadic_keyword(
        &mut self,
        signature: &Signature,
        arguments: &mut Arguments,
    ) -> Result<(), ResolutionError> {
        let mut excess_values: Vec<_> = self
            .params
            .keyword_inputs()
            .iter()
            .filter(|(name, _)| !signature.declares(name))
            .collect();
        excess_values.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

        if !excess_values.is_empty() {
            if signature.is_variadic_keyword() {
                for (name, value) in excess_values {
                    arguments.insert(name.clone(), value.clone());
                }
            } else {
                self.errors.push(ParameterError::UnrecognizedKeywordArguments(
                    excess_values
                        .into_iter()
                        .map(|(name, _)| name.clone())
                        .collect(),
                ));
            }
        }

        let mut excess_bindings: Vec<_> = self
            .name_bindings
            .keyword_inputs()
            .iter()
            .filter(|(name, _)| !signature.declares(name))
            .map(|(name, key)| (name.clone(), key.clone()))
            .collect();
        excess_bindings.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

        if !excess_bindings.is_empty() {
            if signature.is_variadic_keyword() {
                for (name, key) in excess_bindings {
                    match self.resolve_nested(&key)? {
                        Some(value) => arguments.insert(name, value),
                        None => self.errors.push(ParameterError::UnregisteredVariadicBinding {
                            parameter: name,
                            key,
                        }),
                    }
                }
            } else {
                self.errors.push(ParameterError::UnrecognizedKeywordNameBindings(
                    excess_bindings.into_iter().map(|(name, _)| name).collect(),
                ));
            }
        }

        Ok(())
    }

    #[inline]
    fn resolve_nested(&mut self, key: &Key) -> Result<Option<Instance>, ResolutionError> {
        resolve_key(self.registry, key, false, self.in_flight)
    }
}
