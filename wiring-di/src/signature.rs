//! Producers describe their parameters with a [Signature], which drives parameter resolution. The
//! resolved values are handed to the producer as [Arguments].
//!
//! ```
//! use wiring_di::instance::Instance;
//! use wiring_di::signature::{Parameter, Signature};
//!
//! trait Logger {}
//!
//! // equivalent of `fn(logger: dyn Logger, retries: u8 = 3, *, verbose: bool, **rest)`
//! let signature = Signature::new()
//!     .param(Parameter::new("logger").typed::<dyn Logger>())
//!     .param(Parameter::new("retries").typed::<u8>().with_default(Instance::new(3_u8)))
//!     .param(Parameter::keyword_only("verbose").typed::<bool>())
//!     .variadic_keyword();
//!
//! assert_eq!(signature.positional_count(), 2);
//! ```

use crate::error::ArgumentError;
use crate::instance::{Instance, InstancePtr, TypeKey};
use fxhash::FxHashMap;

/// How a parameter can be supplied.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum ParameterKind {
    /// Can be supplied by position or by keyword.
    Positional,
    /// Can only be supplied by keyword.
    KeywordOnly,
}

/// Description of a single producer parameter.
#[derive(Clone, Debug)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    declared_type: Option<TypeKey>,
    default: Option<Instance>,
}

impl Parameter {
    /// Creates a positional parameter without a declared type or default.
    pub fn new<T: ToString>(name: T) -> Self {
        Self {
            name: name.to_string(),
            kind: ParameterKind::Positional,
            declared_type: None,
            default: None,
        }
    }

    /// Creates a keyword-only parameter without a declared type or default.
    pub fn keyword_only<T: ToString>(name: T) -> Self {
        Self {
            kind: ParameterKind::KeywordOnly,
            ..Self::new(name)
        }
    }

    /// Declares the type of this parameter, enabling lookup by type.
    pub fn typed<T: ?Sized + 'static>(mut self) -> Self {
        self.declared_type = Some(TypeKey::of::<T>());
        self
    }

    /// Declares a default value.
    pub fn with_default(mut self, default: Instance) -> Self {
        self.default = Some(default);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    #[inline]
    pub fn declared_type(&self) -> Option<TypeKey> {
        self.declared_type
    }

    #[inline]
    pub fn default(&self) -> Option<&Instance> {
        self.default.as_ref()
    }
}

/// Ordered parameter list of a producer, with variadic slots.
#[derive(Clone, Debug, Default)]
pub struct Signature {
    parameters: Vec<Parameter>,
    variadic: bool,
    variadic_keyword: bool,
}

impl Signature {
    /// Creates an empty signature.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Accepts excess positional inputs.
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Accepts excess keyword inputs.
    pub fn variadic_keyword(mut self) -> Self {
        self.variadic_keyword = true;
        self
    }

    #[inline]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    #[inline]
    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    #[inline]
    pub fn is_variadic_keyword(&self) -> bool {
        self.variadic_keyword
    }

    /// Parameters which can be supplied by position, in declaration order.
    pub fn positional(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(|parameter| parameter.kind == ParameterKind::Positional)
    }

    /// Parameters which can only be supplied by keyword, in declaration order.
    pub fn keyword_only(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(|parameter| parameter.kind == ParameterKind::KeywordOnly)
    }

    pub fn positional_count(&self) -> usize {
        self.positional().count()
    }

    /// Checks if a parameter with given name is declared.
    pub fn declares(&self, name: &str) -> bool {
        self.parameters.iter().any(|parameter| parameter.name == name)
    }
}

/// Resolved arguments a producer is invoked with. Declared positional parameters come first in
/// `positional`, followed by variadic values; keyword-only parameters and variadic keyword values
/// live in `keyword`.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    positional: Vec<Instance>,
    positional_names: Vec<String>,
    keyword: FxHashMap<String, Instance>,
    keyword_only_names: Vec<String>,
}

impl Arguments {
    pub(crate) fn new(signature: &Signature) -> Self {
        Self {
            positional: Vec::with_capacity(signature.positional_count()),
            positional_names: signature
                .positional()
                .map(|parameter| parameter.name.clone())
                .collect(),
            keyword: Default::default(),
            keyword_only_names: signature
                .keyword_only()
                .map(|parameter| parameter.name.clone())
                .collect(),
        }
    }

    pub(crate) fn push(&mut self, value: Instance) {
        self.positional.push(value);
    }

    pub(crate) fn insert(&mut self, name: String, value: Instance) {
        self.keyword.insert(name, value);
    }

    /// Returns a declared parameter's value by name.
    pub fn get<T: ?Sized + 'static>(&self, name: &str) -> Result<InstancePtr<T>, ArgumentError> {
        let value = self
            .positional_names
            .iter()
            .position(|positional_name| positional_name == name)
            .and_then(|index| self.positional.get(index))
            .or_else(|| self.keyword.get(name))
            .ok_or_else(|| ArgumentError::Missing(name.to_string()))?;

        downcast(name, value)
    }

    /// Returns a positional value, including variadic ones.
    pub fn positional<T: ?Sized + 'static>(
        &self,
        index: usize,
    ) -> Result<InstancePtr<T>, ArgumentError> {
        let name = index.to_string();
        let value = self
            .positional
            .get(index)
            .ok_or_else(|| ArgumentError::Missing(name.clone()))?;

        downcast(&name, value)
    }

    /// Returns a keyword value, including variadic ones.
    pub fn keyword<T: ?Sized + 'static>(&self, name: &str) -> Result<InstancePtr<T>, ArgumentError> {
        let value = self
            .keyword
            .get(name)
            .ok_or_else(|| ArgumentError::Missing(name.to_string()))?;

        downcast(name, value)
    }

    /// All positional values, declared and variadic.
    #[inline]
    pub fn positional_values(&self) -> &[Instance] {
        &self.positional
    }

    /// Positional values beyond the declared parameters.
    pub fn variadic(&self) -> &[Instance] {
        self.positional
            .get(self.positional_names.len()..)
            .unwrap_or_default()
    }

    /// Keyword values not matching any declared parameter.
    pub fn variadic_keyword(&self) -> FxHashMap<&str, &Instance> {
        self.keyword
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .filter(|(name, _)| !self.is_declared(name))
            .collect()
    }

    fn is_declared(&self, name: &str) -> bool {
        self.positional_names
            .iter()
            .chain(&self.keyword_only_names)
            .any(|declared| declared == name)
    }
}

fn downcast<T: ?Sized + 'static>(
    name: &str,
    value: &Instance,
) -> Result<InstancePtr<T>, ArgumentError> {
    value
        .downcast::<T>()
        .ok_or_else(|| ArgumentError::IncompatibleType {
            name: name.to_string(),
            expected: TypeKey::of::<T>(),
            actual: value.type_key(),
        })
}
