use smallvec::SmallVec;

use crate::{intern::StringId, value::Value};

/// Arguments supplied at a call site, before binding to parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgValues {
    positional: SmallVec<[Value; 4]>,
    keywords: SmallVec<[(StringId, Value); 2]>,
}

impl ArgValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional arguments only.
    #[must_use]
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            positional: values.into_iter().collect(),
            keywords: SmallVec::new(),
        }
    }

    /// Appends a keyword argument, keeping call-site order.
    #[must_use]
    pub fn kwarg(mut self, name: StringId, value: Value) -> Self {
        self.keywords.push((name, value));
        self
    }

    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.positional
    }

    #[must_use]
    pub fn kwargs(&self) -> &[(StringId, Value)] {
        &self.keywords
    }

    #[must_use]
    pub fn has_kwargs(&self) -> bool {
        !self.keywords.is_empty()
    }
}
