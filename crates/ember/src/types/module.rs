use crate::intern::StringId;

/// A module namespace.
///
/// Globals live in the header's attribute dict (namespace-tuned), so the payload only
/// keeps the module name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Module {
    name: StringId,
}

impl Module {
    #[must_use]
    pub fn new(name: StringId) -> Self {
        Self { name }
    }

    #[must_use]
    pub fn name(&self) -> StringId {
        self.name
    }
}
