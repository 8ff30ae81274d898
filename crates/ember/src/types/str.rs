/// Immutable string payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Str(Box<str>);

impl Str {
    #[must_use]
    pub fn new(s: &str) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Str {
    fn from(s: String) -> Self {
        Self(s.into_boxed_str())
    }
}
