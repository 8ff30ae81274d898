//! Name interning.
//!
//! Attribute names, parameter names and type names are never heap objects: they are
//! interned once and referred to by a [`StringId`] token. Attribute dicts key on these
//! tokens, which is why the collector never traces dict keys.

use std::str::FromStr;

use ahash::AHashMap;
use strum::{EnumCount, EnumString, IntoStaticStr, VariantArray};

/// Index into the interner's storage.
///
/// Uses `u32` to save space (4 bytes vs 8 bytes for `usize`). This limits us to
/// ~4 billion unique interns, which is more than sufficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, serde::Serialize, serde::Deserialize)]
pub struct StringId(u32);

impl StringId {
    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Names interned by every [`Interns`] table at fixed ids.
///
/// The discriminant is the `StringId` index, so `StaticStrings::Name.into()` needs no lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, EnumCount, VariantArray)]
#[repr(u8)]
pub enum StaticStrings {
    #[strum(serialize = "__name__")]
    Name,
    #[strum(serialize = "__qualname__")]
    Qualname,
    #[strum(serialize = "__module__")]
    Module,
    #[strum(serialize = "__doc__")]
    Doc,
    #[strum(serialize = "__dict__")]
    Dict,
    #[strum(serialize = "__class__")]
    Class,
    #[strum(serialize = "<lambda>")]
    Lambda,
    #[strum(serialize = "<native>")]
    Native,
}

impl From<StaticStrings> for StringId {
    fn from(s: StaticStrings) -> Self {
        Self(u32::from(s as u8))
    }
}

/// String interner owned by the heap.
#[derive(Debug, Clone)]
pub struct Interns {
    string_map: AHashMap<String, StringId>,
    strings: Vec<String>,
}

impl Default for Interns {
    fn default() -> Self {
        Self::new()
    }
}

impl Interns {
    /// Creates an interner holding every [`StaticStrings`] name at its fixed id.
    #[must_use]
    pub fn new() -> Self {
        let mut interns = Self {
            string_map: AHashMap::with_capacity(StaticStrings::COUNT * 4),
            strings: Vec::with_capacity(StaticStrings::COUNT * 4),
        };
        for s in StaticStrings::VARIANTS {
            let name: &'static str = s.into();
            interns.string_map.insert(name.to_owned(), StringId::from(*s));
            interns.strings.push(name.to_owned());
        }
        interns
    }

    /// Interns `s`, returning the existing id if it was interned before.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` distinct strings are interned.
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Ok(ss) = StaticStrings::from_str(s) {
            return ss.into();
        }
        if let Some(id) = self.string_map.get(s) {
            return *id;
        }
        let id = StringId(self.strings.len().try_into().expect("StringId overflow"));
        self.strings.push(s.to_owned());
        self.string_map.insert(s.to_owned(), id);
        id
    }

    /// Looks up a string by its `StringId`.
    ///
    /// # Panics
    /// Panics if `id` was not produced by this interner.
    #[inline]
    #[must_use]
    pub fn get_str(&self, id: StringId) -> &str {
        &self.strings[id.index()]
    }

    /// Returns the id of `s` if it was interned before.
    #[must_use]
    pub fn try_get_str_id(&self, s: &str) -> Option<StringId> {
        self.string_map.get(s).copied()
    }

    /// Number of interned strings, static names included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
