//! Canonical key synthesis.
//!
//! Key shape: `{prefix}_{index?}_{particle?}_{name}`. The one exception is a
//! 1D histogram named [`COUNTERS_NAME`], which keeps its bare name so that
//! external plotting tools find it.

use std::borrow::Borrow;
use std::fmt;

use hb_core::ContainerKind;

/// Base name of the event-counter histogram, stored without prefix.
pub const COUNTERS_NAME: &str = "h_counters";

/// Registry key, unique within one kind's mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerKey(String);

impl ContainerKey {
    /// Build the canonical key for `name` under `kind`.
    pub fn synthesize(
        kind: ContainerKind,
        name: &str,
        index: Option<usize>,
        particle: Option<&str>,
    ) -> Self {
        if kind == ContainerKind::Histogram1D && name == COUNTERS_NAME {
            return Self(COUNTERS_NAME.to_string());
        }
        let mut key = String::with_capacity(name.len() + 16);
        key.push_str(kind.prefix());
        key.push('_');
        if let Some(i) = index {
            key.push_str(&i.to_string());
            key.push('_');
        }
        if let Some(p) = particle {
            key.push_str(p);
            key.push('_');
        }
        key.push_str(name);
        Self(key)
    }

    /// Use `name` as-is, with no prefix.
    pub fn verbatim(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ContainerKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shorthand for [`ContainerKey::synthesize`].
pub fn synthesize(
    kind: ContainerKind,
    name: &str,
    index: Option<usize>,
    particle: Option<&str>,
) -> ContainerKey {
    ContainerKey::synthesize(kind, name, index, particle)
}

/// Semantic lookup parameters used by fill, post-processing, and handle access.
///
/// A plain `&str` converts into a spec with no index and no particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpec<'a> {
    name: &'a str,
    index: Option<usize>,
    particle: Option<&'a str>,
    verbatim: bool,
}

impl<'a> KeySpec<'a> {
    /// Spec for base name `name`.
    pub fn new(name: &'a str) -> Self {
        Self { name, index: None, particle: None, verbatim: false }
    }

    /// Spec that matches the literal key `name` (unchanged-name containers).
    pub fn verbatim(name: &'a str) -> Self {
        Self { name, index: None, particle: None, verbatim: true }
    }

    /// Select member `index` of a family.
    pub fn index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Select the `particle` variant.
    pub fn particle(mut self, particle: &'a str) -> Self {
        self.particle = Some(particle);
        self
    }

    /// Base name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Key this spec resolves to under `kind`.
    pub fn to_key(&self, kind: ContainerKind) -> ContainerKey {
        if self.verbatim {
            ContainerKey::verbatim(self.name)
        } else {
            ContainerKey::synthesize(kind, self.name, self.index, self.particle)
        }
    }
}

impl<'a> From<&'a str> for KeySpec<'a> {
    fn from(name: &'a str) -> Self {
        KeySpec::new(name)
    }
}

impl<'a> From<&'a String> for KeySpec<'a> {
    fn from(name: &'a String) -> Self {
        KeySpec::new(name)
    }
}
