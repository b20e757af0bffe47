use core::fmt;

use crate::resource::ResourceKind;

/// Which decoration a resource was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationKind {
    /// The `DescriptorSet` decoration.
    DescriptorSet,
    /// The `Binding` decoration.
    Binding,
}

impl DecorationKind {
    /// Human-readable decoration name.
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::DescriptorSet => "descriptor set",
            Self::Binding => "binding",
        }
    }
}

/// An error produced while classifying or remapping reflected resources.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReflectError {
    /// A resource sits on a descriptor set outside the sets its kind is
    /// allowed to use under the active binding convention.
    InvalidDescriptorSet {
        /// `"graphics"` or `"compute"`, for diagnostics.
        scope: &'static str,
        /// The offending resource's kind.
        kind: ResourceKind,
        /// The set the resource was declared on.
        set: u32,
        /// The allowed set indices, already formatted (e.g. `"0 or 2"`).
        expected: String,
    },
    /// A resource lacks a descriptor-set or binding decoration.
    MissingDecoration {
        /// The offending resource's kind.
        kind: ResourceKind,
        /// The SPIR-V variable id of the resource.
        id: u32,
        /// Which decoration is absent.
        decoration: DecorationKind,
    },
}

impl ReflectError {
    pub(crate) fn invalid_set(
        scope: &'static str,
        kind: ResourceKind,
        set: u32,
        expected: String,
    ) -> Self {
        Self::InvalidDescriptorSet {
            scope,
            kind,
            set,
            expected,
        }
    }
}

impl fmt::Display for ReflectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDescriptorSet {
                scope,
                kind,
                set,
                expected,
            } => write!(
                f,
                "Descriptor set index for {scope} {} must be {expected} (resource uses set {set})",
                kind.describe()
            ),
            Self::MissingDecoration {
                kind,
                id,
                decoration,
            } => write!(
                f,
                "shader resource {id} ({}) is missing a {} decoration",
                kind.describe(),
                decoration.describe()
            ),
        }
    }
}

impl std::error::Error for ReflectError {}
