//! Member capability flags for reflection-aware trimming.
//!
//! A [`MemberCapabilities`] value records which categories of members a type must keep
//! available after trimming so that run-time reflection over that type still succeeds.
//! Capabilities combine with bitwise OR and are compared by flag-subset containment:
//! a flowed value with capabilities `C` satisfies a requirement `R` iff `C ⊇ R`.
//!
//! # Key Types
//! - [`MemberCapabilities`]: the combinable flag set (13 base categories plus the
//!   `NONE` and `ALL` sentinels)

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    /// Categories of members that must survive trimming for a reflected-over type.
    ///
    /// The empty set (`MemberCapabilities::empty()`) means "no requirement / unannotated".
    /// [`MemberCapabilities::ALL`] sets every bit, including bits outside the named
    /// categories, so it is a strict superset of any combination of base flags.
    pub struct MemberCapabilities: u32 {
        /// The public parameterless constructor
        const PUBLIC_PARAMETERLESS_CONSTRUCTOR = 0x0001;
        /// All public constructors, including the parameterless one
        const PUBLIC_CONSTRUCTORS = 0x0002 | Self::PUBLIC_PARAMETERLESS_CONSTRUCTOR.bits();
        /// All non-public constructors
        const NON_PUBLIC_CONSTRUCTORS = 0x0004;
        /// All public methods
        const PUBLIC_METHODS = 0x0008;
        /// All non-public methods
        const NON_PUBLIC_METHODS = 0x0010;
        /// All public fields
        const PUBLIC_FIELDS = 0x0020;
        /// All non-public fields
        const NON_PUBLIC_FIELDS = 0x0040;
        /// All public nested types
        const PUBLIC_NESTED_TYPES = 0x0080;
        /// All non-public nested types
        const NON_PUBLIC_NESTED_TYPES = 0x0100;
        /// All public properties
        const PUBLIC_PROPERTIES = 0x0200;
        /// All non-public properties
        const NON_PUBLIC_PROPERTIES = 0x0400;
        /// All public events
        const PUBLIC_EVENTS = 0x0800;
        /// All non-public events
        const NON_PUBLIC_EVENTS = 0x1000;
        /// All implemented interfaces
        const INTERFACES = 0x2000;
        /// Everything, including categories not individually nameable
        const ALL = u32::MAX;
    }
}

impl MemberCapabilities {
    /// The empty requirement, equivalent to an unannotated declaration.
    pub const NONE: Self = Self::empty();

    /// Returns `true` if this capability set covers the given requirement.
    ///
    /// Satisfaction is flag-subset containment: every bit of `required` must be
    /// present in `self`. [`MemberCapabilities::ALL`] satisfies any requirement
    /// and any set satisfies an empty requirement.
    #[must_use]
    pub const fn satisfies(&self, required: Self) -> bool {
        self.contains(required)
    }

    /// Returns `true` if no capability is required or guaranteed.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.is_empty()
    }
}
