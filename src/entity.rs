//! Entity identifiers: a versioned integer handle packed into a single word.
//!
//! An [`Entity`] carries no data of its own; it is a short, recyclable key
//! into the [`Registry`](crate::Registry)'s component storages. The low bits
//! hold an `index` (a slot in the registry's entity array) and the high bits
//! hold a `version`, bumped every time the slot is recycled so that stale
//! handles can be told apart from live ones without scanning anything.

use std::fmt;

/// The integer type entity indices and versions are drawn from.
pub type Index = u32;

/// Number of bits of [`Entity`]'s representation given to the `index` field.
///
/// The remaining bits (`32 - INDEX_BITS`) are the `version` field. This
/// split is the default EnTT-style 20/12 partition: roughly a million live
/// entities, four thousand recycles per slot before a version collision.
pub const INDEX_BITS: u32 = 20;

/// Number of bits given to the `version` field.
pub const VERSION_BITS: u32 = 32 - INDEX_BITS;

const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;
const VERSION_MASK: u32 = (1 << VERSION_BITS) - 1;

/// The reserved index value meaning "no slot" (all index bits set).
pub const NULL_INDEX: Index = INDEX_MASK;

/// The reserved version value meaning "this slot is retired" (all version
/// bits set). A slot whose version counter would wrap onto this value skips
/// it and resumes counting from zero; see [`next_version`].
pub const TOMBSTONE_VERSION: Index = VERSION_MASK;

/// A versioned entity identifier.
///
/// Two entities compare equal iff both their index and version match.
/// `Entity::null()` and `Entity::tombstone()` are sentinels: neither ever
/// compares equal to a live, registry-issued entity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(u32);

impl Entity {
    /// Packs an `(index, version)` pair into an entity identifier.
    ///
    /// Only the low `INDEX_BITS`/`VERSION_BITS` of each argument are kept;
    /// callers are expected to pass already-masked values (the registry
    /// never produces anything else).
    #[inline]
    pub const fn new(index: Index, version: Index) -> Self {
        Entity((version & VERSION_MASK) << INDEX_BITS | (index & INDEX_MASK))
    }

    /// The sentinel entity that never references a live slot.
    ///
    /// `index() == NULL_INDEX`; version is irrelevant and fixed at 0.
    #[inline]
    pub const fn null() -> Self {
        Entity::new(NULL_INDEX, 0)
    }

    /// The sentinel marking a retired sparse-set slot.
    ///
    /// `version() == TOMBSTONE_VERSION`; index is irrelevant and fixed at 0.
    #[inline]
    pub const fn tombstone() -> Self {
        Entity::new(0, TOMBSTONE_VERSION)
    }

    /// The `index` (low bits) of this identifier.
    #[inline]
    pub const fn index(self) -> Index {
        self.0 & INDEX_MASK
    }

    /// The `version` (high bits) of this identifier.
    #[inline]
    pub const fn version(self) -> Index {
        self.0 >> INDEX_BITS
    }

    /// Whether this identifier's index is the reserved null index.
    ///
    /// This is a cheap structural check; it does not consult a registry.
    /// Use [`Registry::valid`](crate::Registry::valid) to ask "is this
    /// entity currently alive".
    #[inline]
    pub const fn is_null(self) -> bool {
        self.index() == NULL_INDEX
    }

    /// Whether this identifier's version is the tombstone version.
    #[inline]
    pub const fn is_tombstone(self) -> bool {
        self.version() == TOMBSTONE_VERSION
    }

    /// The raw packed representation.
    #[inline]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Reconstructs an entity from a previously-packed representation.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Entity(bits)
    }
}

/// Advances a version counter by one slot-recycle, skipping the tombstone
/// version: if the increment would land exactly on [`TOMBSTONE_VERSION`],
/// the result wraps to `0` instead.
#[inline]
pub const fn next_version(version: Index) -> Index {
    let next = (version + 1) & VERSION_MASK;
    if next == TOMBSTONE_VERSION {
        0
    } else {
        next
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({}v{})", self.index(), self.version())
        }
    }
}

impl Default for Entity {
    /// The default entity is the null sentinel, matching `Entity::null()`.
    fn default() -> Self {
        Entity::null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_roundtrip() {
        let e = Entity::new(42, 7);
        assert_eq!(e.index(), 42);
        assert_eq!(e.version(), 7);
    }

    #[test]
    fn null_is_not_a_real_slot() {
        assert!(Entity::null().is_null());
        assert!(!Entity::new(0, 0).is_null());
    }

    #[test]
    fn tombstone_is_not_a_real_version() {
        assert!(Entity::tombstone().is_tombstone());
        assert!(!Entity::new(0, 0).is_tombstone());
    }

    #[test]
    fn next_version_skips_tombstone() {
        let before_wrap = TOMBSTONE_VERSION - 1;
        assert_eq!(next_version(before_wrap), 0);
        assert_eq!(next_version(0), 1);
    }

    #[test]
    fn equality_considers_both_fields() {
        assert_eq!(Entity::new(3, 1), Entity::new(3, 1));
        assert_ne!(Entity::new(3, 1), Entity::new(3, 2));
        assert_ne!(Entity::new(3, 1), Entity::new(4, 1));
    }
}
