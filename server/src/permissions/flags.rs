//! Role permissions using bitflags.
//!
//! Each capability owns exactly one bit. The layout is shared with external
//! permission editors and must not be reordered:
//! - Users (bits 0-3): Create, Read, Update, Delete
//! - Roles (bits 4-7): Create, Read, Update, Delete
//! - Posts (bits 8-10): Create, Update, Delete
//! - Tags (bits 11-14): Create, Read, Update, Delete

use bitflags::bitflags;

bitflags! {
    /// Role permissions represented as a 64-bit bitfield.
    ///
    /// Stored as BIGINT in `PostgreSQL` and exchanged as a plain integer in JSON.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    #[serde(from = "u64", into = "u64")]
    pub struct Permissions: u64 {
        // === Users (bits 0-3) ===
        /// Create user accounts
        const CREATE_USERS = 1 << 0;
        /// List and inspect user accounts
        const READ_USERS   = 1 << 1;
        /// Edit other users and their role assignments
        const UPDATE_USERS = 1 << 2;
        /// Soft-delete user accounts
        const DELETE_USERS = 1 << 3;

        // === Roles (bits 4-7) ===
        /// Create roles
        const CREATE_ROLES = 1 << 4;
        /// List roles and audit history
        const READ_ROLES   = 1 << 5;
        /// Edit role names and permission masks
        const UPDATE_ROLES = 1 << 6;
        /// Remove roles
        const DELETE_ROLES = 1 << 7;

        // === Posts (bits 8-10) ===
        /// Publish new posts
        const CREATE_POSTS = 1 << 8;
        /// Edit, archive and download posts
        const UPDATE_POSTS = 1 << 9;
        /// Soft-delete and restore posts
        const DELETE_POSTS = 1 << 10;

        // === Tags (bits 11-14) ===
        /// Create tags
        const CREATE_TAGS  = 1 << 11;
        /// List tags
        const READ_TAGS    = 1 << 12;
        /// Rename tags
        const UPDATE_TAGS  = 1 << 13;
        /// Remove tags
        const DELETE_TAGS  = 1 << 14;
    }
}

impl Permissions {
    /// Editor preset: may create and update posts.
    pub const EDITOR: Self = Self::CREATE_POSTS.union(Self::UPDATE_POSTS);

    // === Database Conversion ===

    /// Create permissions from a database BIGINT value.
    ///
    /// Unknown bits are dropped so a newer schema cannot grant capabilities
    /// this build does not understand.
    #[must_use]
    pub const fn from_db(value: i64) -> Self {
        Self::from_bits_truncate(value as u64)
    }

    /// Convert permissions to a database BIGINT value.
    #[must_use]
    pub const fn to_db(self) -> i64 {
        self.bits() as i64
    }

    /// Parse a raw mask from a client, rejecting undefined bits.
    #[must_use]
    pub const fn from_raw(value: u64) -> Option<Self> {
        Self::from_bits(value)
    }

    // === Permission Checking ===

    /// Check whether this set contains every bit of `permission`.
    ///
    /// Equivalent to `(self & permission) == permission`.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_server::permissions::Permissions;
    ///
    /// let editor = Permissions::CREATE_POSTS | Permissions::UPDATE_POSTS;
    /// assert!(editor.has(Permissions::UPDATE_POSTS));
    /// assert!(!editor.has(Permissions::DELETE_POSTS));
    /// ```
    #[must_use]
    pub const fn has(self, permission: Self) -> bool {
        self.contains(permission)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<u64> for Permissions {
    fn from(value: u64) -> Self {
        Self::from_bits_retain(value)
    }
}

impl From<Permissions> for u64 {
    fn from(value: Permissions) -> Self {
        value.bits()
    }
}

impl From<i64> for Permissions {
    fn from(value: i64) -> Self {
        Self::from_db(value)
    }
}
