//! Small bit-sets for path attributes and path actions.

use std::ops::{BitOr, BitOrAssign};

macro_rules! bitset {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $flag:ident = $bit:expr,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
        pub struct $name(u8);

        // Not every generated set uses every operation.
        #[allow(dead_code)]
        impl $name {
            pub const NONE: Self = Self(0);
            $($(#[$fmeta])* pub const $flag: Self = Self(1 << $bit);)+

            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            pub const fn intersection(self, other: Self) -> Self {
                Self(self.0 & other.0)
            }

            pub const fn without(self, other: Self) -> Self {
                Self(self.0 & !other.0)
            }

            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }
    };
}

bitset! {
    /// Attributes a probe can require of a path.
    Attrs {
        EXISTS = 0,
        READABLE = 1,
        WRITABLE = 2,
        EXECUTABLE = 3,
        FILE = 4,
        DIRECTORY = 5,
        /// Only checked when the path exists.
        HIDDEN = 6,
        /// Only checked when the path exists.
        SYMLINK = 7,
    }
}

bitset! {
    /// Mutations a probe may perform. Any action bypasses the cache.
    Actions {
        CREATE = 0,
        UPDATE = 1,
        DELETE = 2,
    }
}

impl Attrs {
    /// Attributes that are skipped, not failed, for a missing path.
    pub const EXISTENTIAL: Self = Self(Self::HIDDEN.0 | Self::SYMLINK.0);
}
