// Copyright 2026 the Prism authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A macro to define bitflags in a structured way.

/// Defines a transparent bitflag struct with the usual set operations.
///
/// Flags are declared as associated constants; combinations can be built
/// with `|` or [`with`](`crate::rhi::ResourceUsage::with`) in const context.
#[macro_export]
#[doc(hidden)]
macro_rules! prism_bitflags {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident: $ty:ty {
            $(
                $(#[$flag_attr:meta])*
                const $flag_name:ident = $flag_value:expr;
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name {
            bits: $ty,
        }

        impl $name {
            /// An empty set of flags.
            pub const EMPTY: Self = Self { bits: 0 };

            $(
                $(#[$flag_attr])*
                pub const $flag_name: Self = Self { bits: $flag_value };
            )*

            /// Creates a flag set from raw bits.
            pub const fn from_bits(bits: $ty) -> Self {
                Self { bits }
            }

            /// Returns the raw bits of the set.
            pub const fn bits(&self) -> $ty {
                self.bits
            }

            /// Returns `true` if all flags in `other` are set in `self`.
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// Returns `true` if any flag in `other` is set in `self`.
            pub const fn intersects(&self, other: Self) -> bool {
                (self.bits & other.bits) != 0
            }

            /// Inserts the flags in `other` into `self`.
            pub fn insert(&mut self, other: Self) {
                self.bits |= other.bits;
            }

            /// Removes the flags in `other` from `self`.
            pub fn remove(&mut self, other: Self) {
                self.bits &= !other.bits;
            }

            /// Returns a copy of `self` with `other` inserted.
            #[must_use]
            pub const fn with(self, other: Self) -> Self {
                Self {
                    bits: self.bits | other.bits,
                }
            }

            /// Returns `true` if no flags are set.
            pub const fn is_empty(&self) -> bool {
                self.bits == 0
            }
        }

        impl core::ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self {
                    bits: self.bits | rhs.bits,
                }
            }
        }

        impl core::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.bits |= rhs.bits;
            }
        }
    };
}

#[cfg(test)]
mod tests {
    prism_bitflags! {
        /// Flags used only by this test.
        struct TestFlags: u32 {
            /// First bit.
            const A = 1 << 0;
            /// Second bit.
            const B = 1 << 1;
        }
    }

    #[test]
    fn contains_and_union() {
        let ab = TestFlags::A | TestFlags::B;
        assert!(ab.contains(TestFlags::A));
        assert!(ab.contains(TestFlags::B));
        assert!(!TestFlags::A.contains(ab));
        assert!(TestFlags::A.intersects(ab));
    }

    #[test]
    fn insert_remove_roundtrip() {
        let mut flags = TestFlags::EMPTY;
        assert!(flags.is_empty());
        flags.insert(TestFlags::A);
        assert!(flags.contains(TestFlags::A));
        flags.remove(TestFlags::A);
        assert!(flags.is_empty());
    }
}
