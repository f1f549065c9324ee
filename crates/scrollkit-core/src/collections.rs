//! Hashing and map shims.
//!
//! Mirrors the runtime's `std-hash` escape hatch: by default the faster
//! `hashbrown`/`ahash` pair is used, with `std` equivalents available for
//! hosts that want to avoid the extra dependencies.

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::{HashMap, HashSet};
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use hashbrown::{HashMap, HashSet};
}

pub mod hashing {
    use core::hash::{Hash, Hasher};

    #[cfg(feature = "std-hash")]
    pub use std::collections::hash_map::DefaultHasher;

    #[cfg(not(feature = "std-hash"))]
    pub use ahash::AHasher as DefaultHasher;

    /// Hash a single value with whichever default hasher is active.
    #[inline]
    pub fn hash_one<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::default();
        value.hash(&mut hasher);
        hasher.finish()
    }
}
