//! Testing utilities and harness for ScrollKit.

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
}
