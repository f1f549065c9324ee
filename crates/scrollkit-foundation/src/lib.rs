//! Foundation elements for ScrollKit: mutually exclusive UI selection state.

pub mod selection;

pub use selection::*;

pub mod prelude {
    pub use crate::selection::{
        accordion_group, dropdown_group, modal_group, SelectionGroup,
    };
}
