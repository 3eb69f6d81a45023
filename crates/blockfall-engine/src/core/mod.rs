pub use self::{matrix::*, piece::*};

pub(crate) mod matrix;
pub(crate) mod piece;
