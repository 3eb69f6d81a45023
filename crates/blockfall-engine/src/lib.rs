pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum HoldError {
    #[display("hold already used for this piece")]
    AlreadyUsed,
    #[display("no active piece to hold")]
    NoActivePiece,
}
