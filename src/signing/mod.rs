//! Draft construction and the two-phase signing protocol

pub mod coordinator;
pub mod models;
pub mod prepare;

pub use coordinator::{SigningCoordinator, SigningSession, SigningState};
pub use models::{Cosignature, SighashType, SubmitResult, TransactionDraft};
pub use prepare::{DraftBuilder, DraftRequest, InputSelector, UtxoSelection};
