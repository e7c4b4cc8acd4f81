pub mod draft;
pub mod transaction_metadata;
pub mod types;

pub use draft::{DraftInput, SignMode, TransactionDraft};
pub use transaction_metadata::DraftMetadata;
pub use types::{
    Cosignature, FinalizeRequest, FinalizeResponse, HashRequest, HashResponse, RawHashResponse,
    SighashType, SubmitResult, UtxoListResponse,
};
