pub mod draft_builder;
pub mod input_selector;

pub use draft_builder::{DraftBuilder, DraftRequest};
pub use input_selector::{InputSelector, UtxoSelection};
