pub mod draft;
pub mod store;

pub use draft::{DraftError, PredictionDraft};
pub use store::DraftStore;
