pub mod use_session;

pub use use_session::{use_session, SessionHandle};
