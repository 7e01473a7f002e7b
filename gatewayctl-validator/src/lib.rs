pub mod envelope;
pub mod validator;

pub use envelope::{parse, ContentType, ParseError, SubmittedDocument};
pub use validator::validate;
