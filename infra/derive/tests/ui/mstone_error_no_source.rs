use mstone_derive::mstone_error;
use std::borrow::Cow;

#[mstone_error]
pub enum StatusError {
    #[error("Rejected{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Unknown module: {module}")]
    Unknown { module: String },
}

fn main() {
    let err: Result<(), StatusError> =
        Err(StatusError::Rejected { message: "busy".into(), context: None });
    let _ = StatusErrorExt::context(err, "loading Module01");
}
