use std::{
    fmt, io,
    num::{ParseFloatError, ParseIntError},
    str::Utf8Error,
};
use quick_xml::events::attributes::AttrError;

#[derive(Debug)]
pub struct Error {
    pub message: String,
}

impl Error {
    pub fn new(message: impl Into<String>) -> Self {
        Error { message: message.into() }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

macro_rules! error_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for Error {
                fn from(value: $source) -> Self {
                    Error::new(value.to_string())
                }
            }
        )*
    };
}

error_from!(
    io::Error,
    quick_xml::Error,
    AttrError,
    serde_json::Error,
    ParseFloatError,
    ParseIntError,
    Utf8Error,
    &str,
);

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::new(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Prefixes a failure with what was being attempted, e.g. the file being read.
pub trait Context<T> {
    fn context<C: fmt::Display>(self, context: C) -> Result<T>;
}

impl<T, E: fmt::Display> Context<T> for std::result::Result<T, E> {
    fn context<C: fmt::Display>(self, context: C) -> Result<T> {
        self.map_err(|err| Error::new(format!("{}: {}", context, err)))
    }
}
