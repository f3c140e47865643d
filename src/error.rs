use std::{
    error::Error,
    fmt::{Display, Formatter},
};

/// Result type used throughout the crate.
pub type FireChangeResult<T> = Result<T, Box<dyn Error>>;

/// A request for data was rejected before anything was fetched or computed.
///
/// Bad bounding boxes, day ranges outside what FIRMS allows, and unparseable period dates all end
/// up here. A web layer would report these as a 4xx.
#[derive(Debug, Clone)]
pub struct InvalidRequest {
    pub msg: String,
}

impl InvalidRequest {
    pub(crate) fn new<S: Into<String>>(msg: S) -> Self {
        InvalidRequest { msg: msg.into() }
    }
}

impl Display for InvalidRequest {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.msg)
    }
}

impl Error for InvalidRequest {}

/// The fire data provider answered, but not with anything usable.
#[derive(Debug, Clone)]
pub struct UpstreamError {
    pub msg: String,
    /// HTTP status code returned by the provider, if there was one.
    pub status: Option<u16>,
}

impl Display for UpstreamError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        match self.status {
            Some(status) => write!(f, "{} (status {})", self.msg, status),
            None => write!(f, "{}", self.msg),
        }
    }
}

impl Error for UpstreamError {}
