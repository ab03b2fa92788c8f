//! Minimal blocking HTTP boundary used by apps.

use alloc::string::String;
use alloc::vec::Vec;

use thiserror::Error;

/// Largest body an app will accept.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("response larger than 64 KiB")]
    TooLarge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

pub trait HttpClient {
    /// GET `url` with extra request headers. Any status is a response; only
    /// transport failures are errors.
    fn get(&mut self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, FetchError>;
}
