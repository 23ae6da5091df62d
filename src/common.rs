use crate::error::HaproxyError;

pub type Result<T> = std::result::Result<T, HaproxyError>;

/// Option values a command is built from, after all configuration layers
/// have been merged.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Params {
    pub backend: Option<String>,
    pub server: Option<String>,
    pub weight: Option<String>,
}

impl Params {
    pub fn new() -> Params {
        Params::default()
    }

    pub fn backend(mut self, backend: impl Into<String>) -> Params {
        self.backend = Some(backend.into());
        self
    }

    pub fn server(mut self, server: impl Into<String>) -> Params {
        self.server = Some(server.into());
        self
    }

    pub fn weight(mut self, weight: impl Into<String>) -> Params {
        self.weight = Some(weight.into());
        self
    }
}
