use thiserror::Error;

#[derive(Error, Debug)]
#[error("Error loading file '{file}'")]
pub struct LoadError {
    pub file: String,
    #[source]
    pub detail: LoadErrorPayload,
}

#[derive(Error, Debug)]
pub enum LoadErrorPayload {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("Malformed song document: {0}")]
    ParseError(#[from] serde_json::Error),
}
