use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocalModelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model server returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to parse response line: {source}\n  line: {line}")]
    Parse {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("model server error: {0}")]
    Api(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}
