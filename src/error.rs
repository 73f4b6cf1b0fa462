use std::fmt::{Debug, Display};
use thiserror::Error;
use tokio::sync::mpsc::error::SendError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("bad payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("send error: {0}")]
    Send(Box<dyn std::error::Error + Send>),
}

impl<T: 'static + Debug + Display + Send> From<SendError<T>> for Error {
    fn from(err: SendError<T>) -> Self {
        Error::Send(Box::new(err))
    }
}
