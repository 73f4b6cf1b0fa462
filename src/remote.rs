use async_trait::async_trait;

use crate::error::Error;
use crate::model::{Command, Snapshot};

/// The remote sheet endpoint: one GET for aggregate state, one POST
/// per command. Behind a trait so the app actor can run against a
/// stub transport in tests.
#[async_trait]
pub trait Remote: Send + Sync {
    async fn fetch(&self) -> Result<Snapshot, Error>;
    async fn send(&self, command: &Command) -> Result<(), Error>;
}

pub struct HttpRemote {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpRemote {
    pub fn new(endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn fetch(&self) -> Result<Snapshot, Error> {
        let snapshot = self
            .http
            .get(&self.endpoint)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(snapshot)
    }

    // Writes are fire-and-forget: the body is never read, success is
    // inferred from the call not failing in transport.
    async fn send(&self, command: &Command) -> Result<(), Error> {
        self.http.post(&self.endpoint).json(command).send().await?;
        Ok(())
    }
}
