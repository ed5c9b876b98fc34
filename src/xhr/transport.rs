// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Real `open` / `send` implementations

use tokio::runtime::Handle;

use super::handle::XhrHandle;
use super::prototype::SendArgs;
use crate::error::{Error, Result};
use crate::http::HttpClient;

/// What the host does when nobody has hooked `open` or `send`
pub trait XhrTransport: Send + Sync {
    /// Validate and record the request target
    fn open(&self, xhr: &XhrHandle, method: &str, url: &str) -> Result<()> {
        xhr.begin_open(method, url)
    }

    /// Start transmission. Returns before the response arrives; completion
    /// is reported through the handle's ready state.
    fn send(&self, xhr: &XhrHandle, args: SendArgs) -> Result<()>;
}

/// Transport backed by [`HttpClient`] on a tokio runtime
pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    /// Transmits on the runtime of whichever task calls `send`
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    fn runtime() -> Result<Handle> {
        Handle::try_current()
            .map_err(|_| Error::network("no tokio runtime available to transmit request"))
    }
}

impl XhrTransport for HttpTransport {
    fn send(&self, xhr: &XhrHandle, args: SendArgs) -> Result<()> {
        let runtime = Self::runtime()?;
        let request = xhr.mark_sent(&args)?;
        let client = self.client.clone();
        let xhr = xhr.clone();

        tracing::debug!(
            id = xhr.id(),
            method = %request.method,
            url = %request.url,
            "Transmitting request"
        );

        runtime.spawn(async move {
            let outcome = match client.execute(request).await {
                Ok(response) => xhr.complete(response),
                Err(e) => {
                    tracing::debug!(id = xhr.id(), error = %e, "Request failed");
                    xhr.fail(e.to_string())
                }
            };

            // Nobody is left to receive a handler failure at this point
            if let Err(e) = outcome {
                tracing::error!(id = xhr.id(), error = %e, "readystatechange handler failed");
            }
        });

        Ok(())
    }
}
