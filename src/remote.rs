/// A padding oracle reached over HTTP, as served by `server`.
use log::trace;
use reqwest::{blocking::Client, StatusCode};

use std::time::Duration;

use crate::{OracleError, PaddingOracle};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RemoteOracle {
    client: Client,
    base_url: String,
}

impl RemoteOracle {
    pub fn new(base_url: impl Into<String>) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport_error)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Have the server encrypt `message` under its secret key.
    pub fn encrypt(&self, message: &[u8]) -> Result<Vec<u8>, OracleError> {
        let uri = format!("{}/encrypt?message={}", self.base_url, hex::encode(message));
        let response = self.client.get(uri).send().map_err(transport_error)?;
        if response.status() != StatusCode::OK {
            return Err(OracleError::Transport(format!(
                "encrypt failed with status {}",
                response.status()
            )));
        }
        let body = response.text().map_err(transport_error)?;
        hex::decode(body.trim())
            .map_err(|e| OracleError::Transport(format!("server sent malformed ciphertext: {e}")))
    }
}

impl PaddingOracle for RemoteOracle {
    fn query_padding_valid(&self, ciphertext: &[u8]) -> Result<bool, OracleError> {
        let uri = format!("{}/oracle?ciphertext={}", self.base_url, hex::encode(ciphertext));
        let response = self.client.get(uri).send().map_err(transport_error)?;
        trace!("oracle answered {}", response.status());
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::INTERNAL_SERVER_ERROR => Ok(false),
            status => Err(OracleError::Transport(format!("unexpected status {status}"))),
        }
    }
}

fn transport_error(err: reqwest::Error) -> OracleError {
    OracleError::Transport(err.to_string())
}
