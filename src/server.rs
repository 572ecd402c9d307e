// An HTTP front end for `OracleService`, leaking padding errors the way a
// careless web application would: a request whose ciphertext decrypts to bad
// padding fails with a 500, anything else succeeds.
use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use log::{debug, error, info};
use tokio::net::{TcpListener, ToSocketAddrs};

use std::{collections::HashMap, sync::Arc};

use crate::OracleService;

/// Bind `address` and serve the oracle in the background, returning the
/// server's base URL.
pub async fn spawn_server(
    address: impl ToSocketAddrs,
    oracle: OracleService,
) -> std::io::Result<String> {
    let listener = TcpListener::bind(address).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = serve(listener, oracle).await {
            error!("padding oracle server stopped: {e}");
        }
    });
    Ok(format!("http://{}", addr))
}

pub async fn serve(listener: TcpListener, oracle: OracleService) -> std::io::Result<()> {
    info!("serving padding oracle on {}", listener.local_addr()?);
    axum::serve(listener, router(oracle)).await
}

pub fn router(oracle: OracleService) -> Router {
    let handler = OracleRequestHandler::new(oracle);
    Router::new()
        .route(
            "/oracle",
            get({
                let handler = handler.clone();
                move |query: Query<HashMap<String, String>>| async move {
                    handler.handle_oracle_request(query)
                }
            }),
        )
        .route(
            "/encrypt",
            get(move |query: Query<HashMap<String, String>>| async move {
                handler.handle_encrypt_request(query)
            }),
        )
}

#[derive(Clone)]
pub struct OracleRequestHandler {
    oracle: Arc<OracleService>,
}

impl OracleRequestHandler {
    pub fn new(oracle: OracleService) -> Self {
        Self {
            oracle: Arc::new(oracle),
        }
    }

    pub fn handle_oracle_request(&self, Query(params): Query<HashMap<String, String>>) -> Response {
        let ciphertext = match hex_param(&params, "ciphertext") {
            Ok(c) => c,
            Err(response) => return response,
        };

        let valid = self.oracle.is_padding_valid(&ciphertext);
        debug!("padding query on {} bytes: {valid}", ciphertext.len());
        if valid {
            (StatusCode::OK, "Padding is valid").into_response()
        } else {
            (StatusCode::INTERNAL_SERVER_ERROR, "Invalid padding").into_response()
        }
    }

    pub fn handle_encrypt_request(
        &self,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        let message = match hex_param(&params, "message") {
            Ok(m) => m,
            Err(response) => return response,
        };

        let ciphertext = self.oracle.encrypt(&message);
        (StatusCode::OK, hex::encode(ciphertext)).into_response()
    }
}

fn hex_param(params: &HashMap<String, String>, name: &str) -> Result<Vec<u8>, Response> {
    match params.get(name) {
        Some(value) => hex::decode(value).map_err(|e| {
            (StatusCode::BAD_REQUEST, format!("Illegal {name}: {e}")).into_response()
        }),
        None => Err((StatusCode::BAD_REQUEST, format!("Missing '{name}' parameter")).into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::{rngs::StdRng, SeedableRng};

    fn oracle() -> OracleService {
        OracleService::new(*b"YELLOW SUBMARINE", StdRng::seed_from_u64(101))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn oracle_endpoint_reports_padding_through_status() {
        let local = oracle();
        let ciphertext = local.encrypt(b"HELLO WORLD!!!!");
        let mut tampered = ciphertext.clone();
        tampered[15] ^= 0x01 ^ 0x03;
        let addr = spawn_server("127.0.0.1:0", local).await.unwrap();

        let valid = reqwest::get(format!("{addr}/oracle?ciphertext={}", hex::encode(&ciphertext)))
            .await
            .unwrap();
        let invalid = reqwest::get(format!("{addr}/oracle?ciphertext={}", hex::encode(&tampered)))
            .await
            .unwrap();

        assert_eq!(valid.status(), StatusCode::OK);
        assert_eq!(invalid.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn oracle_endpoint_reports_short_input_as_invalid_padding() {
        let addr = spawn_server("127.0.0.1:0", oracle()).await.unwrap();

        let response = reqwest::get(format!("{addr}/oracle?ciphertext=00ff"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn oracle_endpoint_rejects_bad_requests() {
        let addr = spawn_server("127.0.0.1:0", oracle()).await.unwrap();

        let missing = reqwest::get(format!("{addr}/oracle")).await.unwrap();
        let not_hex = reqwest::get(format!("{addr}/oracle?ciphertext=xyz"))
            .await
            .unwrap();

        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(not_hex.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn encrypt_endpoint_returns_hex_ciphertext() {
        let addr = spawn_server("127.0.0.1:0", oracle()).await.unwrap();

        let response = reqwest::get(format!("{addr}/encrypt?message={}", hex::encode("hi")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let ciphertext = hex::decode(response.text().await.unwrap()).unwrap();
        assert_eq!(ciphertext.len(), 32);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn oracle_endpoint_serves_concurrent_queries() {
        let local = oracle();
        let ciphertext = local.encrypt(b"many at once");
        let addr = spawn_server("127.0.0.1:0", local).await.unwrap();
        let uri = format!("{addr}/oracle?ciphertext={}", hex::encode(&ciphertext));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let uri = uri.clone();
            tasks.spawn(async move { reqwest::get(uri).await.unwrap().status() });
        }

        while let Some(status) = tasks.join_next().await {
            assert_eq!(status.unwrap(), StatusCode::OK);
        }
    }
}
