use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use super::{CatalogError, CatalogProvider};
use crate::domain::catalog::CatalogEntry;

/// Remote catalog served as a JSON array of entries.
#[derive(Clone, Debug)]
pub struct HttpCatalogProvider {
    client: Client,
    url: String,
    api_token: Option<SecretString>,
}

impl HttpCatalogProvider {
    pub fn new(
        url: impl Into<String>,
        api_token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| CatalogError::Unavailable(format!("http client setup failed: {error}")))?;
        Ok(Self { client, url: url.into(), api_token })
    }
}

#[async_trait]
impl CatalogProvider for HttpCatalogProvider {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|error| CatalogError::Unavailable(error.to_string()))?
            .error_for_status()
            .map_err(|error| CatalogError::Unavailable(error.to_string()))?;

        response
            .json::<Vec<CatalogEntry>>()
            .await
            .map_err(|error| CatalogError::InvalidPayload(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::HttpCatalogProvider;
    use crate::catalog::{CatalogError, CatalogProvider};

    /// Answers a single request with `status` and `body`, returning the raw request text.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buffer = vec![0_u8; 4096];
            let read = socket.read(&mut buffer).await.expect("read request");
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.expect("write response");
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buffer[..read]).to_string()
        });

        (format!("http://{address}/movies"), handle)
    }

    #[tokio::test]
    async fn fetches_entries_with_bearer_token() {
        let (url, server) =
            serve_once("200 OK", r#"[{"name":"WAR","options":[{"label":"10pm","price":"400"}]}]"#)
                .await;
        let provider = HttpCatalogProvider::new(
            url,
            Some("catalog-token".to_string().into()),
            Duration::from_secs(2),
        )
        .expect("client");

        let entries = provider.fetch_catalog().await.expect("catalog");
        let request = server.await.expect("server task");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].options[0].label, "10pm");
        assert!(request.to_ascii_lowercase().contains("authorization: bearer catalog-token"));
    }

    #[tokio::test]
    async fn server_error_is_reported_as_unavailable() {
        let (url, server) = serve_once("503 Service Unavailable", "{}").await;
        let provider = HttpCatalogProvider::new(url, None, Duration::from_secs(2)).expect("client");

        let result = provider.fetch_catalog().await;
        let _ = server.await;

        assert!(matches!(result, Err(CatalogError::Unavailable(_))));
    }

    #[tokio::test]
    async fn unexpected_body_is_reported_as_invalid_payload() {
        let (url, server) = serve_once("200 OK", r#"{"movies":[]}"#).await;
        let provider = HttpCatalogProvider::new(url, None, Duration::from_secs(2)).expect("client");

        let result = provider.fetch_catalog().await;
        let _ = server.await;

        assert!(matches!(result, Err(CatalogError::InvalidPayload(_))));
    }
}
