use crate::utils::config::StorageConfig;
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, StatusCode,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use ulid::Ulid;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    UploadFailed,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UploadedMedia {
    pub public_id: String,
    pub url: String,
    pub timestamp: i64,
}

/// An external host that stores uploaded images and hands back a public url.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn upload(&self, contents: Vec<u8>) -> Result<UploadedMedia, Error>;
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

enum AttemptError {
    Transient,
    Permanent,
}

pub struct CloudinaryStorage {
    cfg: StorageConfig,
    client: Client,
}

impl CloudinaryStorage {
    pub fn new(cfg: StorageConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { cfg, client })
    }

    async fn try_upload(
        &self,
        contents: Vec<u8>,
        timestamp: i64,
    ) -> Result<UploadedMedia, AttemptError> {
        let file_name = Ulid::new().to_string();
        let part = Part::bytes(contents).file_name(file_name);

        let signature = sign(
            &[
                ("folder", self.cfg.folder.clone()),
                ("timestamp", timestamp.to_string()),
                ("upload_preset", self.cfg.upload_preset.clone()),
            ],
            &self.cfg.api_secret,
        );

        let form = Form::new()
            .text("folder", self.cfg.folder.clone())
            .text("upload_preset", self.cfg.upload_preset.clone())
            .text("api_key", self.cfg.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
            .part("file", part);

        let res = self
            .client
            .post(self.cfg.upload_endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                tracing::error!("Error occurred while trying to upload a file: {:?}", err);
                AttemptError::Transient
            })?;

        let status = res.status();
        let data = res.text().await.map_err(|err| {
            tracing::error!("Error occurred while processing return data: {:?}", err);
            AttemptError::Transient
        })?;

        if status != StatusCode::OK {
            tracing::error!("Failed to upload file ({}): {}", status, data);
            return Err(match is_retryable_status(status) {
                true => AttemptError::Transient,
                false => AttemptError::Permanent,
            });
        }

        serde_json::de::from_str::<UploadResponse>(data.as_ref())
            .map(|res| UploadedMedia {
                url: res.secure_url,
                public_id: res.public_id,
                timestamp,
            })
            .map_err(|err| {
                tracing::error!("Failed to deserialize cloudinary response: {:?}", err);
                AttemptError::Permanent
            })
    }
}

#[async_trait]
impl MediaStorage for CloudinaryStorage {
    async fn upload(&self, contents: Vec<u8>) -> Result<UploadedMedia, Error> {
        let mut attempt = 1;

        loop {
            let timestamp = chrono::Utc::now().timestamp();

            match self.try_upload(contents.clone(), timestamp).await {
                Ok(media) => return Ok(media),
                Err(AttemptError::Transient) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        "Upload attempt {} of {} failed, retrying",
                        attempt,
                        MAX_ATTEMPTS
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                    attempt += 1;
                }
                Err(_) => return Err(Error::UploadFailed),
            }
        }
    }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Cloudinary signature: sorted `key=value` pairs joined by `&`, followed by the secret.
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut params = params.to_vec();
    params.sort_by(|a, b| a.0.cmp(b.0));

    let data_to_sign = format!(
        "{}{}",
        params
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&"),
        api_secret
    );

    let mut hasher = Sha256::new();
    hasher.update(data_to_sign);
    base16ct::lower::encode_string(&hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_independent_of_param_order() {
        let a = sign(
            &[
                ("timestamp", "1700000000".to_string()),
                ("folder", "digital-menu".to_string()),
            ],
            "secret",
        );
        let b = sign(
            &[
                ("folder", "digital-menu".to_string()),
                ("timestamp", "1700000000".to_string()),
            ],
            "secret",
        );

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn signature_covers_the_secret() {
        let params = [("timestamp", "1700000000".to_string())];

        assert_ne!(sign(&params, "one"), sign(&params, "two"));
    }

    #[test]
    fn only_server_side_failures_are_retried() {
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
    }

    mod cloudinary {
        use super::super::*;
        use std::sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        };
        use tokio::{
            io::{AsyncReadExt, AsyncWriteExt},
            net::{TcpListener, TcpStream},
            time::Instant,
        };

        const UPLOADED: &str =
            r#"{"secure_url":"https://media.test/menu/paneer.png","public_id":"menu/paneer"}"#;

        fn position(haystack: &[u8], needle: &[u8]) -> Option<usize> {
            haystack.windows(needle.len()).position(|w| w == needle)
        }

        async fn read_request(socket: &mut TcpStream) {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];

            loop {
                let n = socket.read(&mut chunk).await.unwrap_or(0);
                if n == 0 {
                    return;
                }
                buf.extend_from_slice(&chunk[..n]);

                if let Some(end) = position(&buf, b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                    let body = &buf[end + 4..];
                    let length = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|value| value.trim().parse::<usize>().ok());

                    match length {
                        Some(length) if body.len() >= length => return,
                        None if position(body, b"0\r\n\r\n").is_some() => return,
                        _ => (),
                    }
                }
            }
        }

        /// Answers each connection with the next canned reply, repeating the last one.
        async fn media_host(replies: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let hits = Arc::new(AtomicUsize::new(0));
            let counter = hits.clone();

            tokio::spawn(async move {
                while let Ok((mut socket, _)) = listener.accept().await {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    let (status, body) = replies[n.min(replies.len() - 1)];

                    read_request(&mut socket).await;
                    let reply = format!(
                        "HTTP/1.1 {} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(reply.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
            });

            (format!("http://{}/v1_1/demo/image/upload", addr), hits)
        }

        fn storage(upload_endpoint: String) -> CloudinaryStorage {
            CloudinaryStorage::new(StorageConfig {
                api_key: "key".to_string(),
                api_secret: "secret".to_string(),
                upload_endpoint,
                upload_preset: "menu".to_string(),
                folder: "digital-menu".to_string(),
            })
            .unwrap()
        }

        #[tokio::test]
        async fn unavailable_host_is_retried_until_it_accepts() {
            let (endpoint, hits) = media_host(vec![(503, "{}"), (200, UPLOADED)]).await;

            let media = storage(endpoint).upload(vec![1, 2, 3]).await.unwrap();

            assert_eq!(media.public_id, "menu/paneer");
            assert_eq!(media.url, "https://media.test/menu/paneer.png");
            assert_eq!(hits.load(Ordering::SeqCst), 2);
        }

        #[tokio::test]
        async fn gives_up_after_three_attempts_with_growing_pauses() {
            let (endpoint, hits) = media_host(vec![(503, "{}")]).await;
            let started = Instant::now();

            let result = storage(endpoint).upload(vec![1, 2, 3]).await;

            assert_eq!(result.unwrap_err(), Error::UploadFailed);
            assert_eq!(hits.load(Ordering::SeqCst), 3);
            // 500ms after the first attempt, 1s after the second
            assert!(started.elapsed() >= RETRY_BACKOFF * 3);
        }

        #[tokio::test]
        async fn rejected_upload_is_not_retried() {
            let (endpoint, hits) =
                media_host(vec![(400, r#"{"error":{"message":"Invalid Signature"}}"#)]).await;

            let result = storage(endpoint).upload(vec![1, 2, 3]).await;

            assert_eq!(result.unwrap_err(), Error::UploadFailed);
            assert_eq!(hits.load(Ordering::SeqCst), 1);
        }
    }
}
