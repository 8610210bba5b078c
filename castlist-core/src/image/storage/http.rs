use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Body, Client, Response};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tracing::debug;
use url::Url;

use crate::error::{CatalogError, Result};
use crate::image::ports::{ImageBlobStore, UploadStream};

/// Chunks buffered between the pipeline and the in-flight request body.
const UPLOAD_BUFFER: usize = 4;

#[derive(Debug, Deserialize)]
struct ImageIdResponse {
    image_id: String,
}

/// Blob store client speaking plain HTTP:
///
/// - `POST {base}/images/{category}` with a streamed body creates a blob,
/// - `PUT {base}/images/{category}/{id}?create_if_not_exist=..` replaces one,
/// - `DELETE {base}/images/{category}/{id}` removes one.
///
/// Create and replace answer with `{"image_id": ".."}`.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: Client,
    base_url: Url,
}

impl HttpBlobStore {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            CatalogError::Internal(format!("Failed to create HTTP client: {}", e))
        })?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                CatalogError::Internal(format!(
                    "Blob store url cannot be a base: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push("images")
            .extend(segments);
        Ok(url)
    }
}

async fn read_image_id(response: Response, action: &str) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CatalogError::Internal(format!(
            "Failed to {} image: HTTP {} {}",
            action, status, body
        )));
    }
    response
        .json::<ImageIdResponse>()
        .await
        .map(|r| r.image_id)
        .map_err(|e| {
            CatalogError::Internal(format!(
                "Failed to read {} response: {}",
                action, e
            ))
        })
}

/// Streamed request body. The stream only ends cleanly once the uploader
/// marked it finished; a sender dropped earlier surfaces as a body error so
/// the request is aborted instead of committing a truncated blob.
struct UploadBody {
    rx: mpsc::Receiver<io::Result<Vec<u8>>>,
    finished: Arc<AtomicBool>,
    done: bool,
}

impl Stream for UploadBody {
    type Item = io::Result<Vec<u8>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(chunk)) => Poll::Ready(Some(chunk)),
            Poll::Ready(None) => {
                self.done = true;
                if self.finished.load(Ordering::Acquire) {
                    Poll::Ready(None)
                } else {
                    Poll::Ready(Some(Err(io::Error::new(
                        io::ErrorKind::ConnectionAborted,
                        "upload abandoned before finish",
                    ))))
                }
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Request body fed through a channel while the request runs on its own task.
struct HttpUploadStream {
    tx: Option<mpsc::Sender<io::Result<Vec<u8>>>>,
    finished: Arc<AtomicBool>,
    request: Option<JoinHandle<Result<String>>>,
}

fn stream_closed() -> CatalogError {
    CatalogError::Internal(
        "error while sending image chunk: upload stream closed".to_string(),
    )
}

async fn join_upload(request: JoinHandle<Result<String>>) -> Result<String> {
    request
        .await
        .map_err(|e| CatalogError::Internal(format!("Upload task failed: {}", e)))?
}

#[async_trait]
impl UploadStream for HttpUploadStream {
    async fn send(&mut self, chunk: Vec<u8>) -> Result<()> {
        let Some(tx) = &self.tx else {
            return Err(stream_closed());
        };
        if tx.send(Ok(chunk)).await.is_ok() {
            return Ok(());
        }

        // The request task dropped the body; its own error explains why.
        self.tx = None;
        match self.request.take() {
            Some(request) => match join_upload(request).await {
                Err(err) => Err(err),
                Ok(_) => Err(stream_closed()),
            },
            None => Err(stream_closed()),
        }
    }

    async fn finish(mut self: Box<Self>) -> Result<String> {
        self.finished.store(true, Ordering::Release);
        self.tx = None;
        match self.request.take() {
            Some(request) => join_upload(request).await,
            None => Err(stream_closed()),
        }
    }
}

impl Drop for HttpUploadStream {
    fn drop(&mut self) {
        if let Some(request) = self.request.take() {
            request.abort();
        }
    }
}

#[async_trait]
impl ImageBlobStore for HttpBlobStore {
    async fn start_upload(&self, category: &str) -> Result<Box<dyn UploadStream>> {
        let url = self.endpoint(&[category])?;
        debug!(%url, "opening upload stream");

        let (tx, rx) = mpsc::channel(UPLOAD_BUFFER);
        let finished = Arc::new(AtomicBool::new(false));
        let body = Body::wrap_stream(UploadBody {
            rx,
            finished: Arc::clone(&finished),
            done: false,
        });
        let request = self.client.post(url).body(body);

        let request = tokio::spawn(async move {
            let response = request.send().await.map_err(|e| {
                CatalogError::Internal(format!("Failed to upload image: {}", e))
            })?;
            read_image_id(response, "upload").await
        });

        Ok(Box::new(HttpUploadStream {
            tx: Some(tx),
            finished,
            request: Some(request),
        }))
    }

    async fn replace(
        &self,
        category: &str,
        id: &str,
        image: Vec<u8>,
        create_if_not_exist: bool,
    ) -> Result<String> {
        let url = self.endpoint(&[category, id])?;
        let response = self
            .client
            .put(url)
            .query(&[("create_if_not_exist", create_if_not_exist)])
            .body(image)
            .send()
            .await
            .map_err(|e| {
                CatalogError::Internal(format!("Failed to replace image: {}", e))
            })?;
        read_image_id(response, "replace").await
    }

    async fn delete(&self, category: &str, id: &str) -> Result<()> {
        let url = self.endpoint(&[category, id])?;
        let response = self.client.delete(url).send().await.map_err(|e| {
            CatalogError::Internal(format!("Failed to delete image: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(CatalogError::Internal(format!(
                "Failed to delete image: HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    const CHUNKED_END: &[u8] = b"0\r\n\r\n";

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    async fn listen() -> (TcpListener, Url) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        (listener, Url::parse(&format!("http://{addr}/")).expect("url"))
    }

    /// Read from `socket` until `stop` matches the bytes seen so far or the
    /// peer goes away.
    async fn read_until(
        socket: &mut TcpStream,
        received: &mut Vec<u8>,
        stop: impl Fn(&[u8]) -> bool,
    ) {
        let mut buf = [0u8; 1024];
        while !stop(received) {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => received.extend_from_slice(&buf[..n]),
            }
        }
    }

    fn store(base: &str) -> HttpBlobStore {
        HttpBlobStore::new(Url::parse(base).expect("url"), Duration::from_secs(5))
            .expect("client")
    }

    #[test]
    fn endpoints_append_to_base_path() {
        let store = store("http://storage.local/api/");
        assert_eq!(
            store.endpoint(&["persons", "abc"]).expect("url").as_str(),
            "http://storage.local/api/images/persons/abc"
        );
    }

    #[test]
    fn endpoint_segments_are_percent_encoded() {
        let store = store("http://storage.local");
        assert_eq!(
            store.endpoint(&["persons", "a/b"]).expect("url").as_str(),
            "http://storage.local/images/persons/a%2Fb"
        );
    }

    #[tokio::test]
    async fn finished_upload_returns_stored_id() {
        let (listener, base) = listen().await;
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut received = Vec::new();
            read_until(&mut socket, &mut received, |seen| seen.ends_with(CHUNKED_END))
                .await;
            let body = r#"{"image_id":"abc"}"#;
            let response = format!(
                "HTTP/1.1 201 Created\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.expect("write");
            received
        });

        let mut upload = store(base.as_str())
            .start_upload("persons")
            .await
            .expect("start");
        upload.send(b"FIRST-".to_vec()).await.expect("send");
        upload.send(b"SECOND".to_vec()).await.expect("send");
        let id = upload.finish().await.expect("finish");

        assert_eq!(id, "abc");
        let received = server.await.expect("server");
        assert!(contains(&received, b"POST /images/persons HTTP/1.1"));
        assert!(contains(&received, b"FIRST-"));
        assert!(contains(&received, b"SECOND"));
    }

    #[tokio::test]
    async fn dropped_upload_never_completes_the_body() {
        let (listener, base) = listen().await;
        let (first_chunk_tx, first_chunk_rx) = oneshot::channel();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut received = Vec::new();
            read_until(&mut socket, &mut received, |seen| contains(seen, b"FIRST-CHUNK"))
                .await;
            let _ = first_chunk_tx.send(());
            read_until(&mut socket, &mut received, |seen| seen.ends_with(CHUNKED_END))
                .await;
            received
        });

        let mut upload = store(base.as_str())
            .start_upload("persons")
            .await
            .expect("start");
        upload.send(b"FIRST-CHUNK".to_vec()).await.expect("send");
        timeout(Duration::from_secs(5), first_chunk_rx)
            .await
            .expect("chunk reached the server")
            .expect("server alive");
        drop(upload);

        let received = timeout(Duration::from_secs(5), server)
            .await
            .expect("connection closed")
            .expect("server");
        assert!(contains(&received, b"FIRST-CHUNK"));
        assert!(
            !received.ends_with(CHUNKED_END),
            "body was terminated: {:?}",
            String::from_utf8_lossy(&received)
        );
    }

    #[tokio::test]
    async fn send_reports_the_request_failure() {
        let (listener, base) = listen().await;
        drop(listener);

        let mut upload = store(base.as_str())
            .start_upload("persons")
            .await
            .expect("start");
        let err = timeout(Duration::from_secs(5), async {
            loop {
                if let Err(err) = upload.send(b"chunk".to_vec()).await {
                    break err;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("send fails once the request gives up");

        assert!(
            err.to_string().contains("Failed to upload image"),
            "{err}"
        );
    }
}
