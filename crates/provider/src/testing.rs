//! Mock HTTP endpoint for exercising API-backed providers in tests.
//!
//! Helpers here panic on I/O failure; they are meant for test code only.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// A request captured by [`MockServer`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Request line and headers, without the blank separator line.
    pub head: String,
    pub body: String,
}

impl CapturedRequest {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }
}

/// Serves the given responses in order, one per connection, and records
/// every request.
#[derive(Debug)]
pub struct MockServer {
    pub base_url: String,
    requests: mpsc::UnboundedReceiver<CapturedRequest>,
}

impl MockServer {
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock server");
        let port = listener
            .local_addr()
            .expect("mock server has no local address")
            .port();
        let base_url = format!("http://127.0.0.1:{port}");
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let Some(request) = read_request(&mut stream).await else {
                    return;
                };
                write_response(&mut stream, status, &body).await;
                let _ = tx.send(request);
            }
        });

        Self {
            base_url,
            requests: rx,
        }
    }

    /// Next captured request, in arrival order.
    pub async fn next_request(&mut self) -> CapturedRequest {
        self.requests
            .recv()
            .await
            .expect("mock server stopped before a request arrived")
    }
}

/// Read one HTTP/1.1 request with a `Content-Length` body. Returns `None` if
/// the peer closes before the header block ends.
pub async fn read_request(stream: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let (head, content_length) = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..pos]).to_string();
            buf.drain(..pos + 4);
            let content_length = CapturedRequest {
                head: head.clone(),
                body: String::new(),
            }
            .header("content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
            break (head, content_length);
        }
    };

    while buf.len() < content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(CapturedRequest {
        head,
        body: String::from_utf8_lossy(&buf).to_string(),
    })
}

async fn write_response(stream: &mut TcpStream, status: u16, body: &str) {
    let response = format!(
        "HTTP/1.1 {status} Mock\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    );
    stream
        .write_all(response.as_bytes())
        .await
        .expect("failed to write mock response");
    let _ = stream.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_body_split_across_writes() {
        let mut server = MockServer::start(vec![(202, "{}".into())]).await;
        let addr = server.base_url.trim_start_matches("http://").to_owned();

        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"POST /v3/mail/send HTTP/1.1\r\nHost: x\r\nContent-Length: 11\r\n\r\nhello")
            .await
            .unwrap();
        tokio::task::yield_now().await;
        client.write_all(b" world").await.unwrap();

        let mut reply = String::new();
        client.read_to_string(&mut reply).await.unwrap();
        assert!(reply.starts_with("HTTP/1.1 202 Mock"));

        let request = server.next_request().await;
        assert_eq!(request.request_line(), "POST /v3/mail/send HTTP/1.1");
        assert_eq!(request.header("HOST"), Some("x"));
        assert_eq!(request.body, "hello world");
    }
}
