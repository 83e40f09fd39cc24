//! Loopback HTTP/1.1 peer that demands digest authentication.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub(crate) const CHALLENGE: &str =
    r#"Digest realm="Web-Line", nonce="5f1c2a9b", qop="auth", algorithm=MD5"#;

#[derive(Debug, Clone)]
pub(crate) struct Request {
    pub path: String,
    pub authorization: Option<String>,
}

pub(crate) struct FakePeer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl FakePeer {
    /// Answer unauthenticated requests with a challenge and the others with
    /// `handler`.
    pub(crate) async fn start<F>(handler: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handler = Arc::new(handler);
        let log = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = Arc::clone(&handler);
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let _ = serve(stream, handler.as_ref(), &log).await;
                });
            }
        });

        Self { addr, requests }
    }

    pub(crate) fn port(&self) -> u16 {
        self.addr.port()
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Paths of the requests that carried credentials.
    pub(crate) fn authorized_paths(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|request| request.authorization.is_some())
            .map(|request| request.path)
            .collect()
    }
}

async fn serve<F>(
    mut stream: TcpStream,
    handler: &F,
    log: &Mutex<Vec<Request>>,
) -> std::io::Result<()>
where
    F: Fn(&str) -> String,
{
    let request = read_request(&mut stream).await?;
    let response = match &request.authorization {
        Some(value) if value.starts_with("Digest ") && value.contains(r#"username="admin""#) => {
            let body = handler(&request.path);
            format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
        }
        _ => format!(
            "HTTP/1.1 401 Unauthorized\r\nWWW-Authenticate: {CHALLENGE}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
        ),
    };
    log.lock().unwrap().push(request);
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

async fn read_request(stream: &mut TcpStream) -> std::io::Result<Request> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.split("\r\n");
    let path = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or_default()
        .to_string();
    let authorization = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("authorization"))
        .map(|(_, value)| value.trim().to_string());

    Ok(Request {
        path,
        authorization,
    })
}
