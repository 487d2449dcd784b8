use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use tokio::io::{self, AsyncRead, AsyncReadExt};
use tracing::debug;

/// Requests larger than this before the blank line are rejected.
pub const MAX_HEAD_LEN: usize = 16 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// Path exactly as sent, without query or fragment.
    pub raw_path: String,
    /// Percent-decoded path.
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
}

/// Reads up to and including the blank line that ends the request head.
///
/// Bodies are never needed for static files, so anything after it is ignored.
pub async fn read_request_head<S: AsyncRead + Unpin>(stream: &mut S) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut buf = [0u8; 1024];

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
        if data.windows(4).any(|window| window == b"\r\n\r\n") {
            break;
        }
        if data.len() > MAX_HEAD_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "request head too large",
            ));
        }
    }
    Ok(data)
}

/// Parses the request line and headers. `None` means the request is malformed.
pub fn parse_request(buffer: &[u8]) -> Option<Request> {
    let request_str = String::from_utf8_lossy(buffer);
    let header_end = request_str.find("\r\n\r\n").unwrap_or(request_str.len());
    let mut lines = request_str[..header_end].lines();

    // e.g. "GET /catalog.html?x=1 HTTP/1.1"
    let mut parts = lines.next()?.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?;
    if !target.starts_with('/') {
        return None;
    }

    let target = target.split('#').next().unwrap_or(target);
    let (raw_path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (target.to_string(), None),
    };
    let path = percent_decode_str(&raw_path).decode_utf8_lossy().into_owned();

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    debug!(%method, %path, "parsed request");
    Some(Request {
        method,
        raw_path,
        path,
        query,
        headers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_line_and_query() {
        let req = parse_request(b"GET /js/catalog.js?v=2 HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.raw_path, "/js/catalog.js");
        assert_eq!(req.path, "/js/catalog.js");
        assert_eq!(req.query.as_deref(), Some("v=2"));
        assert_eq!(req.headers.get("host").map(String::as_str), Some("localhost"));
    }

    #[test]
    fn decodes_percent_escapes() {
        let req = parse_request(b"GET /%D0%BA%D0%B8%D0%BD%D0%BE/my%20file.html HTTP/1.1\r\n\r\n")
            .unwrap();
        assert_eq!(req.path, "/кино/my file.html");
        assert_eq!(req.raw_path, "/%D0%BA%D0%B8%D0%BD%D0%BE/my%20file.html");
    }

    #[test]
    fn drops_fragment() {
        let req = parse_request(b"GET /about.html#team HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.path, "/about.html");
        assert_eq!(req.query, None);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_request(b"").is_none());
        assert!(parse_request(b"GET\r\n\r\n").is_none());
        assert!(parse_request(b"GET catalog.html HTTP/1.1\r\n\r\n").is_none());
    }

    #[tokio::test]
    async fn reads_until_blank_line() {
        let mut input: &[u8] = b"GET / HTTP/1.1\r\nHost: x\r\n\r\nignored body";
        let head = read_request_head(&mut input).await.unwrap();
        assert!(head.starts_with(b"GET / HTTP/1.1"));
        assert!(head.windows(4).any(|w| w == b"\r\n\r\n"));
    }
}
