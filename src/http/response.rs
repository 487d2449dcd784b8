use tokio::{
    fs::File,
    io::{self, AsyncReadExt, AsyncWrite, AsyncWriteExt},
};

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        301 => "Moved Permanently",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        _ => "Unknown",
    }
}

/// Either a small in-memory payload or a file streamed from disk.
#[derive(Debug)]
pub enum Body {
    Bytes(Vec<u8>),
    File { file: File, len: u64 },
}

impl Body {
    pub fn len(&self) -> u64 {
        match self {
            Body::Bytes(bytes) => bytes.len() as u64,
            Body::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl Response {
    pub fn new(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        Self::with_body(status, content_type, Body::Bytes(body))
    }

    /// A file response; `len` comes from the file's metadata and becomes
    /// `Content-Length`.
    pub fn file(content_type: &str, file: File, len: u64) -> Self {
        Self::with_body(200, content_type, Body::File { file, len })
    }

    fn with_body(status: u16, content_type: &str, body: Body) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body,
        }
    }

    /// Small HTML page describing an error status.
    pub fn error(status: u16) -> Self {
        let reason = reason_phrase(status);
        let body = format!(
            "<!DOCTYPE html>\n<html><head><title>{status} {reason}</title></head>\
             <body><h1>{status} {reason}</h1></body></html>\n"
        );
        Self::new(status, "text/html; charset=utf-8", body.into_bytes())
    }

    pub fn redirect(location: &str) -> Self {
        let mut response = Self::error(301);
        response
            .headers
            .push(("Location".to_string(), location.to_string()));
        response
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Serialises the response. With `head_only` the body is left out but
    /// `Content-Length` still describes it. File bodies are copied in chunks.
    pub async fn write_to<W: AsyncWrite + Unpin>(self, stream: &mut W, head_only: bool) -> io::Result<()> {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status, reason_phrase(self.status));
        for (key, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", key, value));
        }
        head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        head.push_str("Connection: close\r\n\r\n");

        stream.write_all(head.as_bytes()).await?;
        if !head_only {
            match self.body {
                Body::Bytes(bytes) => stream.write_all(&bytes).await?,
                Body::File { file, len } => {
                    // Never send more than Content-Length promised, even if
                    // the file grew since it was opened.
                    let copied = io::copy(&mut file.take(len), stream).await?;
                    if copied < len {
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "file shrank while being served",
                        ));
                    }
                }
            }
        }
        stream.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn writes_status_headers_and_body() {
        let response = Response::new(200, "text/plain", b"hello".to_vec());
        let mut out = Vec::new();
        response.write_to(&mut out, false).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("\r\n\r\nhello"));
    }

    #[tokio::test]
    async fn head_only_skips_body() {
        let response = Response::new(200, "text/plain", b"hello".to_vec());
        let mut out = Vec::new();
        response.write_to(&mut out, true).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn file_body_is_streamed_in_full() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("trailer.mp4");
        let bytes: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &bytes).unwrap();

        let file = File::open(&path).await.unwrap();
        let len = file.metadata().await.unwrap().len();
        let mut out = Vec::new();
        Response::file("video/mp4", file, len)
            .write_to(&mut out, false)
            .await
            .unwrap();

        let head_end = out.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
        let head = String::from_utf8_lossy(&out[..head_end]);
        assert!(head.contains("Content-Length: 300000\r\n"));
        assert_eq!(&out[head_end..], &bytes[..]);
    }

    #[test]
    fn redirect_carries_location() {
        let response = Response::redirect("/js/");
        assert_eq!(response.status, 301);
        assert_eq!(response.header("location"), Some("/js/"));
    }
}
