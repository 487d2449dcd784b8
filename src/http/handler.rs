use std::path::Path;

use tokio::{
    fs::File,
    io::{self, AsyncRead, AsyncWrite},
};
use tracing::{debug, warn};

use super::{
    request::{parse_request, read_request_head, Request},
    response::Response,
    router::{render_listing, resolve, Target},
};

/// Builds the response for one parsed request against `root`.
pub async fn respond(root: &Path, req: &Request) -> Response {
    if req.method != "GET" && req.method != "HEAD" {
        return Response::error(501);
    }

    match resolve(root, req).await {
        Target::File(path) => match open_file(&path).await {
            Ok((file, len)) => {
                let mime = mime_guess::from_path(&path).first_or_octet_stream();
                Response::file(mime.as_ref(), file, len)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read file");
                Response::error(404)
            }
        },
        Target::Listing { dir, url_path } => match render_listing(&dir, &url_path).await {
            Ok(html) => Response::new(200, "text/html; charset=utf-8", html.into_bytes()),
            Err(err) => {
                warn!(path = %dir.display(), error = %err, "failed to list directory");
                Response::error(404)
            }
        },
        Target::Redirect(location) => Response::redirect(&location),
        Target::NotFound => Response::error(404),
    }
}

async fn open_file(path: &Path) -> io::Result<(File, u64)> {
    let file = File::open(path).await?;
    let len = file.metadata().await?.len();
    Ok((file, len))
}

/// Serves a single connection: one request, one response, then close.
pub async fn handle_client<S>(mut stream: S, root: &Path) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let data = match read_request_head(&mut stream).await {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            debug!(error = %e, "rejecting oversized request head");
            return Response::error(431).write_to(&mut stream, false).await;
        }
        Err(e) => return Err(e),
    };
    if data.is_empty() {
        return Ok(());
    }

    let Some(req) = parse_request(&data) else {
        return Response::error(400).write_to(&mut stream, false).await;
    };

    let response = respond(root, &req).await;
    debug!(method = %req.method, path = %req.path, status = response.status, "request served");
    response.write_to(&mut stream, req.method == "HEAD").await
}
