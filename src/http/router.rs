use std::path::{Path, PathBuf};

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tokio::fs;

use super::request::Request;

const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Characters escaped in listing links.
const LINK: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    File(PathBuf),
    Listing { dir: PathBuf, url_path: String },
    Redirect(String),
    NotFound,
}

/// Maps a decoded URL path onto `root`.
///
/// Empty, `.` and `..` segments are dropped, as are segments that would be
/// read as separators or drive prefixes on the host, so the result always
/// stays inside `root`.
pub fn translate_path(root: &Path, url_path: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in url_path.split('/') {
        if segment.is_empty()
            || segment == "."
            || segment == ".."
            || segment.contains('\\')
            || segment.contains(':')
            || segment.contains('\0')
        {
            continue;
        }
        path.push(segment);
    }
    path
}

/// Decides what a request under `root` should be answered with.
pub async fn resolve(root: &Path, req: &Request) -> Target {
    let path = translate_path(root, &req.path);
    let Ok(meta) = fs::metadata(&path).await else {
        return Target::NotFound;
    };

    if !meta.is_dir() {
        return Target::File(path);
    }

    if !req.raw_path.ends_with('/') {
        // A leading "//" would make the location protocol-relative.
        let mut location = format!("/{}/", req.raw_path.trim_start_matches('/'));
        if let Some(query) = &req.query {
            location.push('?');
            location.push_str(query);
        }
        return Target::Redirect(location);
    }

    for index in INDEX_FILES {
        let candidate = path.join(index);
        if fs::metadata(&candidate).await.map(|m| m.is_file()).unwrap_or(false) {
            return Target::File(candidate);
        }
    }

    Target::Listing {
        dir: path,
        url_path: req.path.clone(),
    }
}

/// Renders a sorted HTML index of `dir`; directories get a trailing slash.
pub async fn render_listing(dir: &Path, url_path: &str) -> std::io::Result<String> {
    let mut names = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            name.push('/');
        }
        names.push(name);
    }
    names.sort_by_key(|name| name.to_lowercase());

    let title = format!("Directory listing for {}", escape_html(url_path));
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n\
         <body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for name in &names {
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            utf8_percent_encode(name, LINK),
            escape_html(name)
        ));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(html)
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
