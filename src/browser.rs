use std::io;

use tracing::{info, warn};

use crate::error::LaunchError;

/// Something that can show a URL to the user.
pub trait BrowserOpener {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// The host's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        open::that_detached(url)
    }
}

impl<F> BrowserOpener for F
where
    F: Fn(&str) -> io::Result<()>,
{
    fn open(&self, url: &str) -> io::Result<()> {
        self(url)
    }
}

/// Opens `url` on a best-effort basis. Failures are logged and swallowed.
pub fn open_entry_point(opener: &impl BrowserOpener, url: &str) {
    info!(%url, "opening catalog");
    if let Err(source) = opener.open(url) {
        let err = LaunchError::BrowserLaunch {
            url: url.to_string(),
            source,
        };
        warn!(error = %err, "could not open browser");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn passes_url_through() {
        let seen = RefCell::new(Vec::new());
        let opener = |url: &str| -> io::Result<()> {
            seen.borrow_mut().push(url.to_string());
            Ok(())
        };
        open_entry_point(&opener, "http://localhost:8000/catalog.html");
        assert_eq!(*seen.borrow(), vec!["http://localhost:8000/catalog.html"]);
    }

    #[test]
    fn failure_is_swallowed() {
        let opener = |_: &str| -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no display"))
        };
        // Returns normally.
        open_entry_point(&opener, "http://localhost:8000/catalog.html");
    }
}
