use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

/// Opens links in the user's browser on behalf of a plugin.
pub trait BrowserOpener: Send + Sync {
    fn open_in_window(&self, url: &str) -> io::Result<()>;

    fn open_in_tab(&self, url: &str) -> io::Result<()>;
}

/// Opens links through a configured browser executable, or through the
/// desktop's default handler when none is configured.
#[derive(Debug, Clone, Default)]
pub struct SystemBrowser {
    executable: Option<PathBuf>,
}

impl SystemBrowser {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }

    fn spawn(&self, exe: &Path, args: &[&str]) -> io::Result<()> {
        debug!("Spawning browser {:?} with {:?}", exe, args);
        Command::new(exe)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}

fn window_args(url: &str) -> [&str; 2] {
    ["--new-window", url]
}

impl BrowserOpener for SystemBrowser {
    fn open_in_window(&self, url: &str) -> io::Result<()> {
        if let Some(exe) = &self.executable {
            match self.spawn(exe, &window_args(url)) {
                Ok(()) => return Ok(()),
                Err(e) => warn!("Failed to open new browser window via {:?}: {}", exe, e),
            }
        }
        open::that(url)
    }

    fn open_in_tab(&self, url: &str) -> io::Result<()> {
        match &self.executable {
            Some(exe) => self.spawn(exe, &[url]),
            None => open::that(url),
        }
    }
}
