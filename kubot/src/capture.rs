//! Screen and web page capture through external tools.
//!
//! Robots depend on the [`ScreenCapture`] and [`PageCapture`] traits so tests
//! can swap the platform tools for fakes.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::CaptureError;

const PATH_PLACEHOLDER: &str = "{path}";
const URL_PLACEHOLDER: &str = "{url}";

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// Writes a PNG of the full screen to `path`.
    async fn capture_screen(&self, path: &Path) -> Result<(), CaptureError>;
}

#[async_trait]
pub trait PageCapture: Send + Sync {
    /// Renders `url` and writes a PNG of the viewport to `path`.
    async fn capture_page(&self, url: &str, path: &Path) -> Result<(), CaptureError>;
}

/// An external program invocation; `{path}` and `{url}` in arguments are substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl CaptureCommand {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn render(&self, path: &Path, url: Option<&str>) -> Vec<String> {
        let path = path.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                let arg = arg.replace(PATH_PLACEHOLDER, &path);
                match url {
                    Some(url) => arg.replace(URL_PLACEHOLDER, url),
                    None => arg,
                }
            })
            .collect()
    }
}

/// Tries each command in order until one is installed, then reports its outcome.
async fn run_first_available(
    commands: &[CaptureCommand],
    path: &Path,
    url: Option<&str>,
    timeout: Duration,
) -> Result<(), CaptureError> {
    let mut tried = Vec::with_capacity(commands.len());

    for command in commands {
        let args = command.render(path, url);
        let child = Command::new(&command.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(program = %command.program, "Capture tool not installed");
                tried.push(command.program.clone());
                continue;
            }
            Err(source) => {
                return Err(CaptureError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        tracing::info!(program = %command.program, path = %path.display(), "Capturing");
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| CaptureError::Timeout {
                program: command.program.clone(),
                seconds: timeout.as_secs(),
            })?
            .map_err(|source| CaptureError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(CaptureError::ToolFailed {
                program: command.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !path.exists() {
            return Err(CaptureError::MissingOutput(path.to_path_buf()));
        }
        return Ok(());
    }

    Err(CaptureError::NoToolAvailable(tried.join(", ")))
}

async fn ensure_parent_dir(path: &Path) -> Result<(), CaptureError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| CaptureError::Io {
                path: parent.to_path_buf(),
                source,
            }),
        _ => Ok(()),
    }
}

/// Full-screen capture with the screenshot tools commonly shipped per platform.
#[derive(Debug, Clone)]
pub struct SystemScreenCapture {
    commands: Vec<CaptureCommand>,
    timeout: Duration,
}

impl Default for SystemScreenCapture {
    fn default() -> Self {
        Self::with_commands(platform_screen_commands())
    }
}

impl SystemScreenCapture {
    pub fn with_commands(commands: Vec<CaptureCommand>) -> Self {
        Self {
            commands,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ScreenCapture for SystemScreenCapture {
    async fn capture_screen(&self, path: &Path) -> Result<(), CaptureError> {
        ensure_parent_dir(path).await?;
        run_first_available(&self.commands, path, None, self.timeout).await
    }
}

fn platform_screen_commands() -> Vec<CaptureCommand> {
    if cfg!(target_os = "macos") {
        vec![CaptureCommand::new("screencapture", &["-x", "{path}"])]
    } else if cfg!(target_os = "windows") {
        let script = "Add-Type -AssemblyName System.Windows.Forms,System.Drawing; \
            $b = [System.Windows.Forms.SystemInformation]::VirtualScreen; \
            $bmp = New-Object System.Drawing.Bitmap $b.Width, $b.Height; \
            $g = [System.Drawing.Graphics]::FromImage($bmp); \
            $g.CopyFromScreen($b.Left, $b.Top, 0, 0, $bmp.Size); \
            $bmp.Save('{path}', [System.Drawing.Imaging.ImageFormat]::Png)";
        vec![CaptureCommand::new(
            "powershell",
            &["-NoProfile", "-NonInteractive", "-Command", script],
        )]
    } else {
        vec![
            CaptureCommand::new("gnome-screenshot", &["-f", "{path}"]),
            CaptureCommand::new("import", &["-window", "root", "{path}"]),
            CaptureCommand::new("scrot", &["-o", "{path}"]),
        ]
    }
}

/// Page capture with a headless Chromium-family browser and a fixed viewport.
#[derive(Debug, Clone)]
pub struct HeadlessChromeCapture {
    browsers: Vec<String>,
    window_size: (u32, u32),
    timeout: Duration,
}

impl Default for HeadlessChromeCapture {
    fn default() -> Self {
        Self::with_browsers(&["chromium", "chromium-browser", "google-chrome"])
    }
}

impl HeadlessChromeCapture {
    pub fn with_browsers(browsers: &[&str]) -> Self {
        Self {
            browsers: browsers.iter().map(|b| b.to_string()).collect(),
            window_size: (1920, 1080),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    fn commands(&self) -> Vec<CaptureCommand> {
        let window_size = format!("--window-size={},{}", self.window_size.0, self.window_size.1);
        let args = [
            "--headless",
            "--disable-gpu",
            "--hide-scrollbars",
            window_size.as_str(),
            "--screenshot={path}",
            "{url}",
        ];
        self.browsers
            .iter()
            .map(|browser| CaptureCommand::new(browser.as_str(), &args))
            .collect()
    }
}

#[async_trait]
impl PageCapture for HeadlessChromeCapture {
    async fn capture_page(&self, url: &str, path: &Path) -> Result<(), CaptureError> {
        ensure_parent_dir(path).await?;
        run_first_available(&self.commands(), path, Some(url), self.timeout).await
    }
}

/// Image search results page for `text`.
pub fn image_search_url(text: &str) -> Result<url::Url, url::ParseError> {
    url::Url::parse_with_params(
        "https://www.google.com/search",
        &[("tbm", "isch"), ("q", text)],
    )
}
