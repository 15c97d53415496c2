use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
#[cfg(test)]
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::display::{PrintDisplayList, Region, TextRun};
use crate::job::{PrintJobId, PrintJobOptions};
use crate::template::Alignment;

/// Column width used when rendering pages as plain text.
pub const DEFAULT_COLUMNS: usize = 80;

const FORM_FEED: char = '\u{000C}';

/// A materialized page queued for the host print facility.
/// 準備送往主機列印功能的頁面。
#[derive(Debug, Clone)]
pub struct SpoolPage {
    pub job_id: PrintJobId,
    pub page_number: usize,
    pub display_list: PrintDisplayList,
}

/// Handle returned when a platform adapter begins a job.
/// 平台列印介面開始作業時回傳的控制物件。
pub trait PlatformJobHandle {
    type Error;

    fn submit_page(&mut self, page: SpoolPage) -> Result<(), Self::Error>;
    fn finish(self) -> Result<(), Self::Error>;
    fn abort(self, reason: &str);
}

/// Abstraction over the host's native print facility.
/// 主機原生列印功能的抽象介面。
pub trait PlatformAdapter: Send + Sync {
    type Error;
    type JobHandle: PlatformJobHandle<Error = Self::Error>;

    fn begin_job(&self, options: &PrintJobOptions) -> Result<Self::JobHandle, Self::Error>;
}

/// Failures reported by the bundled adapters.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("failed to write spool file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to run print command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("print command '{program}' exited with {status}")]
    CommandFailed { program: String, status: ExitStatus },
}

/// Renders one page as plain text: header line, rule, blocks, rule, footer line.
pub fn render_page_text(page: &SpoolPage, columns: usize) -> String {
    let columns = columns.max(1);
    let rule = "-".repeat(columns);
    let mut lines = Vec::new();

    let header = compose_line(page.display_list.text_in(Region::Header), columns);
    if !header.is_empty() {
        lines.push(header);
    }
    lines.push(rule.clone());

    for block in page.display_list.blocks() {
        if block.text.is_empty() {
            lines.push(String::new());
        } else {
            lines.extend(block.text.lines().map(str::to_string));
        }
    }

    lines.push(rule);
    let footer = compose_line(page.display_list.text_in(Region::Footer), columns);
    if !footer.is_empty() {
        lines.push(footer);
    }

    let mut output = lines.join("\n");
    output.push('\n');
    output
}

/// Renders every page, separating pages with form feeds and repeating the
/// whole run once per copy.
pub fn render_job_text(pages: &[SpoolPage], columns: usize, copies: u32) -> String {
    let single = pages
        .iter()
        .map(|page| render_page_text(page, columns))
        .collect::<Vec<_>>()
        .join(&FORM_FEED.to_string());
    vec![single; copies.max(1) as usize].join(&FORM_FEED.to_string())
}

fn compose_line<'a>(runs: impl Iterator<Item = &'a TextRun>, columns: usize) -> String {
    let mut line = String::new();
    for run in runs {
        let len = run.text.chars().count();
        let start = match run.alignment {
            Alignment::Left => 0,
            Alignment::Center => columns.saturating_sub(len) / 2,
            Alignment::Right => columns.saturating_sub(len),
        };
        let current = line.chars().count();
        if current < start {
            line.extend(std::iter::repeat(' ').take(start - current));
        } else if current > 0 {
            line.push(' ');
        }
        line.push_str(&run.text);
    }
    line
}

/// First line of a spool file, recording how the host should render the job.
pub fn spool_banner(options: &PrintJobOptions) -> String {
    format!(
        "%letterpage media={} zoom={}% copies={}",
        options.media.as_str(),
        options.zoom_percent,
        options.copies
    )
}

/// Writes each job as form-feed separated plain text into a spool file,
/// preceded by a [`spool_banner`] line.
#[derive(Debug, Clone)]
pub struct TextSpoolAdapter {
    path: PathBuf,
    columns: usize,
}

impl TextSpoolAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            columns: DEFAULT_COLUMNS,
        }
    }

    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub struct TextSpoolJob {
    path: PathBuf,
    banner: String,
    columns: usize,
    copies: u32,
    pages: Vec<SpoolPage>,
}

impl PlatformAdapter for TextSpoolAdapter {
    type Error = PlatformError;
    type JobHandle = TextSpoolJob;

    fn begin_job(&self, options: &PrintJobOptions) -> Result<Self::JobHandle, Self::Error> {
        log::debug!("spooling {} to {}", options.job_id, self.path.display());
        Ok(TextSpoolJob {
            path: self.path.clone(),
            banner: spool_banner(options),
            columns: self.columns,
            copies: options.copies,
            pages: Vec::new(),
        })
    }
}

impl PlatformJobHandle for TextSpoolJob {
    type Error = PlatformError;

    fn submit_page(&mut self, page: SpoolPage) -> Result<(), Self::Error> {
        self.pages.push(page);
        Ok(())
    }

    fn finish(self) -> Result<(), Self::Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| PlatformError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = format!(
            "{}\n{}",
            self.banner,
            render_job_text(&self.pages, self.columns, self.copies)
        );
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload.as_bytes()).map_err(|source| PlatformError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| PlatformError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn abort(self, reason: &str) {
        log::warn!(
            "spool job for {} aborted after {} page(s): {reason}",
            self.path.display(),
            self.pages.len()
        );
    }
}

/// Pipes the plain-text rendition of a job into a host print command (`lp` by default).
#[derive(Debug, Clone)]
pub struct CommandPrintAdapter {
    program: String,
    args: Vec<String>,
    target_flag: Option<String>,
    /// Passes `copies` to the command instead of repeating the text.
    copies_flag: Option<String>,
    /// Option flag and value prefix used to pass the zoom percent.
    zoom_option: Option<(String, String)>,
    columns: usize,
}

impl CommandPrintAdapter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            target_flag: None,
            copies_flag: None,
            zoom_option: None,
            columns: DEFAULT_COLUMNS,
        }
    }

    /// CUPS `lp`: `-d <printer>` when the job names a target, `-n <copies>`
    /// for extra copies and `-o scaling=<zoom>` when the zoom is not 100%.
    pub fn lp() -> Self {
        Self {
            target_flag: Some("-d".to_string()),
            copies_flag: Some("-n".to_string()),
            zoom_option: Some(("-o".to_string(), "scaling=".to_string())),
            ..Self::new("lp", Vec::new())
        }
    }

    fn command_args(&self, options: &PrintJobOptions) -> Vec<String> {
        let mut args = self.args.clone();
        if let (Some(flag), Some(target)) = (&self.target_flag, &options.target) {
            args.push(flag.clone());
            args.push(target.name.clone());
        }
        if let Some(flag) = self.copies_flag.as_ref().filter(|_| options.copies > 1) {
            args.push(flag.clone());
            args.push(options.copies.to_string());
        }
        if let Some((flag, prefix)) = self
            .zoom_option
            .as_ref()
            .filter(|_| options.zoom_percent != 100)
        {
            args.push(flag.clone());
            args.push(format!("{prefix}{}", options.zoom_percent));
        }
        args
    }

    /// Copies still rendered into the text; the command handles the rest.
    fn rendered_copies(&self, options: &PrintJobOptions) -> u32 {
        if self.copies_flag.is_some() {
            1
        } else {
            options.copies
        }
    }
}

impl Default for CommandPrintAdapter {
    fn default() -> Self {
        Self::lp()
    }
}

pub struct CommandPrintJob {
    program: String,
    args: Vec<String>,
    columns: usize,
    copies: u32,
    pages: Vec<SpoolPage>,
}

impl PlatformAdapter for CommandPrintAdapter {
    type Error = PlatformError;
    type JobHandle = CommandPrintJob;

    fn begin_job(&self, options: &PrintJobOptions) -> Result<Self::JobHandle, Self::Error> {
        Ok(CommandPrintJob {
            program: self.program.clone(),
            args: self.command_args(options),
            columns: self.columns,
            copies: self.rendered_copies(options),
            pages: Vec::new(),
        })
    }
}

impl PlatformJobHandle for CommandPrintJob {
    type Error = PlatformError;

    fn submit_page(&mut self, page: SpoolPage) -> Result<(), Self::Error> {
        self.pages.push(page);
        Ok(())
    }

    fn finish(self) -> Result<(), Self::Error> {
        let spawn_error = |source| PlatformError::Spawn {
            program: self.program.clone(),
            source,
        };
        let payload = render_job_text(&self.pages, self.columns, self.copies);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(payload.as_bytes()).map_err(spawn_error)?;
        }
        let status = child.wait().map_err(spawn_error)?;
        if !status.success() {
            return Err(PlatformError::CommandFailed {
                program: self.program.clone(),
                status,
            });
        }
        log::info!("sent {} page(s) to '{}'", self.pages.len(), self.program);
        Ok(())
    }

    fn abort(self, reason: &str) {
        log::warn!("print command '{}' not started: {reason}", self.program);
    }
}

/// Recorded job metadata produced by the mock adapter.
/// 模擬介面所記錄的列印作業中繼資料。
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedJob {
    pub options: PrintJobOptions,
    pub pages: Vec<SpoolPage>,
    pub aborted: bool,
    pub abort_reason: Option<String>,
}

/// In-memory implementation of [`PlatformAdapter`] used for tests.
/// 測試使用的記憶體內部平台介面實作。
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockPlatformAdapter {
    jobs: Arc<Mutex<Vec<RecordedJob>>>,
    fail_on_page: Option<usize>,
}

#[cfg(test)]
impl MockPlatformAdapter {
    pub fn failing_on_page(page_number: usize) -> Self {
        Self {
            fail_on_page: Some(page_number),
            ..Self::default()
        }
    }

    pub fn drain_jobs(&self) -> Vec<RecordedJob> {
        self.jobs.lock().expect("lock poisoned").drain(..).collect()
    }
}

#[cfg(test)]
pub struct MockJobHandle {
    options: PrintJobOptions,
    pages: Vec<SpoolPage>,
    fail_on_page: Option<usize>,
    sink: Arc<Mutex<Vec<RecordedJob>>>,
}

#[cfg(test)]
impl PlatformAdapter for MockPlatformAdapter {
    type Error = String;
    type JobHandle = MockJobHandle;

    fn begin_job(&self, options: &PrintJobOptions) -> Result<Self::JobHandle, Self::Error> {
        Ok(MockJobHandle {
            options: options.clone(),
            pages: Vec::new(),
            fail_on_page: self.fail_on_page,
            sink: self.jobs.clone(),
        })
    }
}

#[cfg(test)]
impl PlatformJobHandle for MockJobHandle {
    type Error = String;

    fn submit_page(&mut self, page: SpoolPage) -> Result<(), Self::Error> {
        if self.fail_on_page == Some(page.page_number) {
            return Err(format!("printer jammed on page {}", page.page_number));
        }
        self.pages.push(page);
        Ok(())
    }

    fn finish(self) -> Result<(), Self::Error> {
        let mut guard = self.sink.lock().expect("lock poisoned");
        guard.push(RecordedJob {
            options: self.options,
            pages: self.pages,
            aborted: false,
            abort_reason: None,
        });
        Ok(())
    }

    fn abort(self, reason: &str) {
        let mut guard = self.sink.lock().expect("lock poisoned");
        guard.push(RecordedJob {
            options: self.options,
            pages: Vec::new(),
            aborted: true,
            abort_reason: Some(reason.to_string()),
        });
    }
}
