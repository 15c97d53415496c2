use thiserror::Error;

use crate::content::{measure_all, ContentError, ContentNode, NodeMeasurer};
use crate::geometry::{ConfigurationError, PageTemplate};
use crate::job::{PrintJobControllerState, PrintJobOptions};
use crate::layout::{CancelToken, Diagnostic, Document, LayoutSummary, PaginationError, Paginator};
use crate::platform::{PlatformAdapter, PlatformJobHandle, SpoolPage};

/// What happened when a document reached the print trigger.
/// 文件送達列印觸發器後的結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintOutcome {
    /// The document had no pages; the host was never contacted.
    Skipped,
    Spooled { pages: usize },
}

/// Result produced after executing a print job.
/// 列印作業完成後所產生的結果。
#[derive(Debug, Clone)]
pub struct PrintJobResult {
    pub summary: LayoutSummary,
    pub diagnostics: Vec<Diagnostic>,
    pub outcome: PrintOutcome,
    pub state: PrintJobControllerState,
}

/// Errors raised while running the print pipeline.
/// 列印管線執行時可能發生的錯誤。
#[derive(Debug, Error)]
pub enum PrintJobError {
    #[error("invalid page geometry: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Pagination(PaginationError),
    #[error("platform adapter failed: {0}")]
    Platform(String),
}

impl From<PaginationError> for PrintJobError {
    fn from(err: PaginationError) -> Self {
        match err {
            PaginationError::Configuration(inner) => PrintJobError::Configuration(inner),
            other => PrintJobError::Pagination(other),
        }
    }
}

impl PrintJobError {
    /// Controller state a failed run ends in.
    pub fn state(&self) -> PrintJobControllerState {
        match self {
            PrintJobError::Pagination(PaginationError::Cancelled { .. }) => {
                PrintJobControllerState::Cancelled
            }
            _ => PrintJobControllerState::Failed,
        }
    }
}

/// Hands a finished document to the host print facility, exactly once.
/// 將完成的文件交給主機列印功能（僅執行一次）。
pub struct PrintTrigger<'a, A> {
    adapter: &'a A,
}

impl<'a, A> PrintTrigger<'a, A>
where
    A: PlatformAdapter,
    A::Error: std::fmt::Display,
{
    pub fn new(adapter: &'a A) -> Self {
        Self { adapter }
    }

    pub fn trigger(
        &self,
        document: &Document,
        job_options: &PrintJobOptions,
    ) -> Result<PrintOutcome, PrintJobError> {
        if document.is_empty() {
            log::info!("{}: letter is empty, nothing to print", job_options.job_id);
            return Ok(PrintOutcome::Skipped);
        }

        let mut handle = self
            .adapter
            .begin_job(job_options)
            .map_err(|err| PrintJobError::Platform(err.to_string()))?;

        for page in document.pages() {
            let spool_page = SpoolPage {
                job_id: job_options.job_id,
                page_number: page.page_number(),
                display_list: page.display_list(document.metrics()),
            };
            if let Err(err) = handle.submit_page(spool_page) {
                let reason = err.to_string();
                log::error!(
                    "{}: page {} rejected: {reason}",
                    job_options.job_id,
                    page.page_number()
                );
                handle.abort(&reason);
                return Err(PrintJobError::Platform(reason));
            }
        }

        handle
            .finish()
            .map_err(|err| PrintJobError::Platform(err.to_string()))?;
        log::info!(
            "{}: spooled {} page(s) for '{}'",
            job_options.job_id,
            document.len(),
            job_options.title
        );
        Ok(PrintOutcome::Spooled {
            pages: document.len(),
        })
    }
}

/// Measurement phase followed by packing: turns raw letter content into a document.
/// 先量測再排版：將原始信件內容轉換為文件。
pub fn layout_letter<P>(
    paginator: &P,
    content: Vec<ContentNode>,
    measurer: &dyn NodeMeasurer,
    template: &PageTemplate,
    cancel: &dyn CancelToken,
) -> Result<Document, PrintJobError>
where
    P: Paginator + ?Sized,
{
    let metrics = template.measure()?;
    let measured = measure_all(content, measurer, metrics.page_width_mm)?;
    log::debug!(
        "measured {} node(s) against a {:.1}mm main region",
        measured.len(),
        metrics.main_height_mm
    );
    Ok(paginator.paginate(measured, template, cancel)?)
}

/// Executes the pipeline end-to-end: measure, paginate, then trigger printing.
/// 端到端執行管線：量測、分頁，最後觸發列印。
pub fn run_print_job<P, A>(
    paginator: &P,
    content: Vec<ContentNode>,
    measurer: &dyn NodeMeasurer,
    template: &PageTemplate,
    job_options: &PrintJobOptions,
    adapter: &A,
    cancel: &dyn CancelToken,
) -> Result<PrintJobResult, PrintJobError>
where
    P: Paginator + ?Sized,
    A: PlatformAdapter,
    A::Error: std::fmt::Display,
{
    let document = layout_letter(paginator, content, measurer, template, cancel)?;
    let outcome = PrintTrigger::new(adapter).trigger(&document, job_options)?;
    let state = match outcome {
        PrintOutcome::Skipped => PrintJobControllerState::Skipped,
        PrintOutcome::Spooled { .. } => PrintJobControllerState::Completed,
    };

    Ok(PrintJobResult {
        summary: document.summary(),
        diagnostics: document.diagnostics().to_vec(),
        outcome,
        state,
    })
}
