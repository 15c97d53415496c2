//! Paginated letter layout: splits a measured letter body into fixed-size
//! pages and hands the result to the host print facility.

pub mod content;
pub mod controller;
pub mod cursor;
pub mod display;
pub mod geometry;
pub mod job;
pub mod layout;
pub mod platform;
pub mod template;

pub use content::{
    measure_all, ContentError, ContentNode, LetterBody, MeasuredNode, NodeKind, NodeMeasurer,
    TextMetrics,
};
pub use controller::{
    layout_letter, run_print_job, PrintJobError, PrintJobResult, PrintOutcome, PrintTrigger,
};
pub use cursor::{ContentCursor, Placement};
pub use display::{DisplayCommand, NodeBlock, PrintDisplayList, Region, TextRun};
pub use geometry::{ConfigurationError, MediaProfile, PageMetrics, PagePrototype, PageTemplate};
pub use job::{PrintJobControllerState, PrintJobId, PrintJobOptions, PrintTarget};
pub use layout::{
    CancelToken, CancellationFlag, Diagnostic, Document, GreedyPaginator, LayoutSummary,
    NeverCancel, Page, PageSummary, PaginationError, Paginator,
};
pub use platform::{
    render_job_text, render_page_text, spool_banner, CommandPrintAdapter, PlatformAdapter,
    PlatformError, PlatformJobHandle, SpoolPage, TextSpoolAdapter,
};
pub use template::{
    Alignment, HeaderFooterTemplate, LetterContext, PageChrome, RenderedHeaderFooter,
    TemplateError, TemplateSegment, TemplateToken,
};
