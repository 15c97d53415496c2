use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::content::MeasuredNode;
use crate::cursor::{ContentCursor, Placement};
use crate::display::{
    Color, DisplayCommand, NodeBlock, Point, PrintDisplayList, Region, Size, Stroke, TextRun,
};
use crate::geometry::{ConfigurationError, PageMetrics, PageTemplate};
use crate::template::{Alignment, PageChrome, RenderedHeaderFooter};

const RULE_STROKE: Stroke = Stroke {
    width: 0.2,
    color: Color::new(0.6, 0.6, 0.6, 1.0),
};

/// A single page: shared header/footer plus the nodes placed in its main region.
/// 單一頁面：共用的頁首/頁尾，以及放入主要區域的內容節點。
#[derive(Debug, Clone)]
pub struct Page {
    /// Zero-based position in the document.
    pub index: usize,
    pub chrome: Arc<PageChrome>,
    pub nodes: Vec<MeasuredNode>,
    pub used_height_mm: f32,
}

impl Page {
    pub(crate) fn new(index: usize, chrome: Arc<PageChrome>) -> Self {
        Self {
            index,
            chrome,
            nodes: Vec::new(),
            used_height_mm: 0.0,
        }
    }

    pub fn page_number(&self) -> usize {
        self.index + 1
    }

    fn place(&mut self, placement: Placement) {
        self.nodes = placement.nodes;
        self.used_height_mm = placement.used_height_mm;
    }

    /// Materializes the page as `{header, main, footer}` drawing commands.
    /// 將頁面轉換為「頁首、主要區域、頁尾」的繪圖指令。
    pub fn display_list(&self, metrics: &PageMetrics) -> PrintDisplayList {
        let mut display_list = PrintDisplayList::default();
        let width = metrics.page_width_mm;

        push_chrome_text(
            &mut display_list,
            &self.chrome.header,
            Region::Header,
            metrics.header_height_mm / 2.0,
            width,
        );
        push_rule(&mut display_list, metrics.main_top_mm(), width);

        let mut y = metrics.main_top_mm();
        for node in &self.nodes {
            display_list.push(DisplayCommand::Block(NodeBlock {
                region: Region::Main,
                node_index: node.index,
                node_id: node.node.id.clone(),
                kind: node.node.kind,
                text: node.node.text.clone(),
                origin: Point { x: 0.0, y },
                size: Size {
                    width,
                    height: node.height_mm,
                },
            }));
            y += node.height_mm;
        }

        push_rule(&mut display_list, metrics.footer_top_mm(), width);
        push_chrome_text(
            &mut display_list,
            &self.chrome.footer,
            Region::Footer,
            metrics.footer_top_mm() + metrics.footer_height_mm / 2.0,
            width,
        );

        display_list
    }
}

fn push_chrome_text(
    display_list: &mut PrintDisplayList,
    rendered: &RenderedHeaderFooter,
    region: Region,
    y: f32,
    page_width: f32,
) {
    for (alignment, text) in rendered.slots() {
        let x = match alignment {
            Alignment::Left => 0.0,
            Alignment::Center => page_width / 2.0,
            Alignment::Right => page_width,
        };
        display_list.push(DisplayCommand::Text(TextRun {
            text: text.to_string(),
            region,
            alignment,
            position: Point { x, y },
        }));
    }
}

fn push_rule(display_list: &mut PrintDisplayList, y: f32, page_width: f32) {
    display_list.push(DisplayCommand::HorizontalRule {
        start: Point { x: 0.0, y },
        end: Point { x: page_width, y },
        stroke: RULE_STROKE,
    });
}

/// Non-fatal findings reported during a pagination run.
/// 分頁過程中回報的非致命診斷訊息。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A node taller than the main region was placed alone on its page.
    OversizedNode {
        node_index: usize,
        node_id: String,
        height_mm: f32,
        main_height_mm: f32,
        page_index: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::OversizedNode {
                node_index,
                node_id,
                height_mm,
                main_height_mm,
                page_index,
            } => write!(
                f,
                "node #{node_index} ('{node_id}') is {height_mm:.1}mm tall, exceeding the \
                 {main_height_mm:.1}mm main region; placed alone on page {}",
                page_index + 1
            ),
        }
    }
}

/// Ordered pages produced by one pagination run.
/// 單次分頁執行所產生的有序頁面集合。
#[derive(Debug, Clone)]
pub struct Document {
    pages: Vec<Page>,
    diagnostics: Vec<Diagnostic>,
    metrics: PageMetrics,
}

impl Document {
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn metrics(&self) -> &PageMetrics {
        &self.metrics
    }

    /// Every placed node, page by page, in placement order.
    pub fn placed_nodes(&self) -> impl Iterator<Item = &MeasuredNode> {
        self.pages.iter().flat_map(|page| page.nodes.iter())
    }

    pub fn summary(&self) -> LayoutSummary {
        LayoutSummary {
            total_pages: self.pages.len(),
            total_nodes: self.placed_nodes().count(),
            main_height_mm: self.metrics.main_height_mm,
            pages: self
                .pages
                .iter()
                .map(|page| PageSummary {
                    page_number: page.page_number(),
                    node_ids: page.nodes.iter().map(|node| node.id().to_string()).collect(),
                    used_height_mm: page.used_height_mm,
                })
                .collect(),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

/// Summary produced after pagination.
/// 分頁完成後的摘要資訊。
#[derive(Debug, Clone, Serialize)]
pub struct LayoutSummary {
    pub total_pages: usize,
    pub total_nodes: usize,
    pub main_height_mm: f32,
    pub pages: Vec<PageSummary>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageSummary {
    pub page_number: usize,
    pub node_ids: Vec<String>,
    pub used_height_mm: f32,
}

/// Cancellation hook checked between pages.
/// 每頁之間檢查的取消掛鉤。
pub trait CancelToken {
    fn is_cancelled(&self) -> bool;
}

/// Token that never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelToken for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shareable flag that can be raised from another thread to stop a run.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

impl CancelToken for CancellationFlag {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Errors that stop a pagination run before a document is produced.
/// 導致分頁無法產生文件的錯誤。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaginationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("pagination cancelled after {pages_completed} page(s)")]
    Cancelled { pages_completed: usize },
}

/// Contract implemented by the pagination engine.
/// 分頁引擎需實作的介面契約。
pub trait Paginator {
    fn paginate(
        &self,
        content: Vec<MeasuredNode>,
        template: &PageTemplate,
        cancel: &dyn CancelToken,
    ) -> Result<Document, PaginationError>;
}

/// Greedy first-fit paginator: fills each page in source order until the next
/// node would overflow the main region.
/// 貪婪首次適配分頁器：依來源順序填滿每頁，直到下一個節點會超出主要區域。
#[derive(Debug, Default)]
pub struct GreedyPaginator;

impl Paginator for GreedyPaginator {
    fn paginate(
        &self,
        content: Vec<MeasuredNode>,
        template: &PageTemplate,
        cancel: &dyn CancelToken,
    ) -> Result<Document, PaginationError> {
        let metrics = template.measure()?;
        let mut cursor = ContentCursor::new(content);
        let mut pages: Vec<Page> = Vec::new();
        let mut diagnostics = Vec::new();

        while !cursor.is_empty() {
            if cancel.is_cancelled() {
                log::info!("pagination cancelled after {} page(s)", pages.len());
                return Err(PaginationError::Cancelled {
                    pages_completed: pages.len(),
                });
            }

            let remaining_before = cursor.remaining();
            let mut page = template.instantiate(pages.len());
            let placement = cursor.take_fitting(metrics.main_height_mm);
            debug_assert!(cursor.remaining() < remaining_before);

            if placement.oversized {
                if let Some(node) = placement.nodes.first() {
                    let diagnostic = Diagnostic::OversizedNode {
                        node_index: node.index,
                        node_id: node.id().to_string(),
                        height_mm: node.height_mm,
                        main_height_mm: metrics.main_height_mm,
                        page_index: page.index,
                    };
                    log::warn!("{diagnostic}");
                    diagnostics.push(diagnostic);
                }
            }

            page.place(placement);
            log::debug!(
                "page {} holds {} node(s), {:.1}/{:.1}mm",
                page.page_number(),
                page.nodes.len(),
                page.used_height_mm,
                metrics.main_height_mm
            );
            pages.push(page);
        }

        Ok(Document {
            pages,
            diagnostics,
            metrics,
        })
    }
}
