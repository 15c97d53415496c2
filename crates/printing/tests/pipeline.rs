use std::fs;
use std::sync::{Arc, Mutex};

use letterpage_printing::{
    run_print_job, ContentNode, DisplayCommand, GreedyPaginator, HeaderFooterTemplate,
    LetterBody, LetterContext, MediaProfile, NeverCancel, NodeKind, PageChrome, PagePrototype,
    PageTemplate, PlatformAdapter, PlatformJobHandle, PrintJobControllerState, PrintJobOptions,
    PrintOutcome, Region, SpoolPage, TextMetrics, TextSpoolAdapter,
};
use tempfile::tempdir;

#[derive(Clone, Default)]
struct RecordingAdapter {
    jobs: Arc<Mutex<Vec<RecordedJob>>>,
}

#[derive(Clone)]
struct RecordedJob {
    title: String,
    pages: Vec<SpoolPage>,
    finished: bool,
}

struct RecordingHandle {
    title: String,
    pages: Vec<SpoolPage>,
    sink: Arc<Mutex<Vec<RecordedJob>>>,
}

impl PlatformAdapter for RecordingAdapter {
    type Error = String;
    type JobHandle = RecordingHandle;

    fn begin_job(&self, options: &PrintJobOptions) -> Result<Self::JobHandle, Self::Error> {
        Ok(RecordingHandle {
            title: options.title.clone(),
            pages: Vec::new(),
            sink: self.jobs.clone(),
        })
    }
}

impl PlatformJobHandle for RecordingHandle {
    type Error = String;

    fn submit_page(&mut self, page: SpoolPage) -> Result<(), Self::Error> {
        self.pages.push(page);
        Ok(())
    }

    fn finish(self) -> Result<(), Self::Error> {
        let mut guard = self.sink.lock().unwrap();
        guard.push(RecordedJob {
            title: self.title,
            pages: self.pages,
            finished: true,
        });
        Ok(())
    }

    fn abort(self, _reason: &str) {
        let mut guard = self.sink.lock().unwrap();
        guard.push(RecordedJob {
            title: self.title,
            pages: Vec::new(),
            finished: false,
        });
    }
}

fn make_template(media: MediaProfile) -> PageTemplate {
    let header = HeaderFooterTemplate::parse("&l&s&rOrder &o").unwrap();
    let footer = HeaderFooterTemplate::parse("&cThank you for shopping with &s").unwrap();
    let context = LetterContext {
        store_name: Some("Corner Shop"),
        order_reference: Some("A-1001"),
        ..Default::default()
    };
    PageTemplate::new(
        PagePrototype::a4(media),
        PageChrome::render(&header, &footer, &context),
    )
}

fn sample_letter() -> Vec<ContentNode> {
    let mut nodes = vec![
        ContentNode::new("address", NodeKind::Address, "Jane Doe\n1 Main Street\n0150 Oslo"),
        ContentNode::new("title", NodeKind::Heading, "Packing slip"),
    ];
    for idx in 0..40 {
        nodes.push(ContentNode::new(
            format!("row-{idx}"),
            NodeKind::TableRows,
            format!("Item {idx}: widget, qty 1"),
        ));
    }
    nodes.push(ContentNode::sized("signature", 30.0));
    nodes
}

#[test]
fn pipeline_spools_header_main_and_footer_on_every_page() {
    let adapter = RecordingAdapter::default();
    let job_options = PrintJobOptions::new("Packing slip A-1001", MediaProfile::Screen);

    let result = run_print_job(
        &GreedyPaginator,
        sample_letter(),
        &TextMetrics::default(),
        &make_template(MediaProfile::Screen),
        &job_options,
        &adapter,
        &NeverCancel,
    )
    .expect("print job");

    assert_eq!(result.state, PrintJobControllerState::Completed);
    assert!(result.summary.total_pages >= 2, "expected the letter to overflow");
    assert_eq!(result.summary.total_nodes, 43);

    let jobs = adapter.jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert!(jobs[0].finished);
    assert_eq!(jobs[0].title, "Packing slip A-1001");
    assert_eq!(jobs[0].pages.len(), result.summary.total_pages);

    for page in &jobs[0].pages {
        let header: Vec<_> = page
            .display_list
            .text_in(Region::Header)
            .map(|run| run.text.clone())
            .collect();
        assert_eq!(header, vec!["Corner Shop", "Order A-1001"]);

        let footer: Vec<_> = page
            .display_list
            .text_in(Region::Footer)
            .map(|run| run.text.clone())
            .collect();
        assert_eq!(footer, vec!["Thank you for shopping with Corner Shop"]);

        let blocks = page
            .display_list
            .commands
            .iter()
            .filter(|command| matches!(command, DisplayCommand::Block(_)))
            .count();
        assert!(blocks > 0);
    }
}

#[test]
fn print_media_fits_more_per_page_than_screen() {
    let screen = run_print_job(
        &GreedyPaginator,
        (0..60).map(|idx| ContentNode::sized(format!("n{idx}"), 10.0)).collect(),
        &TextMetrics::default(),
        &make_template(MediaProfile::Screen),
        &PrintJobOptions::new("screen", MediaProfile::Screen),
        &RecordingAdapter::default(),
        &NeverCancel,
    )
    .unwrap();
    let print = run_print_job(
        &GreedyPaginator,
        (0..60).map(|idx| ContentNode::sized(format!("n{idx}"), 10.0)).collect(),
        &TextMetrics::default(),
        &make_template(MediaProfile::Print),
        &PrintJobOptions::new("print", MediaProfile::Print).with_zoom(125),
        &RecordingAdapter::default(),
        &NeverCancel,
    )
    .unwrap();

    assert_eq!(screen.summary.main_height_mm, 257.0);
    assert_eq!(print.summary.main_height_mm, 262.0);
    assert_eq!(screen.summary.pages[0].node_ids.len(), 25);
    assert_eq!(print.summary.pages[0].node_ids.len(), 26);
}

#[test]
fn text_spool_writes_form_feed_separated_pages() {
    let temp = tempdir().expect("tempdir");
    let spool_path = temp.path().join("spool").join("letter.txt");
    let adapter = TextSpoolAdapter::new(&spool_path).with_columns(60);

    let result = run_print_job(
        &GreedyPaginator,
        (0..6).map(|idx| ContentNode::sized(format!("n{idx}"), 100.0)).collect(),
        &TextMetrics::default(),
        &make_template(MediaProfile::Screen),
        &PrintJobOptions::new("spooled", MediaProfile::Screen),
        &adapter,
        &NeverCancel,
    )
    .expect("spool job");

    assert_eq!(result.outcome, PrintOutcome::Spooled { pages: 3 });
    let spooled = fs::read_to_string(&spool_path).expect("spool file");
    assert_eq!(
        spooled.lines().next(),
        Some("%letterpage media=screen zoom=100% copies=1")
    );
    assert_eq!(spooled.split('\u{000C}').count(), 3);
    assert_eq!(spooled.matches("Corner Shop").count(), 6);
    assert!(!spool_path.with_extension("tmp").exists());
}

#[test]
fn empty_letter_body_prints_nothing() {
    let temp = tempdir().expect("tempdir");
    let spool_path = temp.path().join("letter.txt");
    let adapter = TextSpoolAdapter::new(&spool_path);
    let body = LetterBody::from_json(r#"{ "nodes": [] }"#).unwrap();

    let result = run_print_job(
        &GreedyPaginator,
        body.nodes,
        &TextMetrics::default(),
        &make_template(MediaProfile::Print),
        &PrintJobOptions::new("empty", MediaProfile::Print),
        &adapter,
        &NeverCancel,
    )
    .unwrap();

    assert_eq!(result.outcome, PrintOutcome::Skipped);
    assert_eq!(result.summary.total_pages, 0);
    assert!(!spool_path.exists());
}

#[test]
fn spool_file_records_print_zoom() {
    let temp = tempdir().expect("tempdir");
    let mut first_lines = Vec::new();

    for zoom in [100, 125] {
        let spool_path = temp.path().join(format!("zoom-{zoom}.txt"));
        run_print_job(
            &GreedyPaginator,
            vec![ContentNode::sized("n0", 50.0)],
            &TextMetrics::default(),
            &make_template(MediaProfile::Print),
            &PrintJobOptions::new("zoomed", MediaProfile::Print).with_zoom(zoom),
            &TextSpoolAdapter::new(&spool_path),
            &NeverCancel,
        )
        .expect("spool job");
        let spooled = fs::read_to_string(&spool_path).expect("spool file");
        first_lines.push(spooled.lines().next().unwrap_or_default().to_string());
    }

    assert_ne!(first_lines[0], first_lines[1]);
    assert_eq!(first_lines[1], "%letterpage media=print zoom=125% copies=1");
}
