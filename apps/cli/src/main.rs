use std::convert::Infallible;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use letterpage_printing::{
    layout_letter, run_print_job, CommandPrintAdapter, GreedyPaginator, LetterBody, MediaProfile,
    NeverCancel, PageTemplate, PlatformAdapter, PrintJobOptions, PrintJobResult, PrintOutcome,
    TextSpoolAdapter,
};
use letterpage_settings::{Settings, SettingsStore};
use letterpage_social_login::{LoginFlow, ProviderResponse, TokenExchangeForm, TokenExchanger};
use serde_json::json;

#[derive(Parser)]
#[command(
    name = "letterpage-cli",
    about = "Lay out and print paginated store letters",
    author,
    version
)]
struct Cli {
    /// 指定工作區根目錄；預設為目前目錄。 / Workspace root (defaults to current directory).
    #[arg(long, global = true, value_name = "PATH")]
    workspace: Option<PathBuf>,
    /// 設定檔路徑；預設為 `<workspace>/.letterpage/settings.json`。 / Settings file (defaults to `<workspace>/.letterpage/settings.json`).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// 提高日誌詳細程度（可重複）。 / Increase log verbosity (repeatable).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 顯示頁面幾何資訊。 / Show the page geometry for a medium.
    Metrics(MetricsArgs),
    /// 將信件內容分頁並輸出摘要。 / Paginate a letter and print the layout summary.
    Paginate(LetterArgs),
    /// 分頁後送往列印。 / Paginate a letter and send it to the printer.
    Print(PrintArgs),
    /// 匯入/匯出設定。 / Import or export settings.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// 模擬社群登入流程。 / Walk the social-login handshake with a scripted provider answer.
    Login(LoginArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MediaChoice {
    Screen,
    Print,
}

impl From<MediaChoice> for MediaProfile {
    fn from(choice: MediaChoice) -> Self {
        match choice {
            MediaChoice::Screen => MediaProfile::Screen,
            MediaChoice::Print => MediaProfile::Print,
        }
    }
}

#[derive(Args)]
struct MetricsArgs {
    /// 目標媒體。 / Target medium.
    #[arg(long, value_enum, default_value = "screen")]
    media: MediaChoice,
}

#[derive(Args)]
struct LetterArgs {
    /// 信件內容 JSON（`{"nodes": [...]}`）。 / Letter body JSON (`{"nodes": [...]}`).
    #[arg(value_name = "FILE")]
    content: PathBuf,
    /// 目標媒體。 / Target medium.
    #[arg(long, value_enum, default_value = "screen")]
    media: MediaChoice,
    /// 訂單編號（`&o`）。 / Order reference substituted for `&o`.
    #[arg(long, value_name = "REF")]
    order: Option<String>,
    /// 日期（`&d`）。 / Date substituted for `&d`.
    #[arg(long)]
    date: Option<String>,
    /// 時間（`&t`）。 / Time substituted for `&t`.
    #[arg(long)]
    time: Option<String>,
}

#[derive(Args)]
struct PrintArgs {
    #[command(flatten)]
    letter: LetterArgs,
    /// 寫入純文字列印檔而非呼叫印表機。 / Write a plain-text spool file instead of calling the printer.
    #[arg(long, value_name = "FILE", conflicts_with = "command")]
    spool: Option<PathBuf>,
    /// 列印指令；預設為 `lp`。 / Print command to pipe pages into (defaults to `lp`).
    #[arg(long, value_name = "PROGRAM")]
    command: Option<String>,
    /// 指定印表機。 / Destination printer.
    #[arg(long, value_name = "NAME")]
    printer: Option<String>,
    /// 份數。 / Number of copies.
    #[arg(long, default_value_t = 1)]
    copies: u32,
    /// 列印作業標題。 / Job title shown by the print queue.
    #[arg(long)]
    title: Option<String>,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// 匯出目前設定。 / Export current settings.
    Export(ConfigExportArgs),
    /// 匯入設定 JSON。 / Import settings from JSON.
    Import(ConfigImportArgs),
}

#[derive(Args)]
struct ConfigExportArgs {
    /// 輸出檔案路徑。 / Destination file path.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,
}

#[derive(Args)]
struct ConfigImportArgs {
    /// 輸入檔案路徑。 / Source settings JSON.
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct LoginArgs {
    /// 供應商核准並回傳的存取權杖。 / Access token granted by the provider.
    #[arg(long, value_name = "TOKEN")]
    token: Option<String>,
    /// 使用者拒絕授權。 / The user closes the provider dialog.
    #[arg(long)]
    decline: bool,
    /// 供應商回報錯誤。 / The provider reports an error.
    #[arg(long, value_name = "MESSAGE")]
    fail: Option<String>,
    /// SDK 載入失敗。 / The provider SDK fails to load.
    #[arg(long, value_name = "MESSAGE")]
    sdk_error: Option<String>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli {
        workspace,
        config,
        verbose,
        command,
    } = Cli::parse();
    init_logging(verbose);

    let workspace_root = resolve_workspace(workspace)?;
    let settings_path = match config {
        Some(path) => resolve_input_path(&path)?,
        None => default_settings_path(&workspace_root),
    };
    log::debug!("using settings {}", settings_path.display());

    match command {
        Commands::Metrics(args) => execute_metrics(args, &settings_path),
        Commands::Paginate(args) => execute_paginate(args, &settings_path),
        Commands::Print(args) => execute_print(args, &settings_path),
        Commands::Config(subcommand) => execute_config_command(subcommand, &settings_path),
        Commands::Login(args) => execute_login(args, &settings_path),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_settings(settings_path: &Path) -> Result<Settings> {
    let store = SettingsStore::load(settings_path)
        .with_context(|| format!("failed to load settings from {}", settings_path.display()))?;
    Ok(store.settings().clone())
}

fn execute_metrics(args: MetricsArgs, settings_path: &Path) -> Result<()> {
    let settings = load_settings(settings_path)?;
    let template = PageTemplate::new(
        settings.prototype_for(args.media.into()),
        Default::default(),
    );
    let metrics = template.measure().context("invalid page geometry")?;
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}

fn read_letter(path: &Path) -> Result<LetterBody> {
    let input = resolve_input_path(path)?;
    let contents = fs::read_to_string(&input)
        .with_context(|| format!("failed to read letter {}", input.display()))?;
    LetterBody::from_json(&contents)
        .with_context(|| format!("failed to parse letter {}", input.display()))
}

fn letter_template(settings: &Settings, args: &LetterArgs) -> Result<PageTemplate> {
    let context = settings.letter_context(
        args.order.as_deref(),
        args.date.as_deref(),
        args.time.as_deref(),
    );
    settings
        .page_template(args.media.into(), &context)
        .context("failed to build page template")
}

fn execute_paginate(args: LetterArgs, settings_path: &Path) -> Result<()> {
    let settings = load_settings(settings_path)?;
    let body = read_letter(&args.content)?;
    let template = letter_template(&settings, &args)?;

    let document = layout_letter(
        &GreedyPaginator,
        body.nodes,
        &settings.text_metrics,
        &template,
        &NeverCancel,
    )?;
    for diagnostic in document.diagnostics() {
        eprintln!("warning: {diagnostic}");
    }
    println!("{}", serde_json::to_string_pretty(&document.summary())?);
    Ok(())
}

fn execute_print(args: PrintArgs, settings_path: &Path) -> Result<()> {
    let settings = load_settings(settings_path)?;
    let body = read_letter(&args.letter.content)?;
    let template = letter_template(&settings, &args.letter)?;

    let title = args.title.clone().unwrap_or_else(|| match &args.letter.order {
        Some(order) => format!("Order {order}"),
        None => "Letter".to_string(),
    });
    let mut job_options = settings
        .job_options(title, args.letter.media.into())
        .with_copies(args.copies);
    if let Some(printer) = &args.printer {
        job_options = job_options.with_target(printer.clone());
    }

    let result = match (&args.spool, &args.command) {
        (Some(path), _) => {
            let adapter = TextSpoolAdapter::new(resolve_input_path(path)?);
            print_with(&adapter, body, &settings, &template, &job_options)?
        }
        (None, Some(program)) => {
            let adapter = CommandPrintAdapter::new(program.clone(), Vec::new());
            print_with(&adapter, body, &settings, &template, &job_options)?
        }
        (None, None) => {
            let adapter = CommandPrintAdapter::lp();
            print_with(&adapter, body, &settings, &template, &job_options)?
        }
    };

    for diagnostic in &result.diagnostics {
        eprintln!("warning: {diagnostic}");
    }
    match result.outcome {
        PrintOutcome::Skipped => println!("Letter is empty; nothing was printed"),
        PrintOutcome::Spooled { pages } => {
            println!("Printed {pages} page(s) as '{}'", job_options.title)
        }
    }
    Ok(())
}

fn print_with<A>(
    adapter: &A,
    body: LetterBody,
    settings: &Settings,
    template: &PageTemplate,
    job_options: &PrintJobOptions,
) -> Result<PrintJobResult>
where
    A: PlatformAdapter,
    A::Error: std::fmt::Display,
{
    run_print_job(
        &GreedyPaginator,
        body.nodes,
        &settings.text_metrics,
        template,
        job_options,
        adapter,
        &NeverCancel,
    )
    .with_context(|| format!("print job {} failed", job_options.job_id))
}

fn execute_config_command(command: ConfigCommand, settings_path: &Path) -> Result<()> {
    match command {
        ConfigCommand::Export(args) => export_settings(args, settings_path),
        ConfigCommand::Import(args) => import_settings(args, settings_path),
    }
}

fn export_settings(args: ConfigExportArgs, settings_path: &Path) -> Result<()> {
    let store = SettingsStore::load(settings_path)
        .with_context(|| format!("failed to load settings from {}", settings_path.display()))?;
    let output = resolve_input_path(&args.output)?;
    store
        .export_to(&output)
        .with_context(|| format!("failed to export settings to {}", output.display()))?;
    println!("Exported settings to {}", output.display());
    Ok(())
}

fn import_settings(args: ConfigImportArgs, settings_path: &Path) -> Result<()> {
    let mut store = SettingsStore::load(settings_path)
        .with_context(|| format!("failed to load settings from {}", settings_path.display()))?;
    let input = resolve_input_path(&args.input)?;
    if !input.exists() {
        bail!("settings file '{}' does not exist", input.display());
    }
    store
        .import_from(&input)
        .with_context(|| format!("failed to import settings from {}", input.display()))?;
    println!("Imported settings from {}", input.display());
    Ok(())
}

/// Prints the exchange form instead of posting it.
struct DryRunExchanger;

impl TokenExchanger for DryRunExchanger {
    type Error = Infallible;

    fn exchange(&self, endpoint: &str, form: &TokenExchangeForm) -> Result<(), Self::Error> {
        let fields: serde_json::Map<String, serde_json::Value> = form
            .fields()
            .into_iter()
            .map(|(name, value)| (name.to_string(), json!(value)))
            .collect();
        println!(
            "{}",
            json!({ "method": "POST", "endpoint": endpoint, "form": fields })
        );
        Ok(())
    }
}

fn execute_login(args: LoginArgs, settings_path: &Path) -> Result<()> {
    let settings = load_settings(settings_path)?;
    let mut flow = LoginFlow::new(settings.login, DryRunExchanger);

    let sdk = match args.sdk_error {
        Some(message) => Err(message),
        None => Ok(()),
    };
    flow.sdk_loaded(sdk)?;
    flow.request_login()?;

    let response = if let Some(access_token) = args.token {
        ProviderResponse::Authorized { access_token }
    } else if let Some(message) = args.fail {
        ProviderResponse::Failed(message)
    } else {
        ProviderResponse::Declined
    };
    flow.complete(response)?;
    println!("Login state: {}", flow.state());
    Ok(())
}

fn default_settings_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(".letterpage").join("settings.json")
}

fn resolve_workspace(workspace: Option<PathBuf>) -> Result<PathBuf> {
    match workspace {
        Some(path) => resolve_input_path(&path),
        None => std::env::current_dir().context("determine current directory"),
    }
}

fn resolve_input_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("determine current directory")?
            .join(path))
    }
}
