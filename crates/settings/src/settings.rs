use std::io;
use std::path::PathBuf;

use letterpage_printing::{
    HeaderFooterTemplate, LetterContext, MediaProfile, PageChrome, PagePrototype, PageTemplate,
    PrintJobOptions, TemplateError, TextMetrics,
};
use letterpage_social_login::SocialLoginConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SETTINGS_VERSION: u32 = 1;
const MIN_ZOOM_PERCENT: u32 = 10;
const MAX_ZOOM_PERCENT: u32 = 400;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize settings {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write settings {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid {field} template: {source}")]
    Template {
        field: &'static str,
        #[source]
        source: TemplateError,
    },
}

/// Letter layout configuration, passed explicitly to whoever lays out or prints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "PagePrototype::a4_screen")]
    pub screen: PagePrototype,
    #[serde(default)]
    pub print: PrintProfile,
    #[serde(default = "default_header_template")]
    pub header_template: String,
    #[serde(default = "default_footer_template")]
    pub footer_template: String,
    #[serde(default)]
    pub text_metrics: TextMetrics,
    #[serde(default)]
    pub store_name: String,
    #[serde(default)]
    pub login: SocialLoginConfig,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_header_template() -> String {
    "&l&s&r&o".to_string()
}

fn default_footer_template() -> String {
    "&c&d".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            screen: PagePrototype::a4_screen(),
            print: PrintProfile::default(),
            header_template: default_header_template(),
            footer_template: default_footer_template(),
            text_metrics: TextMetrics::default(),
            store_name: String::new(),
            login: SocialLoginConfig::default(),
        }
    }
}

impl Settings {
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = SETTINGS_VERSION;
        }
        if !prototype_is_usable(&self.screen) {
            log::warn!("screen page geometry is unusable, restoring A4 defaults");
            self.screen = PagePrototype::a4_screen();
        }
        self.print.sanitize();
        if !metrics_are_usable(&self.text_metrics) {
            self.text_metrics = TextMetrics::default();
        }
        self.store_name = self.store_name.trim().to_string();
        self.login.sanitize();
    }

    pub fn prototype_for(&self, media: MediaProfile) -> PagePrototype {
        match media {
            MediaProfile::Screen => self.screen,
            MediaProfile::Print => self.print.prototype,
        }
    }

    /// Values for header/footer tokens; the store name comes from the settings.
    pub fn letter_context<'a>(
        &'a self,
        order_reference: Option<&'a str>,
        date: Option<&'a str>,
        time: Option<&'a str>,
    ) -> LetterContext<'a> {
        LetterContext {
            store_name: Some(self.store_name.as_str()).filter(|name| !name.is_empty()),
            order_reference,
            date,
            time,
        }
    }

    /// Builds the page template for `media`, rendering the header and footer
    /// once against `context`.
    pub fn page_template(
        &self,
        media: MediaProfile,
        context: &LetterContext<'_>,
    ) -> Result<PageTemplate, SettingsError> {
        let header = HeaderFooterTemplate::parse(&self.header_template).map_err(|source| {
            SettingsError::Template {
                field: "header",
                source,
            }
        })?;
        let footer = HeaderFooterTemplate::parse(&self.footer_template).map_err(|source| {
            SettingsError::Template {
                field: "footer",
                source,
            }
        })?;
        Ok(PageTemplate::new(
            self.prototype_for(media),
            PageChrome::render(&header, &footer, context),
        ))
    }

    /// Job options carrying the print zoom hint when printing.
    pub fn job_options(&self, title: impl Into<String>, media: MediaProfile) -> PrintJobOptions {
        let options = PrintJobOptions::new(title, media);
        match media {
            MediaProfile::Screen => options,
            MediaProfile::Print => options.with_zoom(self.print.zoom_percent),
        }
    }
}

/// Page geometry used for the print medium.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrintProfile {
    #[serde(default = "PagePrototype::a4_print")]
    pub prototype: PagePrototype,
    /// Render scale forwarded to the host print facility.
    #[serde(default = "default_zoom_percent")]
    pub zoom_percent: u32,
}

fn default_zoom_percent() -> u32 {
    125
}

impl Default for PrintProfile {
    fn default() -> Self {
        Self {
            prototype: PagePrototype::a4_print(),
            zoom_percent: default_zoom_percent(),
        }
    }
}

impl PrintProfile {
    fn sanitize(&mut self) {
        if !prototype_is_usable(&self.prototype) {
            log::warn!("print page geometry is unusable, restoring A4 defaults");
            self.prototype = PagePrototype::a4_print();
        }
        if self.zoom_percent == 0 {
            self.zoom_percent = default_zoom_percent();
        }
        self.zoom_percent = self.zoom_percent.clamp(MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT);
    }
}

fn prototype_is_usable(prototype: &PagePrototype) -> bool {
    PageTemplate::new(*prototype, PageChrome::default())
        .measure()
        .is_ok()
}

fn metrics_are_usable(metrics: &TextMetrics) -> bool {
    [
        metrics.line_height_mm,
        metrics.average_char_width_mm,
        metrics.heading_scale,
    ]
    .iter()
    .all(|value| value.is_finite() && *value > 0.0)
        && metrics.block_spacing_mm.is_finite()
        && metrics.block_spacing_mm >= 0.0
}
