use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::Page;
use crate::template::PageChrome;

/// Output medium a letter is laid out for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaProfile {
    #[default]
    Screen,
    Print,
}

impl MediaProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaProfile::Screen => "screen",
            MediaProfile::Print => "print",
        }
    }
}

/// Physical dimensions of the page prototype, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagePrototype {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub header_height_mm: f32,
    pub footer_height_mm: f32,
}

impl PagePrototype {
    pub const A4_WIDTH_MM: f32 = 210.0;
    pub const A4_HEIGHT_MM: f32 = 297.0;

    pub const fn new(
        page_width_mm: f32,
        page_height_mm: f32,
        header_height_mm: f32,
        footer_height_mm: f32,
    ) -> Self {
        Self {
            page_width_mm,
            page_height_mm,
            header_height_mm,
            footer_height_mm,
        }
    }

    /// A4 with a 25mm header and a 15mm footer, leaving a 257mm main region.
    pub const fn a4_screen() -> Self {
        Self::new(Self::A4_WIDTH_MM, Self::A4_HEIGHT_MM, 25.0, 15.0)
    }

    /// A4 as laid out for the print medium: the header shrinks to 20mm
    /// (25mm at 125% zoom), leaving a 262mm main region.
    pub const fn a4_print() -> Self {
        Self::new(Self::A4_WIDTH_MM, Self::A4_HEIGHT_MM, 20.0, 15.0)
    }

    pub const fn a4(media: MediaProfile) -> Self {
        match media {
            MediaProfile::Screen => Self::a4_screen(),
            MediaProfile::Print => Self::a4_print(),
        }
    }
}

impl Default for PagePrototype {
    fn default() -> Self {
        Self::a4_screen()
    }
}

/// Geometry derived from a [`PagePrototype`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageMetrics {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub header_height_mm: f32,
    pub footer_height_mm: f32,
    pub main_height_mm: f32,
}

impl PageMetrics {
    /// Vertical offset where the main region starts.
    pub fn main_top_mm(&self) -> f32 {
        self.header_height_mm
    }

    /// Vertical offset where the footer starts.
    pub fn footer_top_mm(&self) -> f32 {
        self.page_height_mm - self.footer_height_mm
    }
}

/// Page geometry that cannot hold any content.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("page dimension '{field}' must be a finite, non-negative length (got {value}mm)")]
    InvalidDimension { field: &'static str, value: f32 },
    #[error(
        "header ({header_mm}mm) and footer ({footer_mm}mm) leave no main region on a {page_height_mm}mm page"
    )]
    NoMainRegion {
        page_height_mm: f32,
        header_mm: f32,
        footer_mm: f32,
    },
}

/// Shape every page of a letter is instantiated from: the prototype geometry
/// plus the header/footer content shared by all pages.
#[derive(Debug, Clone)]
pub struct PageTemplate {
    prototype: PagePrototype,
    chrome: Arc<PageChrome>,
}

impl PageTemplate {
    pub fn new(prototype: PagePrototype, chrome: PageChrome) -> Self {
        Self {
            prototype,
            chrome: Arc::new(chrome),
        }
    }

    pub fn prototype(&self) -> PagePrototype {
        self.prototype
    }

    pub fn chrome(&self) -> &Arc<PageChrome> {
        &self.chrome
    }

    /// Reads the prototype geometry. Calling it repeatedly yields identical results.
    pub fn measure(&self) -> Result<PageMetrics, ConfigurationError> {
        let PagePrototype {
            page_width_mm,
            page_height_mm,
            header_height_mm,
            footer_height_mm,
        } = self.prototype;

        for (field, value) in [
            ("page_width_mm", page_width_mm),
            ("page_height_mm", page_height_mm),
            ("header_height_mm", header_height_mm),
            ("footer_height_mm", footer_height_mm),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigurationError::InvalidDimension { field, value });
            }
        }

        let main_height_mm = page_height_mm - header_height_mm - footer_height_mm;
        if main_height_mm <= 0.0 {
            return Err(ConfigurationError::NoMainRegion {
                page_height_mm,
                header_mm: header_height_mm,
                footer_mm: footer_height_mm,
            });
        }

        Ok(PageMetrics {
            page_width_mm,
            page_height_mm,
            header_height_mm,
            footer_height_mm,
            main_height_mm,
        })
    }

    /// Creates an empty page sharing this template's header and footer.
    pub fn instantiate(&self, index: usize) -> Page {
        Page::new(index, Arc::clone(&self.chrome))
    }
}
