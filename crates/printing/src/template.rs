use serde::Serialize;
use thiserror::Error;

/// Tokens recognised by the header/footer parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateToken {
    StoreName,
    OrderReference,
    Date,
    Time,
}

impl TemplateToken {
    fn from_marker(marker: char) -> Option<Self> {
        match marker {
            's' | 'S' => Some(TemplateToken::StoreName),
            'o' | 'O' => Some(TemplateToken::OrderReference),
            'd' | 'D' => Some(TemplateToken::Date),
            't' | 'T' => Some(TemplateToken::Time),
            _ => None,
        }
    }

    fn resolve<'a>(&self, context: &LetterContext<'a>) -> Option<&'a str> {
        match self {
            TemplateToken::StoreName => context.store_name,
            TemplateToken::OrderReference => context.order_reference,
            TemplateToken::Date => context.date,
            TemplateToken::Time => context.time,
        }
    }
}

/// Template segments per alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSegment {
    Literal(String),
    Token(TemplateToken),
}

/// Horizontal slot a header/footer segment is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    fn from_marker(marker: char) -> Option<Self> {
        match marker {
            'l' | 'L' => Some(Alignment::Left),
            'c' | 'C' => Some(Alignment::Center),
            'r' | 'R' => Some(Alignment::Right),
            _ => None,
        }
    }
}

/// Parsed representation of a header/footer template.
///
/// `&l`, `&c` and `&r` switch the active slot, `&s`, `&o`, `&d` and `&t`
/// insert the store name, order reference, date and time, `&&` is a literal
/// ampersand.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderFooterTemplate {
    pub left: Vec<TemplateSegment>,
    pub center: Vec<TemplateSegment>,
    pub right: Vec<TemplateSegment>,
}

impl HeaderFooterTemplate {
    pub fn parse(input: &str) -> Result<Self, TemplateError> {
        let mut template = Self::default();
        let mut alignment = Alignment::Left;
        let mut buffer = String::new();

        let mut chars = input.chars();
        while let Some(ch) = chars.next() {
            if ch != '&' {
                buffer.push(ch);
                continue;
            }

            let Some(marker) = chars.next() else {
                buffer.push('&');
                break;
            };

            if marker == '&' {
                buffer.push('&');
            } else if let Some(next_alignment) = Alignment::from_marker(marker) {
                template.flush(&mut buffer, alignment);
                alignment = next_alignment;
            } else if let Some(token) = TemplateToken::from_marker(marker) {
                template.flush(&mut buffer, alignment);
                template
                    .slot_mut(alignment)
                    .push(TemplateSegment::Token(token));
            } else {
                return Err(TemplateError::UnknownToken(marker));
            }
        }

        template.flush(&mut buffer, alignment);
        Ok(template)
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.center.is_empty() && self.right.is_empty()
    }

    pub fn render(&self, context: &LetterContext<'_>) -> RenderedHeaderFooter {
        RenderedHeaderFooter {
            left: render_segments(&self.left, context),
            center: render_segments(&self.center, context),
            right: render_segments(&self.right, context),
        }
    }

    fn slot_mut(&mut self, alignment: Alignment) -> &mut Vec<TemplateSegment> {
        match alignment {
            Alignment::Left => &mut self.left,
            Alignment::Center => &mut self.center,
            Alignment::Right => &mut self.right,
        }
    }

    fn flush(&mut self, buffer: &mut String, alignment: Alignment) {
        if buffer.is_empty() {
            return;
        }
        let literal = TemplateSegment::Literal(std::mem::take(buffer));
        self.slot_mut(alignment).push(literal);
    }
}

fn render_segments(segments: &[TemplateSegment], context: &LetterContext<'_>) -> String {
    let mut output = String::new();
    for segment in segments {
        match segment {
            TemplateSegment::Literal(text) => output.push_str(text),
            TemplateSegment::Token(token) => {
                if let Some(value) = token.resolve(context) {
                    output.push_str(value);
                }
            }
        }
    }
    output
}

/// Values substituted into header/footer tokens for one letter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LetterContext<'a> {
    pub store_name: Option<&'a str>,
    pub order_reference: Option<&'a str>,
    pub date: Option<&'a str>,
    pub time: Option<&'a str>,
}

/// Rendered header/footer strings for each alignment slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedHeaderFooter {
    pub left: String,
    pub center: String,
    pub right: String,
}

impl RenderedHeaderFooter {
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.center.is_empty() && self.right.is_empty()
    }

    /// Non-empty slots in left, center, right order.
    pub fn slots(&self) -> impl Iterator<Item = (Alignment, &str)> {
        [
            (Alignment::Left, self.left.as_str()),
            (Alignment::Center, self.center.as_str()),
            (Alignment::Right, self.right.as_str()),
        ]
        .into_iter()
        .filter(|(_, text)| !text.is_empty())
    }
}

/// Header and footer content, identical on every page of a letter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageChrome {
    pub header: RenderedHeaderFooter,
    pub footer: RenderedHeaderFooter,
}

impl PageChrome {
    pub fn render(
        header: &HeaderFooterTemplate,
        footer: &HeaderFooterTemplate,
        context: &LetterContext<'_>,
    ) -> Self {
        Self {
            header: header.render(context),
            footer: footer.render(context),
        }
    }
}

/// Errors raised while parsing header/footer templates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown header/footer token '&{0}'")]
    UnknownToken(char),
}
