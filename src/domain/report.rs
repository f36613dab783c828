//! Positioned content of the one-page PDF report.

/// US Letter, in PDF points
pub const PAGE_WIDTH: f64 = 612.0;
pub const PAGE_HEIGHT: f64 = 792.0;

/// Left margin shared by every text line
pub const LEFT_MARGIN: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFont {
    Bold,
    Regular,
    Oblique,
}

impl ReportFont {
    pub fn base_font(&self) -> &'static str {
        match self {
            ReportFont::Bold => "Helvetica-Bold",
            ReportFont::Regular => "Helvetica",
            ReportFont::Oblique => "Helvetica-Oblique",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font: ReportFont,
    pub size: f64,
}

impl ReportLine {
    /// A line at the left margin
    pub fn new(text: impl Into<String>, y: f64, font: ReportFont, size: f64) -> Self {
        Self {
            text: text.into(),
            x: LEFT_MARGIN,
            y,
            font,
            size,
        }
    }
}

/// Straight line between two points, in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Separator {
    pub from: (f64, f64),
    pub to: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub width: f64,
    pub height: f64,
    pub lines: Vec<ReportLine>,
    pub separators: Vec<Separator>,
}
