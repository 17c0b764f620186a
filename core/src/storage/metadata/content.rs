use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Presentation defaults expected by the reader on the device. They do not
// depend on the source document.
const ZOOM_CENTER_X: i32 = 0;
const ZOOM_CENTER_Y: i32 = 936;
const ZOOM_PAGE_HEIGHT: u32 = 1872;
const ZOOM_PAGE_WIDTH: u32 = 1404;
const ZOOM_SCALE: u32 = 1;
const MARGINS: u32 = 125;
const LINE_HEIGHT: i32 = -1;
const TEXT_SCALE: u32 = 1;
const FORMAT_VERSION: u32 = 1;
const SIZE_UNKNOWN: i64 = -1;

pub const ZOOM_MODE_BEST_FIT: &str = "bestFit";
pub const TEXT_ALIGNMENT_JUSTIFY: &str = "justify";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Document-level metadata shown by the reader.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub authors: Vec<String>,
}

/// Content of a `<identifier>.content` record: how the reader renders the document.
///
/// Field order follows the files the device tooling produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub cover_page_number: i32,
    pub custom_zoom_center_x: i32,
    pub custom_zoom_center_y: i32,
    pub custom_zoom_orientation: Orientation,
    pub custom_zoom_page_height: u32,
    pub custom_zoom_page_width: u32,
    pub custom_zoom_scale: u32,
    pub extra_metadata: Map<String, Value>,
    pub font_name: String,
    pub format_version: u32,
    pub line_height: i32,
    pub margins: u32,
    pub orientation: Orientation,
    pub tags: Vec<Value>,
    pub text_alignment: String,
    pub text_scale: u32,
    pub zoom_mode: String,
    pub page_tags: Vec<Value>,
    pub document_metadata: DocumentInfo,
    /// Source format, extension without the leading dot (e.g. `pdf`).
    pub file_type: String,
    pub original_page_count: usize,
    pub page_count: usize,
    /// One identifier per page plus one trailing sentinel.
    pub pages: Vec<String>,
    pub redirection_page_map: Vec<usize>,
    pub size_in_bytes: i64,
}

impl Content {
    /// Builds a content descriptor with the reader's presentation defaults.
    ///
    /// `pages` must hold `page_count + 1` identifiers; the redirection map is the
    /// identity over the same range.
    pub fn new(file_type: &str, page_count: usize, pages: Vec<String>, authors: Vec<String>) -> Self {
        debug_assert_eq!(pages.len(), page_count + 1);
        Content {
            cover_page_number: 0,
            custom_zoom_center_x: ZOOM_CENTER_X,
            custom_zoom_center_y: ZOOM_CENTER_Y,
            custom_zoom_orientation: Orientation::Portrait,
            custom_zoom_page_height: ZOOM_PAGE_HEIGHT,
            custom_zoom_page_width: ZOOM_PAGE_WIDTH,
            custom_zoom_scale: ZOOM_SCALE,
            extra_metadata: Map::new(),
            font_name: String::new(),
            format_version: FORMAT_VERSION,
            line_height: LINE_HEIGHT,
            margins: MARGINS,
            orientation: Orientation::Portrait,
            tags: Vec::new(),
            text_alignment: TEXT_ALIGNMENT_JUSTIFY.to_string(),
            text_scale: TEXT_SCALE,
            zoom_mode: ZOOM_MODE_BEST_FIT.to_string(),
            page_tags: Vec::new(),
            document_metadata: DocumentInfo { authors },
            file_type: file_type.to_string(),
            original_page_count: page_count,
            page_count,
            pages,
            redirection_page_map: (0..=page_count).collect(),
            size_in_bytes: SIZE_UNKNOWN,
        }
    }
}
