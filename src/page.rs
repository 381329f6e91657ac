//! Collaborator abstraction for the live page and its surrounding UI.
//!
//! The browser shell owns the renderable page and a handful of UI
//! affordances; the pipeline only ever talks to them through the traits in
//! this module:
//! - [`Page`] for structure export and overlay mutation
//! - [`Ui`] for status text, the side panels and the analyzer identity label
//!
//! [`MockPage`] and [`MockUi`] are full recording implementations used by
//! tests and by the CLI to drive the pipeline against a page loaded from a
//! file.

use serde::{Deserialize, Serialize};

/// Opaque handle to an overlay element inserted into a page
pub type OverlayHandle = usize;

/// A positioned rectangle overlaid on the page.
///
/// Coordinates are page coordinates in pixels. The `class` tags every box of
/// one group so the whole group can be restyled together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayBox {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
    /// Border width in pixels
    pub border_width: u32,
    /// Border color (CSS color keyword or hex)
    pub border_color: String,
    /// Border style (e.g. "solid", "dashed")
    pub border_style: String,
    /// Group class, e.g. "vdom-group-0"
    pub class: String,
}

/// Trait for the renderable page the pipeline exports from and annotates.
///
/// Implementations are expected to be cheap to mutate; annotation is
/// compute-bound page mutation that runs to completion synchronously.
pub trait Page {
    /// Serialized visible structure of the page.
    ///
    /// Only meaningful once the page has finished loading; calling earlier
    /// is a caller precondition violation and yields stale bytes, not an
    /// error.
    fn structure(&self) -> Vec<u8>;

    /// Whether page scripting is currently enabled
    fn scripting_enabled(&self) -> bool;

    /// Enable or disable page scripting
    fn set_scripting_enabled(&mut self, enabled: bool);

    /// Insert an overlay box, returning its handle
    fn insert_overlay(&mut self, overlay: OverlayBox) -> OverlayHandle;

    /// Handles of every overlay tagged with `class`
    fn overlays_with_class(&self, class: &str) -> Vec<OverlayHandle>;

    /// Current border color of an overlay, if the handle is valid
    fn overlay_border_color(&self, handle: OverlayHandle) -> Option<String>;

    /// Restyle one overlay's border color
    fn set_overlay_border_color(&mut self, handle: OverlayHandle, color: &str);

    /// Scroll the page so the given point is in view
    fn scroll_to(&mut self, x: i64, y: i64);

    /// Request a visual refresh after a batch of mutations
    fn request_refresh(&mut self);
}

/// Trait for the UI affordances the pipeline writes to.
pub trait Ui {
    /// Write transient text to the status area
    fn set_status(&mut self, message: &str);

    /// Write the hovered item's description into the side-info panel
    fn set_item_info(&mut self, text: &str);

    /// Write the page summary into the page-info panel
    fn set_page_info(&mut self, text: &str);

    /// Apply the analyzer identity label and make it visible
    fn set_program_label(&mut self, label: &str);

    /// Advisory notification that the analyzer produced a line of output.
    ///
    /// Fire-and-forget; output is log-only and needs no backpressure.
    fn analyzer_output(&mut self, line: &str);
}

/// A recording page double.
///
/// Stores the serialized structure it was given, records every mutation the
/// annotator performs, and answers queries from that record.
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    structure: Vec<u8>,
    scripting: bool,
    overlays: Vec<OverlayBox>,
    scroll: Option<(i64, i64)>,
    refreshes: usize,
}

impl MockPage {
    /// Create an empty page with scripting disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a page whose structure is the given bytes
    pub fn with_structure(structure: impl Into<Vec<u8>>) -> Self {
        Self {
            structure: structure.into(),
            ..Self::default()
        }
    }

    /// Replace the page structure (a new "load")
    pub fn set_structure(&mut self, structure: impl Into<Vec<u8>>) {
        self.structure = structure.into();
    }

    /// All overlays inserted so far, in insertion order
    pub fn overlays(&self) -> &[OverlayBox] {
        &self.overlays
    }

    /// Overlay by handle
    pub fn overlay(&self, handle: OverlayHandle) -> Option<&OverlayBox> {
        self.overlays.get(handle)
    }

    /// Last scroll target, if any
    pub fn scroll_pos(&self) -> Option<(i64, i64)> {
        self.scroll
    }

    /// Number of refresh requests recorded
    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }
}

impl Page for MockPage {
    fn structure(&self) -> Vec<u8> {
        self.structure.clone()
    }

    fn scripting_enabled(&self) -> bool {
        self.scripting
    }

    fn set_scripting_enabled(&mut self, enabled: bool) {
        self.scripting = enabled;
    }

    fn insert_overlay(&mut self, overlay: OverlayBox) -> OverlayHandle {
        self.overlays.push(overlay);
        self.overlays.len() - 1
    }

    fn overlays_with_class(&self, class: &str) -> Vec<OverlayHandle> {
        self.overlays
            .iter()
            .enumerate()
            .filter(|(_, o)| o.class == class)
            .map(|(i, _)| i)
            .collect()
    }

    fn overlay_border_color(&self, handle: OverlayHandle) -> Option<String> {
        self.overlays.get(handle).map(|o| o.border_color.clone())
    }

    fn set_overlay_border_color(&mut self, handle: OverlayHandle, color: &str) {
        if let Some(overlay) = self.overlays.get_mut(handle) {
            overlay.border_color = color.to_string();
        }
    }

    fn scroll_to(&mut self, x: i64, y: i64) {
        self.scroll = Some((x, y));
    }

    fn request_refresh(&mut self) {
        self.refreshes += 1;
    }
}

/// A recording UI double.
#[derive(Debug, Clone, Default)]
pub struct MockUi {
    /// Every status message, newest last
    pub status: Vec<String>,
    /// Current side-info panel text
    pub item_info: String,
    /// Current page-info panel text
    pub page_info: String,
    /// Analyzer identity label, once set
    pub program_label: Option<String>,
    /// Whether the label has been made visible
    pub program_label_visible: bool,
    /// Analyzer output lines, in arrival order
    pub output: Vec<String>,
}

impl MockUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent status message, if any
    pub fn last_status(&self) -> Option<&str> {
        self.status.last().map(String::as_str)
    }
}

impl Ui for MockUi {
    fn set_status(&mut self, message: &str) {
        self.status.push(message.to_string());
    }

    fn set_item_info(&mut self, text: &str) {
        self.item_info = text.to_string();
    }

    fn set_page_info(&mut self, text: &str) {
        self.page_info = text.to_string();
    }

    fn set_program_label(&mut self, label: &str) {
        self.program_label = Some(label.to_string());
        self.program_label_visible = true;
    }

    fn analyzer_output(&mut self, line: &str) {
        self.output.push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_box(class: &str, color: &str) -> OverlayBox {
        OverlayBox {
            x: 10,
            y: 20,
            w: 100,
            h: 30,
            border_width: 2,
            border_color: color.to_string(),
            border_style: "solid".to_string(),
            class: class.to_string(),
        }
    }

    #[test]
    fn test_mock_page_records_overlays() {
        let mut page = MockPage::new();
        let a = page.insert_overlay(sample_box("vdom-group-0", "red"));
        let b = page.insert_overlay(sample_box("vdom-group-0", "blue"));
        let c = page.insert_overlay(sample_box("vdom-group-1", "red"));

        assert_eq!(page.overlays_with_class("vdom-group-0"), vec![a, b]);
        assert_eq!(page.overlays_with_class("vdom-group-1"), vec![c]);
        assert_eq!(page.overlay_border_color(b).as_deref(), Some("blue"));
    }

    #[test]
    fn test_mock_page_restyle_and_scroll() {
        let mut page = MockPage::new();
        let handle = page.insert_overlay(sample_box("vdom-group-0", "red"));
        page.set_overlay_border_color(handle, "yellow");
        assert_eq!(page.overlay_border_color(handle).as_deref(), Some("yellow"));

        page.scroll_to(0, 20);
        assert_eq!(page.scroll_pos(), Some((0, 20)));

        page.request_refresh();
        assert_eq!(page.refresh_count(), 1);
    }

    #[test]
    fn test_mock_page_invalid_handle_is_ignored() {
        let mut page = MockPage::new();
        assert_eq!(page.overlay_border_color(5), None);
        page.set_overlay_border_color(5, "yellow");
        assert!(page.overlays().is_empty());
    }

    #[test]
    fn test_mock_ui_program_label_becomes_visible() {
        let mut ui = MockUi::new();
        assert!(!ui.program_label_visible);
        ui.set_program_label("findtitles");
        assert!(ui.program_label_visible);
        assert_eq!(ui.program_label.as_deref(), Some("findtitles"));
    }

    #[test]
    fn test_mock_page_structure_roundtrip() {
        let page = MockPage::with_structure(b"<root/>".to_vec());
        assert_eq!(page.structure(), b"<root/>");
    }
}
