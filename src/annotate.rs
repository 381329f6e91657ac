//! Page annotation from analyzer results.
//!
//! Consumes one [`AnnotationResult`] and mutates the live page: overlay
//! boxes tagged by group, hover bindings that highlight a whole group at
//! once, the analyzer identity label, an optional scroll target and the
//! summary panel. Annotation is best-effort per item — a malformed item is
//! skipped, never aborts the pass — and there is no rollback.

use std::collections::HashMap;

use crate::hunter::result::AnnotationResult;
use crate::page::{OverlayBox, OverlayHandle, Page, Ui};

/// Border color applied to a whole group while one of its items is hovered
pub const HIGHLIGHT_COLOR: &str = "yellow";

/// Label applied when the result names no analyzer program
pub const FALLBACK_PROGRAM_LABEL: &str = "unknown";

/// Class prefix tagging overlays of one group
pub const GROUP_CLASS_PREFIX: &str = "vdom-group-";

/// Class shared by every overlay of group `index`
pub fn group_class(index: usize) -> String {
    format!("{}{}", GROUP_CLASS_PREFIX, index)
}

/// Hover behavior attached to one overlay.
///
/// `desc` and `title` default to empty strings when the item carried none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverBinding {
    pub handle: OverlayHandle,
    pub group_class: String,
    pub desc: String,
    pub title: String,
}

/// The artifacts one annotation pass left on the page.
///
/// Owns the hover bindings installed on the page's overlays and the stash
/// of border colors to restore on hover-end. The [`AnnotationResult`]
/// itself is consumed by the pass and not retained.
#[derive(Debug, Default)]
pub struct Annotation {
    bindings: Vec<HoverBinding>,
    overlay_count: usize,
    stash: HashMap<OverlayHandle, String>,
}

impl Annotation {
    /// Number of overlay boxes drawn by the pass
    pub fn overlay_count(&self) -> usize {
        self.overlay_count
    }

    /// All hover bindings, in emission order
    pub fn bindings(&self) -> &[HoverBinding] {
        &self.bindings
    }

    /// The binding attached to an overlay, if it has one
    pub fn binding_for(&self, handle: OverlayHandle) -> Option<&HoverBinding> {
        self.bindings.iter().find(|b| b.handle == handle)
    }

    /// Hover-start handler: publish the item's texts and highlight its
    /// whole group, stashing each member's current border color first.
    pub fn hover_start<P, U>(&mut self, page: &mut P, ui: &mut U, handle: OverlayHandle)
    where
        P: Page + ?Sized,
        U: Ui + ?Sized,
    {
        let Some(binding) = self.binding_for(handle).cloned() else {
            return;
        };
        ui.set_item_info(&binding.desc);
        ui.set_status(&binding.title);

        for member in page.overlays_with_class(&binding.group_class) {
            if let Some(color) = page.overlay_border_color(member) {
                self.stash.entry(member).or_insert(color);
            }
            page.set_overlay_border_color(member, HIGHLIGHT_COLOR);
        }
    }

    /// Hover-end handler: restore each group member's stashed border color.
    pub fn hover_end<P>(&mut self, page: &mut P, handle: OverlayHandle)
    where
        P: Page + ?Sized,
    {
        let Some(binding) = self.binding_for(handle).cloned() else {
            return;
        };
        for member in page.overlays_with_class(&binding.group_class) {
            if let Some(color) = self.stash.remove(&member) {
                page.set_overlay_border_color(member, &color);
            }
        }
    }
}

/// Apply an analyzer result to the page and UI.
///
/// Steps, in order: overlay boxes (with scripting temporarily enabled and
/// the prior setting restored afterwards), hover bindings, analyzer
/// identity label, optional scroll, summary panel, refresh request.
pub fn annotate<P, U>(page: &mut P, ui: &mut U, result: &AnnotationResult) -> Annotation
where
    P: Page + ?Sized,
    U: Ui + ?Sized,
{
    let mut annotation = Annotation::default();
    let draw_overlays = !result.groups.is_empty();
    let prior_scripting = page.scripting_enabled();

    if draw_overlays {
        // Overlay interaction needs page scripting; the prior setting is
        // restored at the end of the pass.
        page.set_scripting_enabled(true);

        for (index, group) in result.groups.iter().enumerate() {
            let class = group_class(index);
            for item in group {
                // Best-effort: an item without a full rectangle is skipped
                let Some((x, y, w, h)) = item.rect() else {
                    continue;
                };
                let handle = page.insert_overlay(OverlayBox {
                    x,
                    y,
                    w,
                    h,
                    border_width: item.border_width,
                    border_color: item.border_color.clone(),
                    border_style: item.border_style.clone(),
                    class: class.clone(),
                });
                annotation.overlay_count += 1;

                if !item.no_highlight {
                    annotation.bindings.push(HoverBinding {
                        handle,
                        group_class: class.clone(),
                        desc: item.desc.clone().unwrap_or_default(),
                        title: item.title.clone().unwrap_or_default(),
                    });
                }
            }
        }
    }

    ui.set_program_label(result.program.as_deref().unwrap_or(FALLBACK_PROGRAM_LABEL));

    if let Some(jump) = result.jump_to {
        page.scroll_to(jump.x, jump.y);
    }

    ui.set_page_info(result.summary.as_deref().unwrap_or(""));

    if draw_overlays {
        page.set_scripting_enabled(prior_scripting);
    }
    page.request_refresh();

    annotation
}
