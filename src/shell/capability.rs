//! Visualization capabilities the shell can host.

use crate::gateway::types::CollectionView;
use crate::shell::document::escape_html;

/// A view over detection data.
pub trait Visualization: Send + Sync + std::fmt::Debug {
    /// Name the capability is known by inside the application.
    fn name(&self) -> &str;

    /// Render the data as an HTML fragment.
    fn render(&self, view: &CollectionView) -> String;
}

const PALETTE: [&str; 6] = ["#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948"];
const MIN_RADIUS: f64 = 12.0;
const RADIUS_SCALE: f64 = 10.0;
const GAP: f64 = 16.0;

/// One bubble per label, area growing with the label's detection count.
#[derive(Debug, Clone, Default)]
pub struct BubbleViewer;

impl BubbleViewer {
    pub const NAME: &'static str = "BubbleViewer";

    pub fn new() -> Self {
        Self
    }

    /// Radius for a label with `count` detections.
    pub fn radius(count: usize) -> f64 {
        MIN_RADIUS + RADIUS_SCALE * (count as f64).sqrt()
    }
}

impl Visualization for BubbleViewer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn render(&self, view: &CollectionView) -> String {
        let bubbles: Vec<(&str, usize, f64)> = view
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(label, records)| (label.as_str(), records.len(), Self::radius(records.len())))
            .collect();

        if bubbles.is_empty() {
            return r#"<p class="bubble-viewer empty">No detections yet.</p>"#.to_string();
        }

        let max_r = bubbles.iter().map(|(_, _, r)| *r).fold(0.0, f64::max);
        let height = 2.0 * max_r + 2.0 * GAP;
        let width = bubbles.iter().map(|(_, _, r)| 2.0 * r + GAP).sum::<f64>() + GAP;

        let mut svg = format!(
            r#"<svg class="bubble-viewer" xmlns="http://www.w3.org/2000/svg" width="{width:.0}" height="{height:.0}" viewBox="0 0 {width:.0} {height:.0}">"#
        );

        let mut x = GAP;
        for (i, (label, count, r)) in bubbles.iter().enumerate() {
            let cx = x + r;
            let cy = height / 2.0;
            let label = escape_html(label);
            svg.push_str(&format!(
                r#"<g class="bubble" data-label="{label}"><circle cx="{cx:.1}" cy="{cy:.1}" r="{r:.1}" fill="{fill}"/><text x="{cx:.1}" y="{cy:.1}" text-anchor="middle">{label} ({count})</text></g>"#,
                fill = PALETTE[i % PALETTE.len()],
            ));
            x += 2.0 * r + GAP;
        }
        svg.push_str("</svg>");
        svg
    }
}
