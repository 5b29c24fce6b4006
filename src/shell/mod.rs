//! Client shell.
//!
//! # Data Flow
//! ```text
//! Shell::new(anchor, capability)      composition happens here, once
//!     → mount(document)               fails fast when the anchor is absent
//!     → MountedApp
//!         → render_page(client)       GET /collection → capability → anchor
//!         → unmount()                 in-flight results are discarded
//! ```
//!
//! # Design Decisions
//! - The capability is a constructor argument; nothing registers at runtime
//! - Gateway failures render into the page, they never escape as errors

pub mod capability;
pub mod document;

use std::future::Future;
use std::ops::Range;
use std::sync::Arc;

use tokio::sync::watch;

use crate::gateway::types::CollectionView;
use crate::gateway::{GatewayClient, GatewayError};

pub use capability::{BubbleViewer, Visualization};
pub use document::{escape_html, Document, MountError};

/// An application waiting to be mounted.
#[derive(Debug, Clone)]
pub struct Shell {
    anchor: String,
    capability: Arc<dyn Visualization>,
}

impl Shell {
    pub fn new(anchor: impl Into<String>, capability: Arc<dyn Visualization>) -> Self {
        Self {
            anchor: anchor.into(),
            capability,
        }
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub fn capability(&self) -> &dyn Visualization {
        self.capability.as_ref()
    }

    /// Bind the application to the anchor element of `document`.
    pub fn mount(self, document: Document) -> Result<MountedApp, MountError> {
        let range = document.anchor_range(&self.anchor)?;
        let (unmount_tx, _) = watch::channel(false);

        tracing::info!(
            anchor = %self.anchor,
            capability = self.capability.name(),
            "Application mounted"
        );

        Ok(MountedApp {
            shell: self,
            document,
            range,
            unmount_tx: Arc::new(unmount_tx),
        })
    }
}

/// A shell bound to its anchor.
///
/// Clones share mount state: unmounting one unmounts all.
#[derive(Debug, Clone)]
pub struct MountedApp {
    shell: Shell,
    document: Document,
    range: Range<usize>,
    unmount_tx: Arc<watch::Sender<bool>>,
}

impl MountedApp {
    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn is_mounted(&self) -> bool {
        !*self.unmount_tx.borrow()
    }

    /// Tear the application down. Outstanding guarded calls resolve to `None`.
    pub fn unmount(&self) {
        if !self.unmount_tx.send_replace(true) {
            tracing::info!(anchor = %self.shell.anchor, "Application unmounted");
        }
    }

    /// Await `call` unless the application is torn down first.
    ///
    /// Nothing is sent to the backend on teardown; the result is just dropped.
    pub async fn guard<F: Future>(&self, call: F) -> Option<F::Output> {
        let mut unmounted = self.unmount_tx.subscribe();
        if *unmounted.borrow_and_update() {
            return None;
        }

        tokio::select! {
            output = call => {
                if self.is_mounted() { Some(output) } else { None }
            }
            _ = unmounted.wait_for(|gone| *gone) => None,
        }
    }

    /// Fetch detections and render the full page.
    ///
    /// `None` when the application was unmounted while the call was pending.
    pub async fn render_page(&self, client: &GatewayClient) -> Option<String> {
        let outcome = self.guard(client.list_detections()).await?;
        Some(self.render(&outcome))
    }

    /// Render the page for a finished gateway call.
    pub fn render(&self, outcome: &Result<CollectionView, GatewayError>) -> String {
        let content = match outcome {
            Ok(view) => self.shell.capability.render(view),
            Err(err) => error_panel(err),
        };
        self.document.with_content(&self.range, &content)
    }
}

fn network_panel(summary: &str, reason: &str) -> String {
    format!(
        r#"<div class="error network" role="alert"><p>{summary}: {}</p><a href="" class="retry">Retry</a></div>"#,
        escape_html(reason)
    )
}

fn error_panel(err: &GatewayError) -> String {
    match err {
        GatewayError::Unreachable { reason } => network_panel("Backend unreachable", reason),
        GatewayError::Interrupted { reason } => network_panel("Backend did not answer", reason),
        GatewayError::Application { message, .. } => format!(
            r#"<div class="error application" role="alert"><p>{}</p></div>"#,
            escape_html(message)
        ),
        GatewayError::Decode(detail) => format!(
            r#"<div class="error application" role="alert"><p>Unexpected response from backend: {}</p></div>"#,
            escape_html(detail)
        ),
        GatewayError::Request(detail) => format!(
            r#"<div class="error application" role="alert"><p>Request could not be sent: {}</p></div>"#,
            escape_html(detail)
        ),
    }
}
