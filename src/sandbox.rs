//! Page restructuring for style isolation
//!
//! Runs once at startup:
//! 1. the body's content moves into a marked wrapper (the content root)
//! 2. an interface container is appended next to it
//! 3. the container gets an encapsulated partition (the isolated root)
//! 4. bundled style elements are copied into the partition
//! 5. a mount element with all inherited styles reset is added for the UI
//!
//! A page that already carries the wrapper is left untouched.

use ego_tree::NodeId;
use tracing::debug;

use crate::config::EngineConfig;
use crate::dom::{escape_attr, Page};
use crate::error::Result;
use crate::selector::escape_ident;

/// Handles produced by sandbox initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxRoots {
    /// Wrapper around the original page content; pointer events are
    /// observed here
    pub content_root: NodeId,
    /// Interface container hosting the isolated partition
    pub interface_host: NodeId,
    /// UI mount element inside the partition
    pub mount: NodeId,
}

/// Restructures a page so injected UI and host styles stay apart
#[derive(Debug, Clone)]
pub struct IsolationSandbox<'a> {
    config: &'a EngineConfig,
}

impl<'a> IsolationSandbox<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Restructure `page`; `None` when it has no body or was already done
    pub fn initialize(&self, page: &mut Page) -> Option<SandboxRoots> {
        let Some(body) = page.body() else {
            debug!("page has no body, sandbox not installed");
            return None;
        };
        if self.main_marker_present(page) {
            debug!("sandbox already installed");
            return None;
        }

        match self.install(page, body) {
            Ok(roots) => {
                debug!(?roots, "sandbox installed");
                Some(roots)
            }
            Err(err) => {
                debug!(error = %err, "sandbox installation failed");
                None
            }
        }
    }

    /// Roots of a page that was initialized earlier
    pub fn locate(&self, page: &Page) -> Option<SandboxRoots> {
        let content_root = page
            .query_selector(&self.class_selector(&self.config.main_class))
            .ok()??;
        let interface_host = page
            .query_selector(&self.class_selector(&self.config.sidebar_class))
            .ok()??;
        let shadow = page.shadow_root(interface_host)?;
        let mount = shadow
            .tree
            .root()
            .children()
            .filter(|child| child.value().is_element())
            .last()?
            .id();
        Some(SandboxRoots {
            content_root,
            interface_host,
            mount,
        })
    }

    fn main_marker_present(&self, page: &Page) -> bool {
        matches!(
            page.query_selector(&self.class_selector(&self.config.main_class)),
            Ok(Some(_))
        )
    }

    fn install(&self, page: &mut Page, body: NodeId) -> Result<SandboxRoots> {
        // Resolved up front so a bad selector fails before anything moves
        let styles = page.query_selector_all(&self.config.bundled_styles_selector)?;

        let content_root = page.create_element(&format!(
            r#"<div class="{}"></div>"#,
            escape_attr(&self.config.main_class)
        ))?;
        page.move_children(body, content_root)?;
        page.append(body, content_root)?;

        let interface_host = page.create_element(&format!(
            r#"<div class="{}"></div>"#,
            escape_attr(&self.config.sidebar_class)
        ))?;
        page.append(body, interface_host)?;
        page.attach_shadow(interface_host)?;

        for style in styles {
            page.clone_into_shadow(style, interface_host)?;
        }

        let mount = page.append_to_shadow(
            interface_host,
            &format!(
                r#"<div style="{}"></div>"#,
                escape_attr(&self.config.mount_style)
            ),
        )?;

        Ok(SandboxRoots {
            content_root,
            interface_host,
            mount,
        })
    }

    fn class_selector(&self, class: &str) -> String {
        format!(".{}", escape_ident(class))
    }
}
