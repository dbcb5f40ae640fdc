//! Startup wiring
//!
//! A session owns the page for the lifetime of the tool: it installs the
//! sandbox once, listens for pointer events on the content root straight
//! away, and mounts the sidebar UI only after the store has hydrated.

use ego_tree::NodeId;
use scraper::Html;
use tracing::debug;

use crate::config::EngineConfig;
use crate::controller::{PointerEvent, SelectionController};
use crate::dom::Page;
use crate::error::Result;
use crate::sandbox::{IsolationSandbox, SandboxRoots};
use crate::store::{FieldStore, FieldTypeSource, SelectionSink};
use crate::types::SelectionEvent;

/// Renders the sidebar UI into the isolated partition
pub trait SidebarRenderer {
    /// `partition` is the isolated tree, `mount` the element to render into
    fn render(&mut self, partition: &mut Html, mount: NodeId);
}

/// A page with the selection engine installed
pub struct Session<S, K> {
    page: Page,
    roots: SandboxRoots,
    controller: SelectionController<S, K>,
    sidebar_mounted: bool,
}

impl<S, K> Session<S, K>
where
    S: FieldTypeSource,
    K: SelectionSink,
{
    /// Install the engine on `page`
    ///
    /// Returns `None` when the page has no body or already carries the
    /// engine; nothing is changed in that case.
    pub fn start(mut page: Page, config: &EngineConfig, source: S, sink: K) -> Option<Self> {
        let roots = IsolationSandbox::new(config).initialize(&mut page)?;
        let controller = SelectionController::new(config, roots.content_root, source, sink);
        debug!("selection session started");
        Some(Self {
            page,
            roots,
            controller,
            sidebar_mounted: false,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Mutable page access for host-driven DOM changes
    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn roots(&self) -> SandboxRoots {
        self.roots
    }

    pub fn controller(&self) -> &SelectionController<S, K> {
        &self.controller
    }

    /// Feed one host pointer event through the controller
    pub fn dispatch(&mut self, event: PointerEvent) -> Option<SelectionEvent> {
        self.controller.handle(&mut self.page, event)
    }

    pub fn pointer_over(&mut self, target: NodeId) {
        self.controller.on_pointer_over(&mut self.page, target);
    }

    pub fn click(&mut self, target: NodeId) -> Option<SelectionEvent> {
        self.controller.on_click(&mut self.page, target)
    }

    pub fn is_sidebar_mounted(&self) -> bool {
        self.sidebar_mounted
    }

    /// Hand the mount point to `renderer`; later calls do nothing
    pub fn mount_sidebar<R: SidebarRenderer>(&mut self, renderer: &mut R) -> bool {
        if self.sidebar_mounted {
            return false;
        }
        let Some(partition) = self.page.shadow_root_mut(self.roots.interface_host) else {
            return false;
        };
        renderer.render(partition, self.roots.mount);
        self.sidebar_mounted = true;
        debug!("sidebar mounted");
        true
    }

    /// Wait for the store to hydrate, then mount the sidebar
    pub async fn mount_sidebar_when_ready<R: SidebarRenderer>(
        &mut self,
        store: &FieldStore,
        renderer: &mut R,
    ) -> Result<bool> {
        store.ready().await?;
        Ok(self.mount_sidebar(renderer))
    }
}
