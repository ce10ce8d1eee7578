/// Host document-rendering capability. `open` resolves a document reference
/// to its page count; `begin_render` starts an asynchronous raster of one
/// page into the surface and `cancel` abandons the in-flight one. The host
/// reports completion (including cancelled completion) back through
/// [`CasebookViewer::on_render_complete`].
pub trait RenderSurface {
    fn open(&mut self, document: &str) -> Result<u32, RenderError>;
    fn begin_render(&mut self, page: u32);
    fn cancel(&mut self);
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to load casebook document: {0}")]
    Load(String),
    #[error("no casebook document is open")]
    NotOpen,
}

/// Page navigation over an open casebook. Requests issued while a render is
/// in flight cancel it and park the newest page in a single pending slot, so
/// a burst of rapid navigation renders only the last page requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CasebookViewer {
    page_num: u32,
    page_count: u32,
    rendering: bool,
    pending_page: Option<u32>,
}

impl CasebookViewer {
    pub fn open(
        &mut self,
        surface: &mut dyn RenderSurface,
        document: &str,
    ) -> Result<(), RenderError> {
        self.page_count = surface.open(document)?;
        self.page_num = 1;
        self.rendering = false;
        self.pending_page = None;
        self.render_page(surface, 1);
        Ok(())
    }

    pub fn current_page(&self) -> u32 {
        self.page_num
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    /// No-op on the last page.
    pub fn next_page(&mut self, surface: &mut dyn RenderSurface) {
        if self.page_count == 0 || self.page_num >= self.page_count {
            return;
        }
        self.page_num += 1;
        self.render_page(surface, self.page_num);
    }

    /// No-op on page 1.
    pub fn prev_page(&mut self, surface: &mut dyn RenderSurface) {
        if self.page_count == 0 || self.page_num <= 1 {
            return;
        }
        self.page_num -= 1;
        self.render_page(surface, self.page_num);
    }

    /// The host calls this when a render finishes, successfully or after a
    /// cancel. Drains the pending slot if navigation raced the render.
    pub fn on_render_complete(&mut self, surface: &mut dyn RenderSurface) {
        self.rendering = false;
        if let Some(page) = self.pending_page.take() {
            self.render_page(surface, page);
        }
    }

    fn render_page(&mut self, surface: &mut dyn RenderSurface, page: u32) {
        if self.rendering {
            surface.cancel();
            // Latest-wins: intermediate requests are dropped, never queued.
            self.pending_page = Some(page);
            return;
        }
        self.rendering = true;
        surface.begin_render(page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeSurface {
        page_count: u32,
        fail_open: bool,
        renders: Vec<u32>,
        cancels: u32,
    }

    impl RenderSurface for FakeSurface {
        fn open(&mut self, _document: &str) -> Result<u32, RenderError> {
            if self.fail_open {
                return Err(RenderError::Load("missing document".to_string()));
            }
            Ok(self.page_count)
        }

        fn begin_render(&mut self, page: u32) {
            self.renders.push(page);
        }

        fn cancel(&mut self) {
            self.cancels += 1;
        }
    }

    fn open_viewer(pages: u32) -> (CasebookViewer, FakeSurface) {
        let mut surface = FakeSurface {
            page_count: pages,
            ..FakeSurface::default()
        };
        let mut viewer = CasebookViewer::default();
        viewer.open(&mut surface, "cases/default.pdf").expect("open");
        (viewer, surface)
    }

    #[test]
    fn open_renders_the_first_page() {
        let (viewer, surface) = open_viewer(7);
        assert_eq!(viewer.current_page(), 1);
        assert_eq!(viewer.page_count(), 7);
        assert_eq!(surface.renders, vec![1]);
    }

    #[test]
    fn previous_on_page_one_is_a_no_op() {
        let (mut viewer, mut surface) = open_viewer(3);
        viewer.prev_page(&mut surface);
        assert_eq!(viewer.current_page(), 1);
        assert_eq!(surface.renders, vec![1]);
    }

    #[test]
    fn next_on_the_last_page_is_a_no_op() {
        let (mut viewer, mut surface) = open_viewer(2);
        viewer.on_render_complete(&mut surface);
        viewer.next_page(&mut surface);
        viewer.on_render_complete(&mut surface);
        assert_eq!(viewer.current_page(), 2);

        viewer.next_page(&mut surface);
        assert_eq!(viewer.current_page(), 2);
        assert_eq!(surface.renders, vec![1, 2]);
    }

    #[test]
    fn rapid_navigation_keeps_only_the_newest_request() {
        let (mut viewer, mut surface) = open_viewer(9);
        // Page 1 is still rendering; each jump cancels and supersedes.
        viewer.next_page(&mut surface);
        viewer.next_page(&mut surface);
        viewer.next_page(&mut surface);
        assert_eq!(viewer.current_page(), 4);
        assert_eq!(surface.cancels, 3);
        assert_eq!(surface.renders, vec![1]);

        viewer.on_render_complete(&mut surface);
        assert_eq!(surface.renders, vec![1, 4]);

        viewer.on_render_complete(&mut surface);
        assert!(!viewer.is_rendering());
        assert_eq!(surface.renders, vec![1, 4]);
    }

    #[test]
    fn failed_open_reports_a_load_error() {
        let mut surface = FakeSurface {
            fail_open: true,
            ..FakeSurface::default()
        };
        let mut viewer = CasebookViewer::default();
        assert!(matches!(
            viewer.open(&mut surface, "cases/default.pdf"),
            Err(RenderError::Load(_))
        ));
        assert!(surface.renders.is_empty());
    }
}
