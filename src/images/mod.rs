//! Image loading optimizations
//!
//! Two complementary strategies:
//! - Lazy loading: images below the fold keep their source in a data
//!   attribute until they scroll near the viewport
//! - Batch preloading: known-important images are fetched and decoded
//!   up front, with results recorded in the shared image cache

mod observer;

pub use observer::ViewportObserver;

use futures::future::join_all;
use image::GenericImageView;
use log::debug;

use crate::cache::{ImageEntry, SharedImageCache};
use crate::dom::{Document, Node};
use crate::net::Fetcher;
use crate::page::PageView;

/// Class marking an image whose final source has been applied
pub const LOADED_CLASS: &str = "loaded";
/// Class for styling images managed by the optimizer
pub const PRELOAD_CLASS: &str = "preload-img";
/// Attribute holding the deferred image source
pub const DATA_SRC_ATTR: &str = "data-src";

/// Estimated vertical distance between successive images
const ROW_HEIGHT: f32 = 200.0;

/// Defers offscreen image loads until they approach the viewport
#[derive(Debug)]
pub struct ImageOptimizer {
    enabled: bool,
    observer: ViewportObserver,
    row_height: f32,
}

impl ImageOptimizer {
    /// Create an optimizer.
    ///
    /// When `enabled` is false (the host cannot track viewport entry)
    /// the optimizer leaves images untouched so they load eagerly.
    pub fn new(enabled: bool, viewport_height: f32) -> Self {
        Self {
            enabled,
            observer: ViewportObserver::new(viewport_height),
            row_height: ROW_HEIGHT,
        }
    }

    /// Whether lazy loading is active
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of images awaiting viewport entry
    pub fn pending(&self) -> usize {
        self.observer.observed_count()
    }

    /// Tag and observe the view's unloaded images.
    ///
    /// Images without a deferred source get their current source moved
    /// into the data attribute. Images already near the viewport are
    /// promoted immediately; the count of promotions is returned.
    pub fn optimize(&mut self, view: &mut PageView) -> usize {
        if !self.enabled {
            return 0;
        }
        let candidates = view
            .document()
            .find_all(|el| el.tag_name == "img" && !el.has_class(LOADED_CLASS));
        for (index, path) in candidates.iter().enumerate() {
            if let Some(el) = view.document_mut().node_at_mut(path).and_then(Node::as_element_mut) {
                if el.get_attribute(DATA_SRC_ATTR).is_none() {
                    let src = el.get_attribute("src").cloned().filter(|s| !s.is_empty());
                    if let Some(src) = src {
                        el.set_attribute(DATA_SRC_ATTR, src);
                        el.add_class(PRELOAD_CLASS);
                    }
                }
            }
            self.observer.observe(path.clone(), index as f32 * self.row_height);
        }
        self.sync_geometry(view);
        self.promote_entered(view)
    }

    /// React to a scroll, promoting images that came into view
    pub fn handle_scroll(&mut self, view: &mut PageView) -> usize {
        if !self.enabled {
            return 0;
        }
        self.sync_geometry(view);
        self.promote_entered(view)
    }

    /// Forget observed images, e.g. after the content region changed
    pub fn reset(&mut self) {
        self.observer.clear();
    }

    fn sync_geometry(&mut self, view: &PageView) {
        self.observer.update_viewport(view.viewport().height as f32);
        self.observer.update_scroll(view.scroll_y());
    }

    fn promote_entered(&mut self, view: &mut PageView) -> usize {
        let mut promoted = 0;
        for path in self.observer.take_entered() {
            if promote(view.document_mut(), &path) {
                promoted += 1;
            }
        }
        promoted
    }
}

/// Apply an image's deferred source and mark it loaded
fn promote(document: &mut Document, path: &[usize]) -> bool {
    let Some(el) = document.node_at_mut(path).and_then(Node::as_element_mut) else {
        return false;
    };
    let src = el
        .get_attribute(DATA_SRC_ATTR)
        .or_else(|| el.get_attribute("src"))
        .cloned()
        .filter(|s| !s.is_empty());
    let Some(src) = src else {
        return false;
    };
    el.set_attribute("src", src);
    el.add_class(LOADED_CLASS);
    el.add_class(PRELOAD_CLASS);
    true
}

/// Fetch and decode a batch of images concurrently.
///
/// Images already loaded in the cache are skipped; previous failures
/// are retried. Every outcome is recorded in the cache. Returns how
/// many images loaded successfully.
pub async fn preload_images<F: Fetcher>(
    fetcher: &F,
    urls: &[String],
    cache: &SharedImageCache,
) -> usize {
    let pending: Vec<&String> = urls
        .iter()
        .filter(|url| {
            !cache
                .lock()
                .map(|c| c.get(url).map(ImageEntry::is_loaded).unwrap_or(false))
                .unwrap_or(false)
        })
        .collect();

    let loads = pending.into_iter().map(|url| async move {
        let entry = load_one(fetcher, url).await;
        let loaded = entry.is_loaded();
        if let Ok(mut cache) = cache.lock() {
            cache.insert(url.as_str(), entry);
        }
        loaded
    });
    let loaded = join_all(loads).await.into_iter().filter(|ok| *ok).count();
    debug!("Preloaded {loaded} of {} images", urls.len());
    loaded
}

async fn load_one<F: Fetcher>(fetcher: &F, url: &str) -> ImageEntry {
    match fetcher.fetch(url).await {
        Ok(page) if page.is_success() => match image::load_from_memory(page.body()) {
            Ok(decoded) => {
                let (width, height) = decoded.dimensions();
                ImageEntry::Loaded { width, height }
            }
            Err(e) => ImageEntry::Failed(e.to_string()),
        },
        Ok(page) => ImageEntry::Failed(format!("status {}", page.status())),
        Err(e) => ImageEntry::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache;
    use crate::dom;
    use crate::net::FetchedPage;
    use crate::page::Viewport;
    use crate::utils::error::FetchError;
    use std::collections::HashMap;

    fn image_view(body: &str) -> PageView {
        let html = format!("<html><head><title>T</title></head><body>{body}</body></html>");
        PageView::new(dom::parse(&html).unwrap(), "/index.html")
    }

    fn img_attr(view: &PageView, nth: usize, attr: &str) -> Option<String> {
        let imgs = view.document().find_all(|el| el.tag_name == "img");
        view.document()
            .node_at(&imgs[nth])
            .and_then(Node::as_element)
            .and_then(|el| el.get_attribute(attr))
            .cloned()
    }

    #[test]
    fn test_optimize_tags_and_promotes_visible() {
        let mut view = image_view("<img src=\"a.png\"><img src=\"b.png\">");
        let mut optimizer = ImageOptimizer::new(true, 720.0);
        // both fit in the initial viewport band
        let promoted = optimizer.optimize(&mut view);
        assert_eq!(promoted, 2);
        assert_eq!(img_attr(&view, 0, "data-src").as_deref(), Some("a.png"));
        assert_eq!(img_attr(&view, 0, "src").as_deref(), Some("a.png"));
        assert_eq!(
            img_attr(&view, 0, "class").as_deref(),
            Some("preload-img loaded")
        );
    }

    #[test]
    fn test_far_images_wait_for_scroll() {
        let imgs: String = (0..10).map(|i| format!("<img src=\"{i}.png\">")).collect();
        let mut view = image_view(&imgs);
        view.set_viewport(Viewport {
            width: 1280,
            height: 400,
        });
        let mut optimizer = ImageOptimizer::new(true, 400.0);

        let promoted = optimizer.optimize(&mut view);
        // rows at 0..=400 plus the 50px margin: indexes 0, 1, 2
        assert_eq!(promoted, 3);
        assert_eq!(optimizer.pending(), 7);
        assert!(img_attr(&view, 5, "class").as_deref() == Some("preload-img"));

        view.set_scroll_y(1000.0);
        let promoted = optimizer.handle_scroll(&mut view);
        assert!(promoted > 0);
        assert_eq!(
            img_attr(&view, 5, "class").as_deref(),
            Some("preload-img loaded")
        );
    }

    #[test]
    fn test_loaded_images_are_skipped() {
        let mut view = image_view("<img class=\"loaded\" src=\"a.png\">");
        let mut optimizer = ImageOptimizer::new(true, 720.0);
        assert_eq!(optimizer.optimize(&mut view), 0);
        assert_eq!(img_attr(&view, 0, "data-src"), None);
    }

    #[test]
    fn test_disabled_optimizer_is_inert() {
        let mut view = image_view("<img src=\"a.png\">");
        let mut optimizer = ImageOptimizer::new(false, 720.0);
        assert_eq!(optimizer.optimize(&mut view), 0);
        assert_eq!(img_attr(&view, 0, "data-src"), None);
        assert_eq!(img_attr(&view, 0, "class"), None);
    }

    #[test]
    fn test_optimize_preserves_existing_data_src() {
        let mut view = image_view("<img data-src=\"real.png\" src=\"placeholder.png\">");
        let mut optimizer = ImageOptimizer::new(true, 720.0);
        optimizer.optimize(&mut view);
        assert_eq!(img_attr(&view, 0, "data-src").as_deref(), Some("real.png"));
        assert_eq!(img_attr(&view, 0, "src").as_deref(), Some("real.png"));
    }

    struct ImageFetcher {
        images: HashMap<String, Vec<u8>>,
    }

    impl Fetcher for ImageFetcher {
        async fn fetch(&self, path: &str) -> Result<FetchedPage, FetchError> {
            match self.images.get(path) {
                Some(bytes) => Ok(FetchedPage::new(200, bytes.clone())),
                None => Ok(FetchedPage::new(404, "")),
            }
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::new(width, height));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn test_preload_images_records_dimensions() {
        let fetcher = ImageFetcher {
            images: HashMap::from([("logo.png".to_string(), png_bytes(4, 2))]),
        };
        let cache = cache::shared();
        let urls = vec!["logo.png".to_string()];

        assert_eq!(preload_images(&fetcher, &urls, &cache).await, 1);
        let cache = cache.lock().unwrap();
        assert_eq!(
            cache.get("logo.png"),
            Some(&ImageEntry::Loaded {
                width: 4,
                height: 2
            })
        );
    }

    #[tokio::test]
    async fn test_preload_images_skips_loaded_and_retries_failed() {
        let fetcher = ImageFetcher {
            images: HashMap::from([
                ("a.png".to_string(), png_bytes(1, 1)),
                ("b.png".to_string(), png_bytes(1, 1)),
            ]),
        };
        let cache = cache::shared();
        {
            let mut cache = cache.lock().unwrap();
            cache.insert("a.png", ImageEntry::Loaded { width: 1, height: 1 });
            cache.insert("b.png", ImageEntry::Failed("timeout".to_string()));
        }
        let urls = vec!["a.png".to_string(), "b.png".to_string()];

        // only the failed entry is retried
        assert_eq!(preload_images(&fetcher, &urls, &cache).await, 1);
        assert!(cache.lock().unwrap().get("b.png").unwrap().is_loaded());
    }

    #[tokio::test]
    async fn test_preload_images_records_failures() {
        let fetcher = ImageFetcher {
            images: HashMap::new(),
        };
        let cache = cache::shared();
        let urls = vec!["missing.png".to_string()];

        assert_eq!(preload_images(&fetcher, &urls, &cache).await, 0);
        assert_eq!(
            cache.lock().unwrap().get("missing.png"),
            Some(&ImageEntry::Failed("status 404".to_string()))
        );
    }
}
