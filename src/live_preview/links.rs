//! Link patching for assembled regions.
//!
//! Live preview must not navigate in place when a link inside a region is
//! clicked. External links lose their `href` and open through the system
//! handler instead; internal links only lose their `href`.

use log::{debug, warn};

use crate::dom::{Element, Listener};
use crate::error::{Error, Result};
use crate::markdown::{EXTERNAL_LINK_CLASS, INTERNAL_LINK_CLASS};

/// Opens link targets outside the document.
pub trait ExternalOpener {
    fn open(&self, target: &str) -> Result<()>;
}

/// Opens targets with the platform's default handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl ExternalOpener for SystemOpener {
    fn open(&self, target: &str) -> Result<()> {
        open::that(target).map_err(|source| Error::OpenExternal {
            target: target.to_string(),
            source,
        })
    }
}

/// Rewrite every link below `root`. Returns how many elements changed.
///
/// Running it again changes nothing: only links that still carry an `href`
/// are touched.
pub fn patch_external_links(root: &mut Element) -> usize {
    let mut patched = 0;
    root.walk_mut(&mut |el| {
        if el.has_class(EXTERNAL_LINK_CLASS) {
            if let Some(target) = el.remove_attr("href") {
                el.add_listener(Listener::OpenExternal { target });
                patched += 1;
            }
        } else if el.has_class(INTERNAL_LINK_CLASS) && el.remove_attr("href").is_some() {
            patched += 1;
        }
    });
    debug!("Patched {} links", patched);
    patched
}

/// Run the click listeners attached to `element`. Returns whether any ran.
pub fn dispatch_click(element: &Element, opener: &dyn ExternalOpener) -> bool {
    for listener in element.listeners() {
        match listener {
            Listener::OpenExternal { target } => {
                if let Err(e) = opener.open(target) {
                    warn!("{}", e);
                }
            }
        }
    }
    !element.listeners().is_empty()
}
