mod diagnostics;
mod resolver;

pub use diagnostics::{ImageResolutionAttempt, ImageResolveError};
pub use resolver::{
    resolve_loader, DirLock, LoadedImage, OwnedDirLock, ResolvedLoader, FALLBACK_DIR,
};
