use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::path::INFO_SUFFIX;

mod disk_object;

pub use disk_object::{DiskObject, IconType};

#[cfg(test)]
pub(crate) use disk_object::encode;

/// Charge le descripteur d'icône associé à `base_path`.
///
/// Le fichier lu est `base_path` suivi du suffixe descripteur, comme le fait
/// icon.library avec un nom de base. Un descripteur absent ou inexploitable
/// donne `None`: l'appelant traite ces cas comme de simples non-candidats.
pub fn load_icon(base_path: &Path) -> Option<DiskObject> {
    let mut icon_os = base_path.as_os_str().to_os_string();
    icon_os.push(INFO_SUFFIX);
    let icon_path = PathBuf::from(icon_os);

    let bytes = match fs::read(&icon_path) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::debug!("no descriptor at {}: {}", icon_path.display(), err);
            return None;
        }
    };
    match disk_object::parse(&bytes) {
        Ok(icon) => Some(icon),
        Err(reason) => {
            log::debug!("malformed descriptor {}: {}", icon_path.display(), reason);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::disk_object::encode::{icon_bytes, IconSpec};
    use super::*;

    #[test]
    fn loads_icon_next_to_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("Game");
        std::fs::write(
            dir.path().join("Game.info"),
            icon_bytes(&IconSpec {
                default_tool: Some("WHDLoad"),
                stack_size: 4096,
                ..IconSpec::default()
            }),
        )
        .unwrap();

        let icon = load_icon(&base).unwrap();
        assert_eq!(icon.stack_size, 4096);
    }

    #[test]
    fn missing_or_malformed_icon_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_icon(&dir.path().join("Game")).is_none());

        std::fs::write(dir.path().join("Broken.info"), b"not an icon").unwrap();
        assert!(load_icon(&dir.path().join("Broken")).is_none());
    }
}
