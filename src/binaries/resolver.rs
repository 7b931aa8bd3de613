use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use super::diagnostics::{ImageResolutionAttempt, ImageResolveError};

/// Emplacement système fixe tenté après épuisement du search path.
#[cfg(target_os = "windows")]
pub const FALLBACK_DIR: &str = "C:\\WHDLoad";
#[cfg(not(target_os = "windows"))]
pub const FALLBACK_DIR: &str = "/usr/local/lib/whdload";

/// Image exécutable chargée pour le compte du futur process.
///
/// La valeur est consommée par le lancement: une fois l'image transférée au
/// nouveau process, aucune libération locale n'est plus possible.
#[derive(Debug)]
pub struct LoadedImage {
    path: PathBuf,
    _file: File,
}

impl LoadedImage {
    /// Chemin de l'image sur disque.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Verrou sur le répertoire d'où provient l'image résolue.
#[derive(Debug)]
pub enum DirLock {
    /// Emprunté à la structure du search path; jamais libéré par l'outil.
    Borrowed(PathBuf),
    /// Acquis par l'outil sur l'emplacement de repli; libéré en fin de scope.
    Owned(OwnedDirLock),
}

impl DirLock {
    /// Chemin du répertoire verrouillé.
    pub fn path(&self) -> &Path {
        match self {
            Self::Borrowed(path) => path,
            Self::Owned(lock) => lock.path(),
        }
    }

    /// Vrai si le verrou appartient à l'outil.
    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }
}

/// Verrou de répertoire détenu par l'outil.
#[derive(Debug)]
pub struct OwnedDirLock {
    path: PathBuf,
    #[cfg(unix)]
    _handle: File,
}

impl OwnedDirLock {
    /// Acquiert un verrou frais sur `path`.
    pub fn acquire(path: &Path) -> io::Result<Self> {
        #[cfg(unix)]
        {
            let handle = File::open(path)?;
            Ok(Self {
                path: path.to_path_buf(),
                _handle: handle,
            })
        }
        #[cfg(not(unix))]
        {
            if !fs::metadata(path)?.is_dir() {
                return Err(io::Error::new(io::ErrorKind::Other, "not a directory"));
            }
            Ok(Self {
                path: path.to_path_buf(),
            })
        }
    }

    /// Chemin du répertoire verrouillé.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for OwnedDirLock {
    fn drop(&mut self) {
        log::debug!("released directory lock on {}", self.path.display());
    }
}

/// Résultat de résolution: l'image chargée et le verrou du répertoire d'origine.
#[derive(Debug)]
pub struct ResolvedLoader {
    pub image: LoadedImage,
    pub dir_lock: DirLock,
}

/// Résout l'image du loader le long du search path puis, à défaut, sur
/// l'emplacement de repli.
///
/// Les entrées du search path dont le chemin candidat dépasse
/// `max_candidate_len` sont sautées silencieusement, comme celles dont la
/// résolution échoue. Le verrou restitué est emprunté pour une entrée du
/// search path et détenu pour l'emplacement de repli.
pub fn resolve_loader(
    search_path: &[PathBuf],
    fallback_dir: &Path,
    loader_name: &str,
    max_candidate_len: usize,
) -> Result<ResolvedLoader, ImageResolveError> {
    resolve_with_attempts(search_path, fallback_dir, loader_name, max_candidate_len)
        .map(|(resolved, attempts)| {
            log::debug!(
                "resolved {} at {} after {} attempt(s)",
                loader_name,
                resolved.image.path().display(),
                attempts.len()
            );
            resolved
        })
}

/// Variante interne conservant l'historique des tentatives.
fn resolve_with_attempts(
    search_path: &[PathBuf],
    fallback_dir: &Path,
    loader_name: &str,
    max_candidate_len: usize,
) -> Result<(ResolvedLoader, Vec<ImageResolutionAttempt>), ImageResolveError> {
    let mut attempts = Vec::new();

    for entry in search_path {
        let Some(entry_str) = entry.to_str() else {
            attempts.push(ImageResolutionAttempt {
                candidate: entry.to_string_lossy().to_string(),
                source: "search_path",
                outcome: "unresolvable",
                detail: None,
            });
            continue;
        };
        // La place du séparateur et du nom du loader doit rester disponible.
        if entry_str.len() + 1 + loader_name.len() > max_candidate_len {
            attempts.push(ImageResolutionAttempt {
                candidate: entry_str.to_string(),
                source: "search_path",
                outcome: "truncated",
                detail: None,
            });
            continue;
        }

        let candidate = entry.join(loader_name);
        match load_image(&candidate) {
            Ok(image) => {
                attempts.push(ImageResolutionAttempt {
                    candidate: candidate.to_string_lossy().to_string(),
                    source: "search_path",
                    outcome: "ok",
                    detail: None,
                });
                let resolved = ResolvedLoader {
                    image,
                    dir_lock: DirLock::Borrowed(entry.clone()),
                };
                return Ok((resolved, attempts));
            }
            Err((outcome, detail)) => {
                attempts.push(ImageResolutionAttempt {
                    candidate: candidate.to_string_lossy().to_string(),
                    source: "search_path",
                    outcome,
                    detail: Some(detail),
                });
            }
        }
    }

    let candidate = fallback_dir.join(loader_name);
    match load_image(&candidate) {
        Ok(image) => {
            attempts.push(ImageResolutionAttempt {
                candidate: candidate.to_string_lossy().to_string(),
                source: "fallback",
                outcome: "ok",
                detail: None,
            });
            // Le chargement a réussi ailleurs que sur le search path: le
            // verrou du répertoire de repli est acquis par l'outil, et son
            // échec est une erreur distincte du "non trouvé".
            match OwnedDirLock::acquire(fallback_dir) {
                Ok(lock) => {
                    let resolved = ResolvedLoader {
                        image,
                        dir_lock: DirLock::Owned(lock),
                    };
                    Ok((resolved, attempts))
                }
                Err(err) => Err(ImageResolveError {
                    code: "FALLBACK_LOCK_FAILED",
                    details: format!("Failed to lock {}: {}", fallback_dir.display(), err),
                    attempts,
                }),
            }
        }
        Err((outcome, detail)) => {
            attempts.push(ImageResolutionAttempt {
                candidate: candidate.to_string_lossy().to_string(),
                source: "fallback",
                outcome,
                detail: Some(detail),
            });
            Err(ImageResolveError {
                code: "LOADER_NOT_FOUND",
                details: format!("Can't find {}", loader_name),
                attempts,
            })
        }
    }
}

/// Tente de charger une image exécutable depuis `path`.
fn load_image(path: &Path) -> Result<LoadedImage, (&'static str, String)> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(("missing", "no image at this location".to_string()))
        }
        Err(err) => return Err(("unreadable", err.to_string())),
    };
    if !metadata.is_file() {
        return Err(("missing", "not a regular file".to_string()));
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(("not_executable", "image has no execute permission".to_string()));
        }
    }
    match File::open(path) {
        Ok(file) => Ok(LoadedImage {
            path: path.to_path_buf(),
            _file: file,
        }),
        Err(err) => Err(("unreadable", err.to_string())),
    }
}
