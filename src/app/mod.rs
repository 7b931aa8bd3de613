//! Orchestration du pipeline: scan du répertoire courant, résolution de
//! l'image du loader, lancement et handshake de démarrage.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::binaries::{self, FALLBACK_DIR};
use crate::launch;
use crate::scan;

/// Nom fixe du programme loader recherché puis lancé.
pub const LOADER_NAME: &str = "WHDLoad";

/// Taille maximale d'un chemin candidat pendant la résolution d'image.
const MAX_CANDIDATE_LEN: usize = 4096;

/// Erreur fatale: le pipeline s'arrête et l'outil sort avec le statut 1.
#[derive(Debug)]
pub struct FatalError {
    /// Code d'erreur stable côté application.
    pub code: &'static str,
    /// Message destiné à l'utilisateur.
    pub details: String,
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.details)
    }
}

/// Déroule le pipeline complet; ne rend la main qu'une fois l'accusé de
/// réception du loader reçu.
pub fn run() -> Result<(), FatalError> {
    let working_dir = env::current_dir().map_err(|err| FatalError {
        code: "SCAN_FAILED",
        details: format!("Failed to examine current working directory: {}", err),
    })?;

    let project = scan::find_project(&working_dir, LOADER_NAME)
        .map_err(|err| FatalError {
            code: "SCAN_FAILED",
            details: err.to_string(),
        })?
        .ok_or_else(|| FatalError {
            code: "PROJECT_NOT_FOUND",
            details: format!("Can't find an icon that runs {} here", LOADER_NAME),
        })?;
    log::info!(
        "selected project {:?} (stack size {})",
        project.file_name,
        project.stack_size
    );

    // La résolution d'un nom de programme nu suppose un search path, que
    // seul un contexte de commande interactif possède.
    let search_path = command_search_path().ok_or_else(|| FatalError {
        code: "CONTEXT_REQUIRED",
        details: "WHDAutoload must be run from a command shell".to_string(),
    })?;

    let resolved = binaries::resolve_loader(
        &search_path,
        Path::new(FALLBACK_DIR),
        LOADER_NAME,
        MAX_CANDIDATE_LEN,
    )
    .map_err(|err| {
        if let Ok(attempts) = serde_json::to_string(&err.attempts) {
            log::debug!("image resolution attempts: {}", attempts);
        }
        FatalError {
            code: err.code,
            details: err.details,
        }
    })?;

    // Le verrou de repli éventuel ne se libère qu'au retour, après le
    // handshake.
    launch::start_loader(
        resolved.image,
        &resolved.dir_lock,
        LOADER_NAME,
        &project,
        &working_dir,
    )
    .map_err(|err| FatalError {
        code: err.code,
        details: err.details,
    })
}

/// Search path du contexte de commande invoquant; `None` hors d'un tel
/// contexte.
fn command_search_path() -> Option<Vec<PathBuf>> {
    split_search_path(env::var_os("PATH"))
}

fn split_search_path(raw: Option<OsString>) -> Option<Vec<PathBuf>> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    Some(env::split_paths(&raw).collect())
}
