use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::icons::{self, DiskObject, IconType};
use crate::utils::path::{handler_names_loader, strip_info_suffix};

/// Projet retenu par le scan: le nom de base du descripteur et son hint de pile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectMatch {
    /// Nom du fichier projet, sans le suffixe descripteur.
    pub file_name: String,
    /// Hint de taille de pile du descripteur; 0 signifie la valeur système.
    pub stack_size: u32,
}

/// Erreur fatale d'énumération du répertoire de travail.
#[derive(Debug)]
pub struct ScanError {
    /// Étape d'énumération en échec.
    pub context: &'static str,
    /// Erreur OS sous-jacente.
    pub source: io::Error,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.source)
    }
}

/// Cherche dans `dir` le premier descripteur de projet dont le handler par
/// défaut désigne le loader.
///
/// L'énumération est à sens unique et s'arrête sur le premier candidat
/// satisfaisant; `None` signifie qu'aucune entrée ne satisfait l'heuristique.
pub fn find_project(dir: &Path, loader_name: &str) -> Result<Option<ProjectMatch>, ScanError> {
    find_project_with(dir, loader_name, icons::load_icon)
}

/// Variante paramétrée par le chargeur de descripteurs.
///
/// Le paramètre permet d'instrumenter les chargements en test; la production
/// passe [`icons::load_icon`].
pub fn find_project_with(
    dir: &Path,
    loader_name: &str,
    mut load_icon: impl FnMut(&Path) -> Option<DiskObject>,
) -> Result<Option<ProjectMatch>, ScanError> {
    let entries = fs::read_dir(dir).map_err(|source| ScanError {
        context: "Failed to examine current working directory",
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| ScanError {
            context: "Failed to examine item in working directory",
            source,
        })?;
        let file_type = entry.file_type().map_err(|source| ScanError {
            context: "Failed to examine item in working directory",
            source,
        })?;
        if !file_type.is_file() {
            continue;
        }

        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(base_name) = strip_info_suffix(name) else {
            continue;
        };

        // Un descripteur absent ou inexploitable n'est pas une erreur: le
        // scan est une heuristique best-effort sur le contenu du répertoire.
        let Some(icon) = load_icon(&dir.join(base_name)) else {
            continue;
        };
        if icon.icon_type != IconType::Project {
            continue;
        }
        let Some(default_tool) = icon.default_tool.as_deref() else {
            continue;
        };
        if default_tool.is_empty() || !handler_names_loader(default_tool, loader_name) {
            continue;
        }

        if !icon.tool_types.is_empty() {
            log::debug!(
                "project {:?} carries {} tool types",
                base_name,
                icon.tool_types.len()
            );
        }
        return Ok(Some(ProjectMatch {
            file_name: base_name.to_string(),
            stack_size: icon.stack_size,
        }));
    }

    Ok(None)
}
