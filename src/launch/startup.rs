use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Variable d'environnement portant la notification de démarrage sérialisée.
///
/// C'est la file de messages par défaut du nouveau process: son contenu n'est
/// lisible que par lui, exactement une fois, au démarrage.
pub const STARTUP_ENV: &str = "WHDAUTOLOAD_STARTUP";
/// Variable d'environnement portant le répertoire home dupliqué.
pub const HOME_DIR_ENV: &str = "WHDAUTOLOAD_HOME_DIR";
/// Variable d'environnement portant le hint de taille de pile (0 = défaut système).
pub const STACK_SIZE_ENV: &str = "WHDAUTOLOAD_STACK_SIZE";

/// Slot d'argument de la notification: un couple (répertoire, nom).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartupArg {
    /// Répertoire détenant l'objet désigné.
    pub dir: String,
    /// Nom de l'objet dans ce répertoire.
    pub name: String,
}

/// Notification de démarrage remise au process créé, comme si le descripteur
/// de projet avait été ouvert depuis un shell graphique.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartupMessage {
    /// Jeton identifiant ce message précis; la réponse doit le citer.
    pub token: String,
    /// Adresse du canal de réponse du lanceur.
    pub reply_to: String,
    /// Chemin de l'image consommée par le process.
    pub image: String,
    /// Slot 0: répertoire et nom du loader; slot 1: répertoire de travail
    /// d'origine et nom du projet retenu.
    pub args: Vec<StartupArg>,
}

impl StartupMessage {
    /// Construit la notification et fixe son identité.
    pub fn new(reply_to: String, image: String, args: Vec<StartupArg>) -> Self {
        let token = message_token(&image);
        Self {
            token,
            reply_to,
            image,
            args,
        }
    }
}

/// Jeton d'identité: empreinte du pid, de l'horloge, d'un compteur de
/// messages et de l'image lancée.
fn message_token(image: &str) -> String {
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let clock = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or(0);
    format!(
        "{:x}",
        md5::compute(format!("{}:{}:{}:{}", process::id(), clock, sequence, image))
    )
}
