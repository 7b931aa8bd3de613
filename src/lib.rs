//! Lanceur WHDAutoload: retrouve dans le répertoire de travail le descripteur
//! de projet qui désigne WHDLoad comme handler, résout l'image du loader le
//! long du search path puis le démarre comme si le descripteur avait été
//! ouvert depuis un shell graphique.
//!
//! Cette unité reste volontairement mince: elle déclare les modules de
//! domaine puis délègue l'exécution à `app::run()`.

mod app;
mod binaries;
mod icons;
mod scan;
mod utils;

/// Protocole de démarrage, partagé avec le pair côté loader.
pub mod launch;

pub use app::{run, FatalError, LOADER_NAME};
