/// Utilitaires transverses de manipulation de chemins de handler.
pub mod path;
/// Utilitaires transverses de configuration de process externes.
pub mod process;
