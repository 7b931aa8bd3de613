/// Décrit une tentative de chargement de l'image du loader.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ImageResolutionAttempt {
    /// Chemin candidat tenté.
    pub candidate: String,
    /// Source de la tentative (entrée du search path ou emplacement de repli).
    pub source: &'static str,
    /// Résultat de la tentative.
    pub outcome: &'static str,
    /// Détail éventuel en cas d'échec.
    pub detail: Option<String>,
}

/// Erreur structurée de résolution de l'image du loader.
#[derive(Debug)]
pub struct ImageResolveError {
    /// Code d'erreur stable côté application.
    pub code: &'static str,
    /// Message de diagnostic principal.
    pub details: String,
    /// Historique complet des tentatives.
    pub attempts: Vec<ImageResolutionAttempt>,
}
