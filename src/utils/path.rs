/// Suffixe fixe des descripteurs d'icône.
pub const INFO_SUFFIX: &str = ".info";

/// Retire le suffixe descripteur d'un nom de fichier, s'il est présent.
///
/// La comparaison est exacte: `Game.INFO` n'est pas un descripteur.
pub fn strip_info_suffix(file_name: &str) -> Option<&str> {
    file_name.strip_suffix(INFO_SUFFIX)
}

/// Retourne le composant final d'un chemin de handler AmigaOS.
///
/// Les séparateurs reconnus sont `/` et `:` (syntaxe volume), si bien que
/// `Work:WHDLoad/WHDLoad`, `C:WHDLoad` et `whdload` donnent tous le même
/// composant final.
pub fn handler_leaf(handler: &str) -> &str {
    match handler.rfind(['/', ':']) {
        Some(separator) => &handler[separator + 1..],
        None => handler,
    }
}

/// Compare le composant final d'un chemin de handler au nom du loader,
/// sans tenir compte de la casse.
pub fn handler_names_loader(handler: &str, loader_name: &str) -> bool {
    handler_leaf(handler).eq_ignore_ascii_case(loader_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_descriptor_suffix() {
        assert_eq!(strip_info_suffix("Game.info"), Some("Game"));
        assert_eq!(strip_info_suffix(".info"), Some(""));
        assert_eq!(strip_info_suffix("Game.INFO"), None);
        assert_eq!(strip_info_suffix("Game"), None);
    }

    #[test]
    fn extracts_handler_leaf_across_separators() {
        assert_eq!(handler_leaf("Work:WHDLoad/WHDLoad"), "WHDLoad");
        assert_eq!(handler_leaf("C:WHDLoad"), "WHDLoad");
        assert_eq!(handler_leaf("whdload"), "whdload");
        assert_eq!(handler_leaf("Games/Demo/"), "");
    }

    #[test]
    fn matches_loader_name_case_insensitively() {
        assert!(handler_names_loader("Work:WHDLoad/whdload", "WHDLoad"));
        assert!(handler_names_loader("WHDLOAD", "WHDLoad"));
        assert!(!handler_names_loader("Work:WHDLoad/WHDLoad.slave", "WHDLoad"));
        assert!(!handler_names_loader("Work:WHDLoad/", "WHDLoad"));
    }
}
