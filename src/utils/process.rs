use std::process::{Command, Stdio};

/// Configure la commande pour éviter l'ouverture d'une fenêtre console sur Windows.
pub fn configure_command_no_window(cmd: &mut Command) {
    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
}

/// Supprime l'héritage des entrées/sorties standard: le process créé doit
/// établir les siennes.
pub fn suppress_standard_io(cmd: &mut Command) {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
}

/// Démarre le process hors du répertoire courant du lanceur; il n'hérite
/// d'aucun répertoire de travail significatif.
pub fn suppress_current_dir(cmd: &mut Command) {
    #[cfg(target_os = "windows")]
    {
        cmd.current_dir("C:\\");
    }
    #[cfg(not(target_os = "windows"))]
    {
        cmd.current_dir("/");
    }
}
