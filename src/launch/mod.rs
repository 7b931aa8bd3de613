//! Création du process loader et handshake de démarrage.
//!
//! Le lanceur rejoue pour le loader l'ouverture du descripteur de projet
//! depuis un shell graphique: la notification de démarrage part avec le
//! process, et l'outil ne rend la main qu'une fois cette notification
//! précise revenue sur son canal de réponse.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use crate::binaries::{DirLock, LoadedImage};
use crate::scan::ProjectMatch;
use crate::utils::process::{
    configure_command_no_window, suppress_current_dir, suppress_standard_io,
};

mod startup;

pub use startup::{StartupArg, StartupMessage, HOME_DIR_ENV, STACK_SIZE_ENV, STARTUP_ENV};

/// Erreur structurée de lancement du loader.
#[derive(Debug)]
pub(crate) struct LaunchError {
    /// Code d'erreur stable côté application.
    pub code: &'static str,
    /// Message de diagnostic principal.
    pub details: String,
}

/// Canal de réponse privé du lanceur.
struct ReplyChannel {
    listener: TcpListener,
    address: String,
}

impl ReplyChannel {
    /// Ouvre le canal sur une adresse de bouclage éphémère.
    fn open() -> io::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0))?;
        let address = listener.local_addr()?.to_string();
        Ok(Self { listener, address })
    }

    /// Adresse à citer comme destination de réponse.
    fn address(&self) -> &str {
        &self.address
    }

    /// Bloque, sans timeout, jusqu'à la réponse citant `token`.
    ///
    /// Toute autre ligne reçue sur le canal est écartée et l'attente reprend.
    fn await_reply(&self, token: &str) -> io::Result<()> {
        loop {
            let (stream, _) = self.listener.accept()?;
            let mut line = String::new();
            if BufReader::new(stream).read_line(&mut line).is_err() {
                continue;
            }
            if line.trim_end_matches(['\r', '\n']) == token {
                return Ok(());
            }
            log::debug!("discarded a reply that does not match the startup message");
        }
    }
}

/// Duplicata du verrou du répertoire de travail, remis au process créé
/// comme contexte home.
///
/// L'ouverture est fraîche: sa durée de vie est indépendante du verrou
/// sous lequel le scan s'est déroulé.
#[derive(Debug)]
struct HomeDir {
    path: PathBuf,
    #[cfg(unix)]
    _handle: File,
}

impl HomeDir {
    /// Duplique le verrou sur `working_dir`.
    fn duplicate(working_dir: &Path) -> io::Result<Self> {
        let path = working_dir.canonicalize()?;
        #[cfg(unix)]
        {
            let handle = File::open(&path)?;
            Ok(Self {
                path,
                _handle: handle,
            })
        }
        #[cfg(not(unix))]
        {
            Ok(Self { path })
        }
    }

    /// Chemin du répertoire dupliqué.
    fn path(&self) -> &Path {
        &self.path
    }
}

/// Démarre le loader et attend son accusé de réception.
///
/// Slot d'argument 0: le répertoire d'où provient l'image et le nom du
/// loader; slot 1: le répertoire de travail d'origine et le nom du projet
/// retenu. L'image est consommée: après création du process elle ne peut
/// plus être libérée localement.
pub(crate) fn start_loader(
    image: LoadedImage,
    loader_dir: &DirLock,
    loader_name: &str,
    project: &ProjectMatch,
    working_dir: &Path,
) -> Result<(), LaunchError> {
    let reply = ReplyChannel::open().map_err(|err| LaunchError {
        code: "REPLY_PORT_FAILED",
        details: format!("Failed to create reply channel: {}", err),
    })?;

    let home_dir = HomeDir::duplicate(working_dir).map_err(|err| LaunchError {
        code: "LOCK_FAILED",
        details: format!("Failed to duplicate home directory lock: {}", err),
    })?;

    let message = StartupMessage::new(
        reply.address().to_string(),
        image.path().display().to_string(),
        vec![
            StartupArg {
                dir: loader_dir.path().display().to_string(),
                name: loader_name.to_string(),
            },
            StartupArg {
                dir: working_dir.display().to_string(),
                name: project.file_name.clone(),
            },
        ],
    );

    let child = spawn_loader(image, loader_name, &home_dir, project.stack_size, &message)?;
    log::info!("{} started as process {}", loader_name, child.id());

    // Point de synchronisation: une fois la notification revenue, le nouveau
    // process a pris possession des informations d'argument et les verrous
    // du lanceur peuvent être relâchés.
    reply.await_reply(&message.token).map_err(|err| LaunchError {
        code: "REPLY_PORT_FAILED",
        details: format!("Failed to receive startup acknowledgment: {}", err),
    })
}

/// Crée le process du loader, la notification de démarrage dans son
/// environnement.
fn spawn_loader(
    image: LoadedImage,
    display_name: &str,
    home_dir: &HomeDir,
    stack_size: u32,
    message: &StartupMessage,
) -> Result<Child, LaunchError> {
    let serialized = serde_json::to_string(message).map_err(|err| LaunchError {
        code: "SPAWN_FAILED",
        details: format!("Failed to encode startup message: {}", err),
    })?;

    let mut cmd = Command::new(image.path());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.arg0(display_name);
    }
    cmd.env(STARTUP_ENV, serialized)
        .env(HOME_DIR_ENV, home_dir.path())
        .env(STACK_SIZE_ENV, stack_size.to_string());
    configure_command_no_window(&mut cmd);
    suppress_standard_io(&mut cmd);
    suppress_current_dir(&mut cmd);

    match cmd.spawn() {
        Ok(child) => {
            // Transfert effectif: le handle local se ferme ici, l'image
            // appartient désormais au nouveau process.
            drop(image);
            Ok(child)
        }
        Err(err) => Err(LaunchError {
            code: "SPAWN_FAILED",
            details: format!("Failed to launch {}: {}", display_name, err),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::net::TcpStream;
    use std::thread;

    use super::*;

    #[test]
    fn reply_wait_discards_unrelated_messages() {
        let reply = ReplyChannel::open().unwrap();
        let address = reply.address().to_string();

        let peer = thread::spawn(move || {
            let mut stream = TcpStream::connect(&address).unwrap();
            writeln!(stream, "une-autre-notification").unwrap();
            drop(stream);
            let mut stream = TcpStream::connect(&address).unwrap();
            writeln!(stream, "jeton-attendu").unwrap();
        });

        reply.await_reply("jeton-attendu").unwrap();
        peer.join().unwrap();
    }

    #[test]
    fn duplicated_home_dir_is_a_fresh_canonical_open() {
        let dir = tempfile::tempdir().unwrap();
        let home = HomeDir::duplicate(dir.path()).unwrap();
        assert_eq!(home.path(), dir.path().canonicalize().unwrap());

        let gone = dir.path().join("gone");
        assert!(HomeDir::duplicate(&gone).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn spawn_hands_over_the_startup_environment() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let seen = dir.path().join("seen");
        let image_path = dir.path().join("WHDLoad");
        fs::write(
            &image_path,
            format!(
                "#!/bin/sh\nprintf '%s\\n%s\\n%s\\n' \"$WHDAUTOLOAD_STACK_SIZE\" \
                 \"$WHDAUTOLOAD_HOME_DIR\" \"$PWD\" > {}\n",
                seen.display()
            ),
        )
        .unwrap();
        fs::set_permissions(&image_path, fs::Permissions::from_mode(0o755)).unwrap();

        let resolved = crate::binaries::resolve_loader(
            &[dir.path().to_path_buf()],
            &dir.path().join("absent"),
            "WHDLoad",
            4096,
        )
        .unwrap();
        let home_dir = HomeDir::duplicate(dir.path()).unwrap();
        let message = StartupMessage::new(
            "127.0.0.1:9".to_string(),
            image_path.display().to_string(),
            Vec::new(),
        );

        let mut child =
            spawn_loader(resolved.image, "WHDLoad", &home_dir, 8000, &message).unwrap();
        assert!(child.wait().unwrap().success());

        let lines: Vec<String> = fs::read_to_string(&seen)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        assert_eq!(lines[0], "8000");
        assert_eq!(lines[1], home_dir.path().display().to_string());
        // Le répertoire courant du lanceur n'est pas hérité.
        assert_eq!(lines[2], "/");
    }
}
