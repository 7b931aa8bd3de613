//! Pair minimal du protocole de démarrage, côté loader.
//!
//! Le stub consomme la notification reçue dans son environnement de
//! démarrage puis l'accuse en citant son jeton sur le canal de réponse du
//! lanceur. Si `WHDLOAD_STUB_DUMP` est défini, il y dépose d'abord ce qu'il
//! a observé, pour les tests d'intégration.

use std::env;
use std::fs;
use std::io::Write;
use std::net::TcpStream;
use std::process::ExitCode;

use whdautoload::launch::{StartupMessage, HOME_DIR_ENV, STACK_SIZE_ENV, STARTUP_ENV};

const DUMP_ENV: &str = "WHDLOAD_STUB_DUMP";

fn main() -> ExitCode {
    let Ok(raw) = env::var(STARTUP_ENV) else {
        return ExitCode::FAILURE;
    };
    let Ok(message) = serde_json::from_str::<StartupMessage>(&raw) else {
        return ExitCode::FAILURE;
    };

    if let Ok(dump_path) = env::var(DUMP_ENV) {
        let record = serde_json::json!({
            "startup": &message,
            "home_dir": env::var(HOME_DIR_ENV).ok(),
            "stack_size": env::var(STACK_SIZE_ENV).ok(),
            "current_dir": env::current_dir()
                .ok()
                .map(|dir| dir.display().to_string()),
        });
        if fs::write(&dump_path, record.to_string()).is_err() {
            return ExitCode::FAILURE;
        }
    }

    let Ok(mut stream) = TcpStream::connect(&message.reply_to) else {
        return ExitCode::FAILURE;
    };
    if writeln!(stream, "{}", message.token).is_err() {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
