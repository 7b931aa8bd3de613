//! Entrée CLI du lanceur.

use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    match whdautoload::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Exactement une erreur fatale, décodée pour l'utilisateur.
            log::debug!("fatal error code: {}", err.code);
            println!("{}", err.details);
            ExitCode::FAILURE
        }
    }
}
