//! Core infrastructure module for foldwise.
//!
//! - [`types`]: keys, fold identifiers, targets and predictions
//! - [`constants`]: defaults and fixed column names
//! - [`error`]: the crate error type
//! - [`traits`]: model and metric capabilities

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

pub use constants::*;
pub use error::{FoldwiseError, Result};
pub use traits::*;
pub use types::*;

use std::sync::atomic::{AtomicBool, Ordering};

static CORE_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize logging for the library.
///
/// Installs `env_logger` with an `info` default filter unless `RUST_LOG`
/// says otherwise. Calling it again, or after the host application installed
/// its own logger, is harmless.
pub fn initialize_core() -> Result<()> {
    if CORE_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("A logger was already installed; keeping it");
    }

    log::info!("foldwise {} initialized", FOLDWISE_VERSION);
    Ok(())
}

/// Check whether [`initialize_core`] has run.
pub fn is_core_initialized() -> bool {
    CORE_INITIALIZED.load(Ordering::SeqCst)
}
