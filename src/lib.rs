#![doc(test(attr(deny(warnings))))]

//! SL NIC Bridge form engine: multi-step form state, field validation, file
//! uploads and signature capture, assembled into a single submission payload.

pub mod cli;
pub mod config;
pub mod errors;
pub mod files;
pub mod form;
pub mod signature;
pub mod utils;
pub mod validation;

pub use errors::{FormError, FormResult};
pub use form::{FormConfig, FormController, FormState};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("SL NIC Bridge tracing initialized.");
    });
}
