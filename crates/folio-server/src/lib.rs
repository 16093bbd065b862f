//! # Folio Server
//!
//! Backend for the portfolio site.
//!
//! This crate provides:
//! - Contact form relay over SMTP (`contact`, `mailer`)
//! - In-memory visit counters (`analytics`)
//! - The HTTP router (`routes`)
//! - Server configuration (`config`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod analytics;
pub mod config;
pub mod contact;
pub mod mailer;
pub mod routes;


use std::sync::Arc;

use tracing::{info, warn};

use crate::analytics::{Clock, VisitCounters};
use crate::config::FolioConfig;
use crate::contact::ContactRelay;
use crate::mailer::{LogMailer, Mailer, SmtpMailer, EMAIL_USER_ENV};
use crate::routes::AppState;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::analytics::*;
    pub use crate::config::*;
    pub use crate::contact::*;
    pub use crate::mailer::*;
    pub use crate::routes::*;
}

/// Picks the mail transport for `config`.
///
/// SMTP when a relay is configured and credentials are present, otherwise
/// mails are only logged.
pub fn build_mailer(config: &FolioConfig) -> Arc<dyn Mailer> {
    let Some(relay) = config.smtp_relay.as_deref() else {
        info!("No SMTP relay configured, contact mails will be logged");
        return Arc::new(LogMailer);
    };
    match SmtpMailer::from_env(relay, config.smtp_port, config.smtp_timeout()) {
        Ok(mailer) => Arc::new(mailer),
        Err(e) => {
            warn!("SMTP unavailable ({e}), contact mails will be logged");
            Arc::new(LogMailer)
        },
    }
}

/// Builds handler state from config and injected collaborators.
pub fn build_state(config: &FolioConfig, mailer: Arc<dyn Mailer>, clock: Arc<dyn Clock>) -> AppState {
    let sender = config
        .sender
        .clone()
        .or_else(|| std::env::var(EMAIL_USER_ENV).ok())
        .unwrap_or_else(|| config.recipient.clone());
    let relay = ContactRelay::new(mailer, sender, config.recipient.clone(), config.owner_name.clone());
    AppState::new(VisitCounters::new(clock), relay)
}
