// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::types::Anchor;

/// How a generated certificate reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// The PDF is returned in the HTTP response.
    Download,
    /// The PDF is queued for email delivery and the response only
    /// acknowledges the submission.
    Email,
}

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// Directory holding one `{event_key}.csv` roster per event.
    pub roster_dir: PathBuf,
    /// Directory holding the template images.
    pub template_dir: PathBuf,
    pub fonts: FontConfig,
    pub delivery_mode: DeliveryMode,
    pub smtp: SmtpConfig,
    /// SQLite file for delivery status. In-memory when unset.
    pub ledger_path: Option<PathBuf>,
    /// Selectable events, in display order.
    pub events: Vec<EventConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            roster_dir: PathBuf::from("attendance"),
            template_dir: PathBuf::from("templates"),
            fonts: FontConfig::default(),
            delivery_mode: DeliveryMode::Download,
            smtp: SmtpConfig::default(),
            ledger_path: None,
            events: vec![EventConfig {
                key: "nss_camp_2026".into(),
                display_name: "NSS Camp 2026".into(),
                template: None,
                name_anchor: Some(Anchor { x: 0.50, y: 0.38 }),
                quantity_anchor: None,
                tracks_quantity: false,
            }],
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

/// Text rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// TrueType/OpenType file used for all overlay text.
    pub path: Option<PathBuf>,
    /// System family to fall back to when `path` is unset or unreadable.
    pub fallback_family: String,
    /// Pixel height of the attendee name.
    pub name_px: f32,
    /// Pixel height of the quantity field.
    pub quantity_px: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from("Alice-Regular.ttf")),
            fallback_family: "Times New Roman".into(),
            name_px: 120.0,
            quantity_px: 60.0,
        }
    }
}

/// Outbound mail relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Relay host, reached over implicit TLS.
    pub relay: String,
    pub port: u16,
    /// Login and `From` address.
    pub username: String,
    /// Display name in the `From` header.
    pub sender_name: String,
    /// Environment variable holding the relay password.
    pub password_env: String,
    /// Upper bound on a single send, in seconds.
    pub timeout_secs: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            relay: "smtp.gmail.com".into(),
            port: 465,
            username: String::new(),
            sender_name: "Certificates Team".into(),
            password_env: "CERTFORGE_SMTP_PASSWORD".into(),
            timeout_secs: 60,
        }
    }
}

impl SmtpConfig {
    /// Read the relay password from the configured environment variable.
    pub fn password(&self) -> Option<String> {
        std::env::var(&self.password_env).ok().filter(|p| !p.is_empty())
    }
}

/// One selectable event as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// File-safe key; names the roster (`{key}.csv`) and default template.
    pub key: String,
    pub display_name: String,
    /// Template file name inside `template_dir`. Defaults to `{key}.jpg`.
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub name_anchor: Option<Anchor>,
    #[serde(default)]
    pub quantity_anchor: Option<Anchor>,
    /// Whether the roster carries a quantity column that must be printed.
    #[serde(default)]
    pub tracks_quantity: bool,
}

impl AppConfig {
    /// Load the config file at `path`, or defaults when it does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        debug!(path = %path.display(), events = config.events.len(), "config loaded");
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}
