// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Template registry: the immutable table mapping an event key to its
// template image and text anchors. Built once from `AppConfig` and shared by
// every request; it is also the source of the selectable event list so the
// form and the renderer can never disagree.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{AppConfig, EventConfig};
use crate::error::{CertError, Result};
use crate::types::Anchor;

/// Text anchors for one event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Anchors {
    pub name: Anchor,
    /// Present exactly when the event tracks quantities.
    pub quantity: Option<Anchor>,
}

/// Fully resolved configuration of one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDescriptor {
    pub key: String,
    pub display_name: String,
    pub template_path: PathBuf,
    pub anchors: Anchors,
    pub tracks_quantity: bool,
}

impl EventDescriptor {
    fn from_config(event: &EventConfig, template_dir: &Path) -> Result<Self> {
        let key = event.key.trim();
        if key.is_empty() {
            return Err(CertError::Config("event key must not be empty".into()));
        }
        if event.display_name.trim().is_empty() {
            return Err(CertError::Config(format!(
                "event '{key}' has an empty display name"
            )));
        }

        let validate = |anchor: Option<Anchor>| -> Result<Anchor> {
            match anchor {
                Some(a) => Anchor::new(a.x, a.y).map_err(|err| {
                    CertError::Config(format!("event '{key}': {err}"))
                }),
                None => Ok(Anchor::CENTER),
            }
        };

        let name = validate(event.name_anchor)?;
        let quantity = if event.tracks_quantity {
            Some(validate(event.quantity_anchor)?)
        } else {
            None
        };

        let template_file = event
            .template
            .clone()
            .unwrap_or_else(|| format!("{key}.jpg"));

        Ok(Self {
            key: key.to_string(),
            display_name: event.display_name.trim().to_string(),
            template_path: template_dir.join(template_file),
            anchors: Anchors { name, quantity },
            tracks_quantity: event.tracks_quantity,
        })
    }
}

/// Immutable lookup table of event descriptors, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    events: Vec<EventDescriptor>,
}

impl TemplateRegistry {
    /// Build the registry from the application config.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::from_events(&config.events, &config.template_dir)
    }

    /// Build the registry from explicit event entries.
    pub fn from_events(events: &[EventConfig], template_dir: impl AsRef<Path>) -> Result<Self> {
        let template_dir = template_dir.as_ref();
        let mut seen = HashSet::new();
        let mut descriptors = Vec::with_capacity(events.len());

        for event in events {
            let descriptor = EventDescriptor::from_config(event, template_dir)?;
            if !seen.insert(descriptor.key.clone()) {
                return Err(CertError::Config(format!(
                    "event '{}' is configured twice",
                    descriptor.key
                )));
            }
            debug!(
                key = %descriptor.key,
                template = %descriptor.template_path.display(),
                tracks_quantity = descriptor.tracks_quantity,
                "event registered"
            );
            descriptors.push(descriptor);
        }

        info!(events = descriptors.len(), "template registry built");
        Ok(Self {
            events: descriptors,
        })
    }

    /// Descriptor for `key`, or `UnknownEvent`.
    pub fn resolve(&self, key: &str) -> Result<&EventDescriptor> {
        let key = key.trim();
        self.events
            .iter()
            .find(|e| e.key == key)
            .ok_or_else(|| CertError::UnknownEvent(key.to_string()))
    }

    /// All events in display order.
    pub fn events(&self) -> &[EventDescriptor] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
