// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer: bridges the HTTP handlers to the certforge backend crates.
//
// The pipeline does the blocking work (roster, render, package); the app
// services own it together with the registry and the delivery queue and expose
// async-friendly entry points to the handlers.

pub mod app_services;
pub mod data_dir;
pub mod pipeline;

#[cfg(test)]
pub mod fixtures;
