// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: font loading and template text overlay.

pub mod fonts;
pub mod renderer;

pub use renderer::CertificateRenderer;
