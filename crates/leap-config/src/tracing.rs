// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::io::IsTerminal;
use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CHROME_ENV: &str = "LEAP_TRACE_CHROME";

/// Keeps the optional Chrome trace writer alive. Dropping the guard flushes
/// the trace file, so hold it for the lifetime of the program.
pub struct TracingGuard {
    _chrome: Option<tracing_chrome::FlushGuard>,
}

/// Installs the global tracing subscriber.
///
/// Filtering honours `RUST_LOG` and defaults to `info`. Setting
/// `LEAP_TRACE_CHROME` to a path additionally writes a Chrome-format trace
/// of the trajectory spans for offline inspection.
pub fn init_tracing() -> Result<TracingGuard, InitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(std::io::stdout().is_terminal());

    let (chrome_layer, chrome_guard) = match chrome_trace_path() {
        Some(path) => {
            let (layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
                .file(path)
                .include_args(true)
                .build();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(chrome_layer)
        .try_init()
        .map_err(|_| InitError::SubscriberInstalled)?;

    Ok(TracingGuard {
        _chrome: chrome_guard,
    })
}

fn chrome_trace_path() -> Option<PathBuf> {
    let raw = std::env::var_os(CHROME_ENV)?;
    if raw.is_empty() {
        return None;
    }
    Some(PathBuf::from(raw))
}

/// Errors from installing the tracing subscriber.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("a global tracing subscriber is already installed")]
    SubscriberInstalled,
}
