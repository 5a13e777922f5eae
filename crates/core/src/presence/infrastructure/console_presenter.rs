use std::io::{self, Write};

use crate::presence::domain::overlay_presenter::OverlayPresenter;

use super::overlay_catalog::OverlayCatalog;

/// Prints overlay lifecycle changes as text lines.
pub struct ConsolePresenter<W: Write + Send> {
    catalog: OverlayCatalog,
    out: W,
    shown: Option<String>,
}

impl ConsolePresenter<io::Stdout> {
    pub fn stdout(catalog: OverlayCatalog) -> Self {
        Self::new(catalog, io::stdout())
    }
}

impl<W: Write + Send> ConsolePresenter<W> {
    pub fn new(catalog: OverlayCatalog, out: W) -> Self {
        Self {
            catalog,
            out,
            shown: None,
        }
    }

    /// Identifier of the overlay currently on screen.
    pub fn shown(&self) -> Option<&str> {
        self.shown.as_deref()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}").and_then(|_| self.out.flush()) {
            log::warn!("Failed to write overlay status: {e}");
        }
    }

    fn expected_ids(&self) -> String {
        let ids: Vec<&str> = self.catalog.ids().collect();
        match ids.as_slice() {
            [] => "no known codes".into(),
            [only] => (*only).to_string(),
            [rest @ .., last] => format!("{}, or {last}", rest.join(", ")),
        }
    }
}

impl<W: Write + Send> OverlayPresenter for ConsolePresenter<W> {
    fn activate(&mut self, id: &str) {
        let line = match self.catalog.resolve(id) {
            Some((resolved, entry)) => {
                let line = if entry.description.is_empty() {
                    format!("[{resolved}] {}", entry.title)
                } else {
                    format!("[{resolved}] {}: {}", entry.title, entry.description)
                };
                log::info!("Showing overlay {resolved} ({})", entry.title);
                self.shown = Some(resolved);
                line
            }
            None => {
                log::info!("Decoded payload {id:?} has no overlay");
                self.shown = None;
                format!(
                    "QR \"{id}\" not recognized. Expect {}.",
                    self.expected_ids()
                )
            }
        };
        self.emit(&line);
    }

    fn deactivate(&mut self) {
        if let Some(id) = self.shown.take() {
            log::info!("Clearing overlay {id}");
        }
        self.emit("Overlay cleared");
    }
}
