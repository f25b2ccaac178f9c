//! Client interaction state machine.
//!
//! Mirrors what the browser view tracks: the chosen file, the in-flight
//! removal, the processed result, the active swatch and the confirmed picks.
//! Image data is only reachable through [`ObjectUrl`] handles issued by a
//! [`BlobStore`]; superseded handles are revoked as soon as the state that
//! owned them is left.

use crate::palette::Swatch;
use crate::removal::Upload;
use crate::tally::{self, SeasonCounts, Selection};
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::mem;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("no image selected")]
    NoImageSelected,
    #[error("a background removal is already in progress")]
    RemovalInFlight,
    #[error("no processed image yet")]
    NotReady,
    #[error("selection index {index} out of range (len {len})")]
    SelectionOutOfRange { index: usize, len: usize },
}

/// Handle to an in-memory blob, in the style of `blob:` URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default)]
pub struct BlobStore {
    next_id: u64,
    blobs: HashMap<ObjectUrl, Bytes>,
}

impl BlobStore {
    pub fn create(&mut self, bytes: Bytes) -> ObjectUrl {
        self.next_id += 1;
        let url = ObjectUrl(format!("blob:seasonfit/{}", self.next_id));
        self.blobs.insert(url.clone(), bytes);
        url
    }

    pub fn get(&self, url: &ObjectUrl) -> Option<&Bytes> {
        self.blobs.get(url)
    }

    /// Returns false if the handle was already revoked.
    pub fn revoke(&mut self, url: &ObjectUrl) -> bool {
        self.blobs.remove(url).is_some()
    }

    /// Number of handles not yet revoked.
    pub fn live(&self) -> usize {
        self.blobs.len()
    }
}

/// Identifies one removal request. Completions carrying an older ticket are
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone)]
pub struct SelectedImage {
    pub upload: Upload,
    pub url: ObjectUrl,
}

#[derive(Debug, Default)]
pub enum Phase {
    #[default]
    Idle,
    ImageSelected {
        original: SelectedImage,
        error: Option<String>,
    },
    Processing {
        original: SelectedImage,
        ticket: Ticket,
    },
    Ready {
        original: SelectedImage,
        processed: ObjectUrl,
    },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::ImageSelected { .. } => "image-selected",
            Phase::Processing { .. } => "processing",
            Phase::Ready { .. } => "ready",
        }
    }
}

/// Whether a removal completion was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored,
}

/// Side effect the view should perform after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    ScrollToAnalysis,
}

#[derive(Debug, Default)]
pub struct Session {
    phase: Phase,
    selections: Vec<Selection>,
    active_swatch: Option<Swatch>,
    blobs: BlobStore,
    next_ticket: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn active_swatch(&self) -> Option<&Swatch> {
        self.active_swatch.as_ref()
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::ImageSelected { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.phase, Phase::Processing { .. })
    }

    /// The removal button is shown once a file is chosen and disabled while
    /// a request is in flight.
    pub fn can_remove_background(&self) -> bool {
        matches!(
            self.phase,
            Phase::ImageSelected { .. } | Phase::Ready { .. }
        )
    }

    pub fn original(&self) -> Option<&Bytes> {
        match &self.phase {
            Phase::Idle => None,
            Phase::ImageSelected { original, .. }
            | Phase::Processing { original, .. }
            | Phase::Ready { original, .. } => self.blobs.get(&original.url),
        }
    }

    pub fn processed(&self) -> Option<&Bytes> {
        match &self.phase {
            Phase::Ready { processed, .. } => self.blobs.get(processed),
            _ => None,
        }
    }

    /// Choose a new file. Allowed from any state; any in-flight request
    /// becomes stale.
    pub fn select_image(&mut self, upload: Upload) -> ObjectUrl {
        let previous = mem::take(&mut self.phase);
        self.release(previous);

        let url = self.blobs.create(upload.bytes.clone());
        tracing::debug!("Selected image {} ({} bytes)", url, upload.len());
        self.phase = Phase::ImageSelected {
            original: SelectedImage {
                upload,
                url: url.clone(),
            },
            error: None,
        };
        url
    }

    /// Start a removal. Returns the upload to send and the ticket to complete
    /// it with.
    pub fn begin_removal(&mut self) -> Result<(Ticket, Upload), SessionError> {
        let original = match mem::take(&mut self.phase) {
            Phase::Idle => return Err(SessionError::NoImageSelected),
            phase @ Phase::Processing { .. } => {
                self.phase = phase;
                return Err(SessionError::RemovalInFlight);
            }
            Phase::ImageSelected { original, .. } => original,
            Phase::Ready {
                original,
                processed,
            } => {
                self.blobs.revoke(&processed);
                original
            }
        };

        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        let upload = original.upload.clone();
        self.phase = Phase::Processing { original, ticket };
        Ok((ticket, upload))
    }

    /// Apply the result of the removal identified by `ticket`.
    pub fn complete_removal(&mut self, ticket: Ticket, result: Result<Bytes, String>) -> Outcome {
        let original = match mem::take(&mut self.phase) {
            Phase::Processing {
                original,
                ticket: current,
            } if current == ticket => original,
            phase => {
                tracing::debug!("Ignoring stale removal result {:?} in {}", ticket, phase.name());
                self.phase = phase;
                return Outcome::Ignored;
            }
        };

        self.phase = match result {
            Ok(image) => {
                let processed = self.blobs.create(image);
                Phase::Ready {
                    original,
                    processed,
                }
            }
            Err(message) => {
                tracing::warn!("Background removal failed: {}", message);
                Phase::ImageSelected {
                    original,
                    error: Some(message),
                }
            }
        };
        Outcome::Applied
    }

    /// Highlight a swatch behind the processed image without recording it.
    pub fn preview_swatch(&mut self, swatch: &Swatch) -> Result<(), SessionError> {
        self.require_ready()?;
        self.active_swatch = Some(swatch.clone());
        Ok(())
    }

    pub fn confirm_swatch(&mut self, swatch: &Swatch) -> Result<Effect, SessionError> {
        self.require_ready()?;
        self.selections.push(Selection::from(swatch));
        self.active_swatch = Some(swatch.clone());
        Ok(Effect::ScrollToAnalysis)
    }

    pub fn remove_selection(&mut self, index: usize) -> Result<Selection, SessionError> {
        if index >= self.selections.len() {
            return Err(SessionError::SelectionOutOfRange {
                index,
                len: self.selections.len(),
            });
        }
        Ok(self.selections.remove(index))
    }

    pub fn clear_error(&mut self) {
        if let Phase::ImageSelected { error, .. } = &mut self.phase {
            *error = None;
        }
    }

    pub fn counts(&self) -> SeasonCounts {
        tally::season_counts(&self.selections)
    }

    pub fn analysis(&self) -> Option<String> {
        tally::personal_color(&self.selections)
    }

    /// Full page reset: back to `Idle` with nothing recorded.
    pub fn reset(&mut self) {
        let previous = mem::take(&mut self.phase);
        self.release(previous);
        self.selections.clear();
        self.active_swatch = None;
    }

    fn require_ready(&self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Ready { .. } => Ok(()),
            _ => Err(SessionError::NotReady),
        }
    }

    fn release(&mut self, phase: Phase) {
        match phase {
            Phase::Idle => {}
            Phase::ImageSelected { original, .. } | Phase::Processing { original, .. } => {
                self.blobs.revoke(&original.url);
            }
            Phase::Ready {
                original,
                processed,
            } => {
                self.blobs.revoke(&original.url);
                self.blobs.revoke(&processed);
            }
        }
    }
}
