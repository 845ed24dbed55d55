//! Interaction controller for a single studio session.
//!
//! [`Studio`] owns the session state (current image, history, status, last
//! error) and drives the [`ImageApi`]. At most one remote call is in flight:
//! prompts submitted while the status is not idle are dropped, not queued.
//!
//! Uploads are refused while a call is in flight. A call that settles always
//! installs its result as the current image, even if the image was cleared or
//! re-selected while it was running.

use crate::ai::{mime, ImageApi};
use crate::models::{ImagePayload, ImageRecord, Mode, Status, UPLOADED_IMAGE_PROMPT};
use crate::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of [`Studio::submit_prompt`].
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The prompt was blank; nothing was sent.
    EmptyPrompt,
    /// Another call is still outstanding; the prompt was dropped.
    Busy,
    Completed(ImageRecord),
    /// The call failed; the message is also stored as the last error.
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    current: Option<ImageRecord>,
    history: Vec<ImageRecord>,
    status: Status,
    last_error: Option<String>,
}

impl SessionState {
    pub fn current(&self) -> Option<&ImageRecord> {
        self.current.as_ref()
    }

    /// Most recent first.
    pub fn history(&self) -> &[ImageRecord] {
        &self.history
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn install(&mut self, record: ImageRecord) {
        self.history.insert(0, record.clone());
        self.current = Some(record);
        self.last_error = None;
    }
}

enum PendingCall {
    Generate,
    Edit(ImagePayload),
}

/// Returns the status to idle when dropped, so a call abandoned mid-flight
/// cannot leave the session stuck in a busy state.
struct InFlight<'a> {
    state: &'a Mutex<SessionState>,
    armed: bool,
}

impl InFlight<'_> {
    fn settle<R>(mut self, apply: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = lock(self.state);
        let result = apply(&mut *state);
        state.status = Status::Idle;
        self.armed = false;
        result
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Request dropped before settling; returning to idle");
            lock(self.state).status = Status::Idle;
        }
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Studio {
    api: Box<dyn ImageApi>,
    state: Mutex<SessionState>,
}

impl Studio {
    pub fn new(api: Box<dyn ImageApi>) -> Self {
        Self {
            api,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        lock(&self.state).clone()
    }

    pub fn current(&self) -> Option<ImageRecord> {
        lock(&self.state).current.clone()
    }

    pub fn history(&self) -> Vec<ImageRecord> {
        lock(&self.state).history.clone()
    }

    pub fn status(&self) -> Status {
        lock(&self.state).status
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }

    /// Edit when an image is current, generate otherwise.
    pub fn mode(&self) -> Mode {
        if lock(&self.state).current.is_some() {
            Mode::Edit
        } else {
            Mode::Generate
        }
    }

    /// Send a prompt: edits the current image if there is one, otherwise
    /// generates a new image. Failures are recorded as the last error and
    /// returned, never propagated.
    pub async fn submit_prompt(&self, text: &str) -> Submission {
        if text.trim().is_empty() {
            debug!("Ignoring empty prompt");
            return Submission::EmptyPrompt;
        }

        let pending = {
            let mut state = lock(&self.state);
            if !state.status.is_idle() {
                debug!("Dropping prompt while {}", state.status);
                return Submission::Busy;
            }

            let pending = match state.current.as_ref() {
                Some(current) => PendingCall::Edit(current.payload().clone()),
                None => PendingCall::Generate,
            };
            state.status = match &pending {
                PendingCall::Generate => Status::Generating,
                PendingCall::Edit(_) => Status::Editing,
            };
            state.last_error = None;
            info!("Session {}: {}", state.status, text);
            pending
        };

        let in_flight = InFlight {
            state: &self.state,
            armed: true,
        };

        let outcome = match &pending {
            PendingCall::Generate => self.api.generate(text).await,
            PendingCall::Edit(image) => self.api.edit(image, text).await,
        };

        in_flight.settle(|state| match outcome {
            Ok(payload) => {
                let record = ImageRecord::new(payload, text);
                info!(
                    "Created image {} ({} bytes, {})",
                    record.id(),
                    record.payload().len(),
                    record.payload().media_type()
                );
                state.install(record.clone());
                Submission::Completed(record)
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Image request failed: {}", message);
                state.last_error = Some(message.clone());
                Submission::Failed(message)
            }
        })
    }

    /// Make a locally uploaded image current. An empty `media_type` is
    /// sniffed from the bytes. Returns `None` for an empty upload or while a
    /// call is in flight.
    pub fn submit_upload(&self, bytes: Vec<u8>, media_type: &str) -> Option<ImageRecord> {
        if bytes.is_empty() {
            debug!("Ignoring empty upload");
            return None;
        }

        let media_type = if media_type.trim().is_empty() {
            mime::detect_image_mime(&bytes)
        } else {
            media_type
        };

        self.install_upload(ImagePayload::new(bytes, media_type))
    }

    /// Upload from a transport-encoded string such as a `data:` URI.
    pub fn submit_upload_data_uri(&self, encoded: &str) -> Result<Option<ImageRecord>> {
        let payload = ImagePayload::from_data_uri(encoded)?;
        if payload.is_empty() {
            debug!("Ignoring empty upload");
            return Ok(None);
        }
        Ok(self.install_upload(payload))
    }

    fn install_upload(&self, payload: ImagePayload) -> Option<ImageRecord> {
        let mut state = lock(&self.state);
        if !state.status.is_idle() {
            debug!("Refusing upload while {}", state.status);
            return None;
        }

        let record = ImageRecord::new(payload, UPLOADED_IMAGE_PROMPT);
        info!(
            "Uploaded image {} ({} bytes, {})",
            record.id(),
            record.payload().len(),
            record.payload().media_type()
        );
        state.install(record.clone());
        Some(record)
    }

    pub fn clear_current(&self) {
        let mut state = lock(&self.state);
        state.current = None;
        state.last_error = None;
    }

    /// Make a history entry current again. Returns `false` if `id` is unknown.
    pub fn select_from_history(&self, id: Uuid) -> bool {
        let mut state = lock(&self.state);
        let found = state.history.iter().find(|record| record.id() == id).cloned();
        match found {
            Some(record) => {
                state.current = Some(record);
                state.last_error = None;
                true
            }
            None => {
                debug!("No history entry with id {}", id);
                false
            }
        }
    }

    pub fn dismiss_error(&self) {
        lock(&self.state).last_error = None;
    }

    /// Write the current image to `dir` as `gemini-edit-<millis>.<ext>`.
    pub async fn save_current(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let Some(current) = self.current() else {
            return Ok(None);
        };

        let payload = current.payload();
        let path = dir.join(format!(
            "gemini-edit-{}.{}",
            Utc::now().timestamp_millis(),
            payload.file_extension()
        ));
        tokio::fs::write(&path, payload.bytes()).await?;
        info!("Saved image {} to {}", current.id(), path.display());

        Ok(Some(path))
    }
}
