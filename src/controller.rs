//! State machine behind the upload form.
//!
//! `Idle -> Selected -> Analyzing -> ResultShown`, with a failed analysis
//! falling back to `Selected` plus an error message. A new selection or a
//! clear is allowed in any phase and always drops the shown result.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::client::Predictor;
use crate::model::{ImageFile, PredictionResult, PreviewId, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Selected,
    Analyzing,
    ResultShown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// Nothing selected, or a request is already in flight.
    Skipped,
    Completed(PredictionResult),
    Failed(String),
    /// The selection changed while the request was in flight.
    Superseded,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionView {
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
    pub preview: PreviewId,
    pub preview_url: String,
}

/// Everything the page needs to render itself.
#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    pub phase: Phase,
    pub loading: bool,
    pub selection: Option<SelectionView>,
    pub result: Option<PredictionResult>,
    pub error: Option<String>,
}

#[derive(Default)]
struct State {
    selection: Option<Selection>,
    result: Option<PredictionResult>,
    error: Option<String>,
    loading: bool,
    generation: u64,
    next_preview: u64,
}

impl State {
    fn phase(&self) -> Phase {
        if self.loading {
            Phase::Analyzing
        } else if self.result.is_some() {
            Phase::ResultShown
        } else if self.selection.is_some() {
            Phase::Selected
        } else {
            Phase::Idle
        }
    }

    fn replace_selection(&mut self, selection: Option<Selection>) {
        if let Some(old) = &self.selection {
            debug!("Revoking preview {}", old.preview);
        }
        self.selection = selection;
        self.result = None;
        self.error = None;
        self.generation += 1;
    }
}

/// Clears the loading flag when the request scope ends, however it ends.
struct LoadingGuard<'a> {
    state: &'a Mutex<State>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).loading = false;
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct UploadController {
    predictor: Arc<dyn Predictor>,
    state: Mutex<State>,
}

impl UploadController {
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        Self {
            predictor,
            state: Mutex::new(State::default()),
        }
    }

    /// Makes `file` the current selection. Returns `false`, leaving the
    /// state untouched, when the file is not an image.
    pub fn select_file(&self, file: ImageFile) -> bool {
        if !file.is_image() {
            debug!(
                "Ignoring {} with content type {:?}",
                file.file_name, file.content_type
            );
            return false;
        }

        let mut state = lock(&self.state);
        state.next_preview += 1;
        let preview = PreviewId(state.next_preview);
        info!(
            "Selected {} ({} bytes), preview {}",
            file.file_name,
            file.bytes.len(),
            preview
        );
        state.replace_selection(Some(Selection { file, preview }));
        true
    }

    pub fn clear_selection(&self) {
        let mut state = lock(&self.state);
        if state.selection.is_some() {
            info!("Selection cleared");
        }
        state.replace_selection(None);
    }

    pub fn dismiss_error(&self) {
        lock(&self.state).error = None;
    }

    /// Uploads the current selection and stores the outcome. At most one
    /// request runs at a time; extra calls return `Skipped` without
    /// touching the network.
    pub async fn request_prediction(&self) -> RequestOutcome {
        let (file, generation) = {
            let mut state = lock(&self.state);
            if state.loading {
                debug!("Prediction already in flight");
                return RequestOutcome::Skipped;
            }
            let Some(selection) = &state.selection else {
                debug!("No file selected");
                return RequestOutcome::Skipped;
            };
            let file = selection.file.clone();
            state.loading = true;
            state.result = None;
            state.error = None;
            (file, state.generation)
        };
        let _loading = LoadingGuard { state: &self.state };

        info!("Analyzing {}", file.file_name);
        let outcome = self.predictor.predict(&file).await;

        let mut state = lock(&self.state);
        if state.generation != generation {
            debug!("Discarding response for superseded selection {}", file.file_name);
            return RequestOutcome::Superseded;
        }

        match outcome {
            Ok(result) => {
                info!(
                    "{} identified as {} ({}%)",
                    file.file_name, result.label, result.confidence
                );
                state.result = Some(result.clone());
                RequestOutcome::Completed(result)
            }
            Err(e) => {
                warn!("Prediction for {} failed: {}", file.file_name, e);
                let message = e.user_message();
                state.error = Some(message.clone());
                RequestOutcome::Failed(message)
            }
        }
    }

    /// Image bytes and content type behind a preview locator. Previews of
    /// replaced or cleared selections no longer resolve.
    pub fn preview(&self, id: PreviewId) -> Option<(String, Bytes)> {
        let state = lock(&self.state);
        state
            .selection
            .as_ref()
            .filter(|s| s.preview == id)
            .map(|s| (s.file.content_type.clone(), s.file.bytes.clone()))
    }

    pub fn snapshot(&self) -> ViewState {
        let state = lock(&self.state);
        ViewState {
            phase: state.phase(),
            loading: state.loading,
            selection: state.selection.as_ref().map(|s| SelectionView {
                file_name: s.file.file_name.clone(),
                content_type: s.file.content_type.clone(),
                size: s.file.bytes.len(),
                preview: s.preview,
                preview_url: s.preview.locator(),
            }),
            result: state.result.clone(),
            error: state.error.clone(),
        }
    }
}
