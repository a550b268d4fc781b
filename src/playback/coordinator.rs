//! Single-active-recitation coordinator.
//!
//! The coordinator owns the only [`Session`] and the backend that plays it.
//! Every play/pause/switch/stop goes through [`PlaybackCoordinator::activate`],
//! [`PlaybackCoordinator::handle_media_event`] or [`PlaybackCoordinator::stop`],
//! so at most one resource exists and at most one control shows "playing".
//!
//! ```text
//!            activate(U)                 Started(id)
//!   Idle ──────────────▶ Starting(U) ───────────────▶ Playing(U)
//!    ▲                      │ Failed(id)               │   ▲
//!    │◀─────────────────────┘                activate(U)   │ activate(U)
//!    │◀── Ended(id) / stop() ── Playing(U)        ▼        │
//!    │◀──────────── stop() ──────────────────── Paused(U) ─┘
//! ```
//!
//! Activating a control with a different URL releases the current resource,
//! resets its control and starts over from `Idle`. Media events whose
//! resource id is not the current one are dropped.

use crate::playback::backend::{AudioBackend, ControlId, ControlSurface, MediaEvent, ResourceId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Active {
    pub id: ResourceId,
    pub url: String,
    pub control: ControlId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Idle,
    Starting(Active),
    Playing(Active),
    Paused(Active),
}

impl Session {
    pub fn active(&self) -> Option<&Active> {
        match self {
            Session::Idle => None,
            Session::Starting(a) | Session::Playing(a) | Session::Paused(a) => Some(a),
        }
    }
}

pub struct PlaybackCoordinator<B> {
    backend: B,
    session: Session,
    next_id: u64,
}

impl<B: AudioBackend> PlaybackCoordinator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            session: Session::Idle,
            next_id: 1,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    #[cfg(test)]
    pub(crate) fn active_url(&self) -> Option<&str> {
        self.session.active().map(|a| a.url.as_str())
    }

    /// True only for the control whose resource is actually playing.
    #[cfg(test)]
    pub(crate) fn is_playing(&self, control: ControlId) -> bool {
        matches!(&self.session, Session::Playing(a) if a.control == control)
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    /// A verse's play control was pressed with its resolved audio URL.
    pub fn activate<S: ControlSurface>(&mut self, url: &str, control: ControlId, surface: &mut S) {
        match std::mem::take(&mut self.session) {
            Session::Idle => self.begin(url, control),
            Session::Starting(a) if a.url == url => {
                tracing::debug!(url, "Start already pending; ignoring activation");
                self.session = Session::Starting(a);
            }
            Session::Playing(a) if a.url == url => {
                self.backend.pause(a.id);
                surface.set_playing(a.control, false);
                self.session = Session::Paused(a);
            }
            Session::Paused(a) if a.url == url => {
                self.backend.resume(a.id);
                surface.set_playing(a.control, true);
                self.session = Session::Playing(a);
            }
            Session::Starting(a) | Session::Playing(a) | Session::Paused(a) => {
                self.backend.release(a.id);
                surface.set_playing(a.control, false);
                self.begin(url, control);
            }
        }
    }

    fn begin(&mut self, url: &str, control: ControlId) {
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        tracing::debug!(url, resource = id.0, "Starting recitation");
        self.backend.start(id, url);
        self.session = Session::Starting(Active {
            id,
            url: url.to_string(),
            control,
        });
    }

    pub fn handle_media_event<S: ControlSurface>(&mut self, event: MediaEvent, surface: &mut S) {
        let current = self.session.active().map(|a| a.id);
        if current != Some(event.resource()) {
            tracing::debug!(resource = event.resource().0, "Discarding stale media event");
            return;
        }

        match (std::mem::take(&mut self.session), event) {
            (Session::Starting(a), MediaEvent::Started(_)) => {
                surface.set_playing(a.control, true);
                self.session = Session::Playing(a);
            }
            (session, MediaEvent::Failed(id, err)) => {
                tracing::warn!(resource = id.0, error = %err, "Recitation failed to start");
                self.backend.release(id);
                if let Some(a) = session.active() {
                    surface.set_playing(a.control, false);
                }
            }
            (Session::Playing(a) | Session::Paused(a), MediaEvent::Ended(_)) => {
                surface.set_playing(a.control, false);
            }
            // Pauses not caused by the toggle path still desync the label
            // unless we follow them; the next activation then resumes.
            (Session::Playing(a) | Session::Paused(a), MediaEvent::Paused(_)) => {
                surface.set_playing(a.control, false);
                self.session = Session::Paused(a);
            }
            (session, other) => {
                tracing::debug!(event = ?other, "Media event does not apply to session state");
                self.session = session;
            }
        }
    }

    /// Release whatever is active (chapter navigation, teardown).
    pub fn stop<S: ControlSurface>(&mut self, surface: &mut S) {
        if let Some(a) = std::mem::take(&mut self.session).active() {
            self.backend.release(a.id);
            surface.set_playing(a.control, false);
        }
    }
}
