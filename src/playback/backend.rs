//! Seams between the coordinator, the audio device and the rendered controls.

use thiserror::Error;

/// Identity of one constructed playable resource. Ids only grow, so a
/// resolution carrying an older id than the session's is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub u64);

/// One rendered playback control: the play button of a single verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId {
    pub chapter: u16,
    pub verse: u16,
}

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("audio output unavailable: {0}")]
    Output(String),
    #[error("could not decode audio: {0}")]
    Decode(String),
    #[error("could not download audio: {0}")]
    Fetch(String),
}

/// Notifications from the audio device, always tagged with the resource
/// they concern.
#[derive(Debug)]
pub enum MediaEvent {
    Started(ResourceId),
    Failed(ResourceId, MediaError),
    Ended(ResourceId),
    Paused(ResourceId),
}

impl MediaEvent {
    pub fn resource(&self) -> ResourceId {
        match self {
            MediaEvent::Started(id)
            | MediaEvent::Failed(id, _)
            | MediaEvent::Ended(id)
            | MediaEvent::Paused(id) => *id,
        }
    }
}

/// Audio device driven by the coordinator. `start` only begins the attempt;
/// the outcome arrives later as [`MediaEvent::Started`] or [`MediaEvent::Failed`].
pub trait AudioBackend {
    fn start(&mut self, id: ResourceId, url: &str);
    fn pause(&mut self, id: ResourceId);
    fn resume(&mut self, id: ResourceId);
    fn release(&mut self, id: ResourceId);
}

/// Whatever displays the playing/not-playing state of controls.
pub trait ControlSurface {
    fn set_playing(&mut self, control: ControlId, playing: bool);
}
