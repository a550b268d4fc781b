//! rodio-backed [`AudioBackend`].
//!
//! rodio's output stream is not `Send`, so a dedicated OS thread owns the
//! stream and the current sink. Downloads run on the tokio runtime and hand
//! their bytes to that thread tagged with the resource id; bytes for a
//! resource that is no longer the requested one are dropped.
//!
//! Pauses and resumes requested by the coordinator are not echoed back as
//! media events; the coordinator already records them.

use crate::content::types::http_client;
use crate::playback::backend::{AudioBackend, MediaError, MediaEvent, ResourceId};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::io::Cursor;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

const END_POLL: Duration = Duration::from_millis(100);

enum Command {
    Begin(ResourceId),
    Loaded(ResourceId, Result<Vec<u8>, MediaError>),
    Pause(ResourceId),
    Resume(ResourceId),
    Release(ResourceId),
    Shutdown,
}

pub struct RodioBackend {
    commands: Sender<Command>,
    runtime: Handle,
}

impl RodioBackend {
    /// Spawn the audio thread. Must be called from within a tokio runtime.
    pub fn spawn(events: UnboundedSender<MediaEvent>) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("noor-audio".into())
            .spawn(move || AudioThread::new(events).run(rx))
            .map_err(|e| tracing::error!(error = %e, "Failed to spawn audio thread"))
            .ok();
        Self {
            commands: tx,
            runtime: Handle::current(),
        }
    }

    fn send(&self, cmd: Command) {
        if self.commands.send(cmd).is_err() {
            tracing::warn!("Audio thread is gone; command dropped");
        }
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

impl AudioBackend for RodioBackend {
    fn start(&mut self, id: ResourceId, url: &str) {
        self.send(Command::Begin(id));
        let tx = self.commands.clone();
        let url = url.to_string();
        self.runtime.spawn(async move {
            let result = download(&url).await;
            let _ = tx.send(Command::Loaded(id, result));
        });
    }

    fn pause(&mut self, id: ResourceId) {
        self.send(Command::Pause(id));
    }

    fn resume(&mut self, id: ResourceId) {
        self.send(Command::Resume(id));
    }

    fn release(&mut self, id: ResourceId) {
        self.send(Command::Release(id));
    }
}

async fn download(url: &str) -> Result<Vec<u8>, MediaError> {
    let resp = http_client()
        .get(url)
        .send()
        .await
        .map_err(|e| MediaError::Fetch(e.to_string()))?;
    if !resp.status().is_success() {
        return Err(MediaError::Fetch(format!("HTTP {}", resp.status())));
    }
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| MediaError::Fetch(e.to_string()))?;
    Ok(bytes.to_vec())
}

struct AudioThread {
    events: UnboundedSender<MediaEvent>,
    // Opened on first use so a machine without audio still runs the reader.
    output: Option<(OutputStream, OutputStreamHandle)>,
    requested: Option<ResourceId>,
    current: Option<(ResourceId, Sink)>,
}

impl AudioThread {
    fn new(events: UnboundedSender<MediaEvent>) -> Self {
        Self {
            events,
            output: None,
            requested: None,
            current: None,
        }
    }

    fn run(mut self, rx: Receiver<Command>) {
        loop {
            match rx.recv_timeout(END_POLL) {
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(cmd) => self.handle(cmd),
                Err(RecvTimeoutError::Timeout) => {}
            }
            self.check_ended();
        }
        if let Some((_, sink)) = self.current.take() {
            sink.stop();
        }
    }

    fn emit(&self, event: MediaEvent) {
        let _ = self.events.send(event);
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Begin(id) => {
                self.stop_current();
                self.requested = Some(id);
            }
            Command::Loaded(id, result) => {
                if self.requested != Some(id) {
                    tracing::debug!(resource = id.0, "Dropping audio for released resource");
                    return;
                }
                match result.and_then(|bytes| self.play_bytes(bytes)) {
                    Ok(sink) => {
                        self.current = Some((id, sink));
                        self.emit(MediaEvent::Started(id));
                    }
                    Err(e) => {
                        self.requested = None;
                        self.emit(MediaEvent::Failed(id, e));
                    }
                }
            }
            Command::Pause(id) => {
                if let Some((cur, sink)) = &self.current
                    && *cur == id
                {
                    sink.pause();
                }
            }
            Command::Resume(id) => {
                if let Some((cur, sink)) = &self.current
                    && *cur == id
                {
                    sink.play();
                }
            }
            Command::Release(id) => {
                if self.requested == Some(id) {
                    self.requested = None;
                }
                if matches!(&self.current, Some((cur, _)) if *cur == id) {
                    self.stop_current();
                }
            }
            Command::Shutdown => {}
        }
    }

    fn play_bytes(&mut self, bytes: Vec<u8>) -> Result<Sink, MediaError> {
        if self.output.is_none() {
            let opened =
                OutputStream::try_default().map_err(|e| MediaError::Output(e.to_string()))?;
            self.output = Some(opened);
        }
        let Some((_, handle)) = &self.output else {
            return Err(MediaError::Output("no output stream".into()));
        };
        let source = Decoder::new(Cursor::new(bytes)).map_err(|e| MediaError::Decode(e.to_string()))?;
        let sink = Sink::try_new(handle).map_err(|e| MediaError::Output(e.to_string()))?;
        sink.append(source);
        sink.play();
        Ok(sink)
    }

    fn stop_current(&mut self) {
        if let Some((_, sink)) = self.current.take() {
            sink.stop();
        }
    }

    fn check_ended(&mut self) {
        let ended = matches!(&self.current, Some((_, sink)) if sink.empty());
        if ended && let Some((id, _)) = self.current.take() {
            self.requested = None;
            self.emit(MediaEvent::Ended(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

    fn thread() -> (AudioThread, UnboundedReceiver<MediaEvent>) {
        let (tx, rx) = unbounded_channel();
        (AudioThread::new(tx), rx)
    }

    fn drained(rx: &mut UnboundedReceiver<MediaEvent>) -> Vec<MediaEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    /// Install a device-less sink as the current resource.
    fn with_idle_sink(t: &mut AudioThread, id: ResourceId) -> rodio::queue::SourcesQueueOutput<f32> {
        let (sink, queue) = Sink::new_idle();
        t.requested = Some(id);
        t.current = Some((id, sink));
        queue
    }

    #[test]
    fn superseded_download_is_dropped() {
        let (mut t, mut rx) = thread();
        t.handle(Command::Begin(ResourceId(1)));
        t.handle(Command::Begin(ResourceId(2)));
        t.handle(Command::Loaded(ResourceId(1), Ok(vec![0; 8])));
        assert!(drained(&mut rx).is_empty());
        assert_eq!(t.requested, Some(ResourceId(2)));
    }

    #[test]
    fn released_download_is_dropped() {
        let (mut t, mut rx) = thread();
        t.handle(Command::Begin(ResourceId(2)));
        t.handle(Command::Release(ResourceId(2)));
        t.handle(Command::Loaded(ResourceId(2), Err(MediaError::Fetch("late".into()))));
        assert!(drained(&mut rx).is_empty());
        assert_eq!(t.requested, None);
    }

    #[test]
    fn failed_download_reports_failure() {
        let (mut t, mut rx) = thread();
        t.handle(Command::Begin(ResourceId(3)));
        t.handle(Command::Loaded(ResourceId(3), Err(MediaError::Fetch("HTTP 404".into()))));
        let events = drained(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], MediaEvent::Failed(ResourceId(3), MediaError::Fetch(_))));
        assert_eq!(t.requested, None);
    }

    #[test]
    fn requested_pause_and_resume_emit_nothing() {
        let (mut t, mut rx) = thread();
        let id = ResourceId(4);
        let _queue = with_idle_sink(&mut t, id);

        t.handle(Command::Pause(id));
        assert!(t.current.as_ref().is_some_and(|(_, s)| s.is_paused()));
        t.handle(Command::Resume(id));
        assert!(t.current.as_ref().is_some_and(|(_, s)| !s.is_paused()));
        assert!(drained(&mut rx).is_empty());
    }

    #[test]
    fn drained_sink_reports_end_once() {
        let (mut t, mut rx) = thread();
        let id = ResourceId(5);
        let _queue = with_idle_sink(&mut t, id);

        t.check_ended();
        t.check_ended();
        let events = drained(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], MediaEvent::Ended(ResourceId(5))));
        assert!(t.current.is_none());
        assert_eq!(t.requested, None);
    }
}
