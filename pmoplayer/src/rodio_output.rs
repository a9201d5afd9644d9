//! Sortie audio locale avec rodio
//!
//! Un thread dédié possède le périphérique : l'`OutputStream` de rodio ne
//! quitte jamais ce thread. [`RodioOutput`] ne fait qu'envoyer des commandes.
//!
//! `bind` télécharge le flux sur le runtime tokio, puis le thread audio le
//! décode (symphonia) et le joue dans un `Sink`. Le thread remonte la
//! position toutes les 250 ms et signale la fin du flux ou les erreurs via
//! [`MediaEvents`], étiquetées avec la liaison concernée.

use crate::client::DEFAULT_USER_AGENT;
use crate::controller::MediaEvents;
use crate::output::{BindingId, MediaOutput};
use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use std::io::Cursor;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Interval between two position reports
const POLL_INTERVAL: Duration = Duration::from_millis(250);

type StreamDecoder = Decoder<Cursor<Bytes>>;

enum AudioCommand {
    Attach(MediaEvents),
    Bind(BindingId),
    Loaded { binding: BindingId, data: Bytes },
    Failed { binding: BindingId, message: String },
    Play,
    Pause,
    Stop,
    Seek(f64),
}

/// [`MediaOutput`] playing on the default audio device
pub struct RodioOutput {
    cmd_tx: mpsc::Sender<AudioCommand>,
    client: reqwest::Client,
    runtime: tokio::runtime::Handle,
}

impl RodioOutput {
    /// Open the default audio device
    ///
    /// Must be called from within a tokio runtime: downloads run on it.
    pub fn new() -> Result<Self> {
        let runtime =
            tokio::runtime::Handle::try_current().context("RodioOutput needs a tokio runtime")?;
        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        thread::Builder::new()
            .name("pmotube-audio".to_string())
            .spawn(move || {
                let mut stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                stream.log_on_drop(false);
                let _ = ready_tx.send(Ok(()));

                AudioThread::new(stream).run(cmd_rx);
            })?;

        ready_rx
            .recv()
            .context("Audio thread exited during startup")?
            .map_err(|e| anyhow!("Cannot open audio output: {}", e))?;

        info!("🔊 Audio output opened on the default device");
        Ok(Self {
            cmd_tx,
            client,
            runtime,
        })
    }

    fn send(&self, command: AudioCommand) -> Result<()> {
        self.cmd_tx
            .send(command)
            .map_err(|_| anyhow!("Audio thread is dead"))
    }
}

impl MediaOutput for RodioOutput {
    fn attach(&mut self, events: MediaEvents) {
        if let Err(e) = self.send(AudioCommand::Attach(events)) {
            warn!("Cannot attach media events: {}", e);
        }
    }

    fn bind(&mut self, url: &str, binding: BindingId) -> Result<()> {
        self.send(AudioCommand::Bind(binding))?;

        let client = self.client.clone();
        let cmd_tx = self.cmd_tx.clone();
        let url = url.to_string();
        self.runtime.spawn(async move {
            let command = match fetch(&client, &url).await {
                Ok(data) => {
                    debug!(binding, bytes = data.len(), "Stream downloaded");
                    AudioCommand::Loaded { binding, data }
                }
                Err(e) => AudioCommand::Failed {
                    binding,
                    message: format!("download failed: {}", e),
                },
            };
            let _ = cmd_tx.send(command);
        });

        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.send(AudioCommand::Play)
    }

    fn pause(&mut self) -> Result<()> {
        self.send(AudioCommand::Pause)
    }

    fn stop(&mut self) -> Result<()> {
        self.send(AudioCommand::Stop)
    }

    fn seek(&mut self, position_secs: f64) -> Result<()> {
        self.send(AudioCommand::Seek(position_secs))
    }
}

async fn fetch(client: &reqwest::Client, url: &str) -> reqwest::Result<Bytes> {
    client.get(url).send().await?.error_for_status()?.bytes().await
}

/// Decode a downloaded stream, with its duration in seconds (0 if unknown)
fn decode(data: Bytes) -> Result<(StreamDecoder, f64)> {
    let from_container = container_duration(&data);
    let byte_len = data.len() as u64;

    let source = Decoder::builder()
        .with_data(Cursor::new(data))
        .with_byte_len(byte_len)
        .with_seekable(true)
        .build()
        .context("cannot decode stream")?;

    let duration = from_container
        .or_else(|| source.total_duration().map(|d| d.as_secs_f64()))
        .unwrap_or(0.0);
    Ok((source, duration))
}

fn container_duration(data: &Bytes) -> Option<f64> {
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::probe::Hint;

    let mss = MediaSourceStream::new(Box::new(Cursor::new(data.clone())), Default::default());
    let opened = symphonia::default::get_probe()
        .format(&Hint::new(), mss, &Default::default(), &Default::default())
        .ok()?;

    let track = opened.format.default_track()?;
    let n_frames = track.codec_params.n_frames?;
    let sample_rate = track.codec_params.sample_rate?;
    Some(n_frames as f64 / sample_rate as f64)
}

struct Playback {
    binding: BindingId,
    sink: Sink,
    duration_secs: f64,
    ended: bool,
}

struct AudioThread {
    stream: OutputStream,
    events: Option<MediaEvents>,
    /// Liaison en cours de téléchargement
    pending: Option<BindingId>,
    current: Option<Playback>,
    wants_play: bool,
}

impl AudioThread {
    fn new(stream: OutputStream) -> Self {
        Self {
            stream,
            events: None,
            pending: None,
            current: None,
            wants_play: false,
        }
    }

    fn run(mut self, cmd_rx: mpsc::Receiver<AudioCommand>) {
        let mut next_poll = Instant::now() + POLL_INTERVAL;

        loop {
            let timeout = next_poll.saturating_duration_since(Instant::now());
            match cmd_rx.recv_timeout(timeout) {
                Ok(command) => self.handle(command),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }

            if Instant::now() >= next_poll {
                next_poll = Instant::now() + POLL_INTERVAL;
                if !self.poll() {
                    break;
                }
            }
        }

        self.release();
        debug!("Audio thread stopped");
    }

    fn handle(&mut self, command: AudioCommand) {
        match command {
            AudioCommand::Attach(events) => self.events = Some(events),
            AudioCommand::Bind(binding) => {
                self.release();
                self.pending = Some(binding);
                self.wants_play = false;
            }
            AudioCommand::Loaded { binding, data } => {
                if self.pending != Some(binding) {
                    debug!(binding, "Dropping stream of a released binding");
                    return;
                }
                self.pending = None;
                self.start(binding, data);
            }
            AudioCommand::Failed { binding, message } => {
                if self.pending == Some(binding) {
                    self.pending = None;
                    self.report_error(binding, message);
                }
            }
            AudioCommand::Play => {
                self.wants_play = true;
                if let Some(playback) = &self.current {
                    playback.sink.play();
                }
            }
            AudioCommand::Pause => {
                self.wants_play = false;
                if let Some(playback) = &self.current {
                    playback.sink.pause();
                }
            }
            AudioCommand::Stop => {
                self.release();
                self.pending = None;
                self.wants_play = false;
            }
            AudioCommand::Seek(position_secs) => {
                if let Some(playback) = &self.current {
                    let position = Duration::from_secs_f64(position_secs.max(0.0));
                    if let Err(e) = playback.sink.try_seek(position) {
                        warn!(position_secs, "Seek failed: {}", e);
                    }
                }
            }
        }
    }

    fn start(&mut self, binding: BindingId, data: Bytes) {
        let (source, duration_secs) = match decode(data) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.report_error(binding, format!("{:#}", e));
                return;
            }
        };

        let sink = Sink::connect_new(self.stream.mixer());
        if !self.wants_play {
            sink.pause();
        }
        sink.append(source);

        debug!(binding, duration_secs, "Stream decoding started");
        self.current = Some(Playback {
            binding,
            sink,
            duration_secs,
            ended: false,
        });
    }

    fn release(&mut self) {
        if let Some(playback) = self.current.take() {
            playback.sink.stop();
        }
    }

    /// Report position or end of stream, `false` once the controller is gone
    fn poll(&mut self) -> bool {
        let (Some(events), Some(playback)) = (&self.events, &mut self.current) else {
            return true;
        };
        if playback.ended || playback.sink.is_paused() {
            return true;
        }

        if playback.sink.empty() {
            playback.ended = true;
            events.time_update(playback.binding, playback.duration_secs, playback.duration_secs);
            return events.ended(playback.binding);
        }

        events.time_update(
            playback.binding,
            playback.sink.get_pos().as_secs_f64(),
            playback.duration_secs,
        )
    }

    fn report_error(&self, binding: BindingId, message: String) {
        warn!(binding, "Stream failed: {}", message);
        if let Some(events) = &self.events {
            events.error(binding, message);
        }
    }
}
