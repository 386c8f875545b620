//! Audio playback
//!
//! Uses a channel-based architecture to handle rodio's non-Send stream.
//! The player spawns a dedicated audio thread that owns the output stream.

use super::AudioBuffer;
use std::io::Cursor;
use std::sync::mpsc;
use std::thread;
use tracing::{error, info, warn};

/// Commands sent to the audio thread
enum PlayerCommand {
    Play(AudioBuffer),
    PlayWait(AudioBuffer, mpsc::Sender<()>),
    Stop,
}

/// Thread-safe handle to the audio thread
#[derive(Clone)]
pub struct Player {
    sender: mpsc::Sender<PlayerCommand>,
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player").finish()
    }
}

impl Player {
    pub fn new() -> anyhow::Result<Self> {
        let (sender, receiver) = mpsc::channel::<PlayerCommand>();

        thread::Builder::new()
            .name("audio-playback".to_string())
            .spawn(move || Self::audio_thread(receiver))?;

        Ok(Self { sender })
    }

    fn audio_thread(receiver: mpsc::Receiver<PlayerCommand>) {
        use rodio::OutputStream;

        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok(s) => s,
            Err(e) => {
                warn!("🔇 Failed to initialize audio output: {}", e);
                Self::drain(receiver);
                return;
            }
        };

        let _stream = stream;
        let mut sink = match rodio::Sink::try_new(&stream_handle) {
            Ok(s) => s,
            Err(e) => {
                error!("❌ Failed to create audio sink: {}", e);
                Self::drain(receiver);
                return;
            }
        };

        info!("🔊 Audio thread started");

        while let Ok(cmd) = receiver.recv() {
            match cmd {
                PlayerCommand::Play(buffer) => {
                    if let Err(e) = Self::queue(&sink, buffer) {
                        error!("❌ Audio playback failed: {}", e);
                    }
                }
                PlayerCommand::PlayWait(buffer, resp) => {
                    if let Err(e) = Self::queue(&sink, buffer) {
                        error!("❌ Audio playback failed: {}", e);
                    }
                    sink.sleep_until_end();
                    let _ = resp.send(());
                }
                PlayerCommand::Stop => {
                    info!("🛑 Stopping all playback");
                    sink.stop();
                    // A stopped sink cannot play again
                    if let Ok(new_sink) = rodio::Sink::try_new(&stream_handle) {
                        sink = new_sink;
                    }
                }
            }
        }

        info!("🔇 Audio thread stopped");
    }

    /// Discard commands without output, releasing blocking callers
    fn drain(receiver: mpsc::Receiver<PlayerCommand>) {
        for cmd in receiver {
            if let PlayerCommand::PlayWait(_, resp) = cmd {
                let _ = resp.send(());
            }
        }
    }

    fn queue(sink: &rodio::Sink, buffer: AudioBuffer) -> anyhow::Result<()> {
        let format = buffer.format();
        let source = rodio::Decoder::new(Cursor::new(buffer.into_bytes()))?;
        sink.append(source);
        info!("🔊 Queueing {:?} audio", format);
        Ok(())
    }

    /// Queue a buffer and return immediately
    pub fn play(&self, buffer: AudioBuffer) -> anyhow::Result<()> {
        self.sender
            .send(PlayerCommand::Play(buffer))
            .map_err(|e| anyhow::anyhow!("Audio thread disconnected: {}", e))
    }

    /// Play a buffer and wait for it to finish
    pub fn play_sync(&self, buffer: AudioBuffer) -> anyhow::Result<()> {
        let (tx, rx) = mpsc::channel();
        self.sender
            .send(PlayerCommand::PlayWait(buffer, tx))
            .map_err(|e| anyhow::anyhow!("Audio thread disconnected: {}", e))?;

        let _ = rx.recv();
        Ok(())
    }

    /// Stop all current playback and clear queue
    pub fn stop(&self) -> anyhow::Result<()> {
        self.sender
            .send(PlayerCommand::Stop)
            .map_err(|e| anyhow::anyhow!("Audio thread disconnected: {}", e))
    }
}
