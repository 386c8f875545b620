//! Line-oriented front end for a translation session

use super::command::{SessionCommand, HELP};
use super::TranslationSession;
use crate::audio::capture;
use crate::audio::ingest::{self, Recording};
use crate::audio::playback::Player;
use crate::audio::AudioBuffer;
use crate::store::ClusterStore;
use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Optional capabilities of the interactive loop
#[derive(Debug, Default)]
pub struct InteractiveOptions {
    /// Speak prompts through this player; prompts are only synthesized when set
    pub player: Option<Player>,
    pub recordings_dir: PathBuf,
    pub input_device: Option<usize>,
}

/// Render the saved clusters the way the session shows them
pub fn render_clusters(store: &ClusterStore) -> String {
    if store.is_empty() {
        return "No translations saved yet.".to_string();
    }
    let mut out = String::from("## Saved Clusters");
    for (cluster, records) in store.clusters().iter() {
        out.push_str(&format!("\n### Cluster: {cluster}"));
        for (idx, record) in records.iter().enumerate() {
            out.push_str(&format!(
                "\n- [{idx}] English: {}, Ibibio: {}",
                record.source_text, record.target_text
            ));
        }
    }
    out
}

/// Run commands from `input` until `quit` or end of input
pub async fn run<R: BufRead, W: Write>(
    session: &mut TranslationSession,
    options: &InteractiveOptions,
    input: R,
    mut output: W,
) -> Result<()> {
    show_prompt(session, options, &mut output).await?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<SessionCommand>() {
            Ok(command) => command,
            Err(e) => {
                writeln!(output, "{e}")?;
                continue;
            }
        };
        debug!("Session command: {:?}", command);

        if command == SessionCommand::Quit {
            break;
        }

        // Per-command failures are reported and the session continues
        if let Err(e) = execute(session, options, command, &mut output).await {
            writeln!(output, "Error: {e}")?;
        }
    }

    Ok(())
}

async fn show_prompt<W: Write>(
    session: &mut TranslationSession,
    options: &InteractiveOptions,
    output: &mut W,
) -> Result<()> {
    let prompt = session.current_prompt().await.clone();
    if let Some(notice) = &prompt.notice {
        writeln!(output, "{notice}")?;
    }
    writeln!(output, "### English Text: {}", prompt.text)?;

    if let Some(player) = &options.player {
        match session.prompt_audio().await {
            Ok(audio) => {
                // Cut off the previous prompt if it is still speaking
                player.stop()?;
                player.play(audio)?;
            }
            Err(e) => writeln!(output, "Error: {e}")?,
        }
    }
    Ok(())
}

async fn execute<W: Write>(
    session: &mut TranslationSession,
    options: &InteractiveOptions,
    command: SessionCommand,
    output: &mut W,
) -> Result<()> {
    match command {
        SessionCommand::Next => {
            session.next_prompt().await;
            show_prompt(session, options, output).await?;
        }
        SessionCommand::Play => {
            let audio = session.prompt_audio().await?;
            match &options.player {
                Some(player) => player.play_sync(audio)?,
                None => writeln!(output, "Playback is disabled (start with --speak)")?,
            }
        }
        SessionCommand::Text(text) => {
            session.set_translation(text);
        }
        SessionCommand::Audio(path) => {
            let recording = ingest::load_upload(&path)?;
            writeln!(
                output,
                "Attached {} ({:.1}s)",
                path.display(),
                recording.info.duration.as_secs_f32()
            )?;
            session.set_recording(Some(recording));
        }
        SessionCommand::Record(secs) => {
            let phrase = session.current_prompt().await.text.clone();
            let path = options
                .recordings_dir
                .join(capture::recording_file_name(&phrase));
            let device = options.input_device;
            let target = path.clone();
            writeln!(output, "Recording for {secs:.1}s...")?;
            output.flush()?;

            tokio::task::spawn_blocking(move || {
                capture::record_to_file(device, Duration::from_secs_f32(secs), &target)
            })
            .await??;

            let recording = Recording::from_buffer(AudioBuffer::from_file(&path)?)?;
            writeln!(output, "Saved recording to {}", path.display())?;
            session.set_recording(Some(recording));
        }
        SessionCommand::Cluster(name) => {
            session.set_cluster(name);
        }
        SessionCommand::Save => {
            session.save().await?;
            writeln!(output, "Translation saved successfully!")?;
        }
        SessionCommand::Combine(path) => {
            if session.draft().recording.is_none() {
                warn!("Combining without a recording, output is the prompt alone");
            }
            let merged = session.combined_audio().await?;
            merged.write_to(&path)?;
            writeln!(output, "Wrote combined audio to {}", path.display())?;
        }
        SessionCommand::List => {
            writeln!(output, "{}", render_clusters(session.store()))?;
        }
        SessionCommand::Delete { cluster, index } => {
            let removed = session.delete(&cluster, index)?;
            writeln!(
                output,
                "Deleted [{index}] from {cluster}: {}",
                removed.source_text
            )?;
        }
        SessionCommand::Export(path) => {
            session.export_to(&path)?;
            writeln!(output, "Exported translations to {}", path.display())?;
        }
        SessionCommand::Help => {
            writeln!(output, "{HELP}")?;
        }
        SessionCommand::Quit => {}
    }
    Ok(())
}
