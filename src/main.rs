//! Ibibio Translator - collect English to Ibibio translations
//!
//! Command line front end over the translation store.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ibibio_translator::audio::merge::merge_audio;
use ibibio_translator::audio::playback::Player;
use ibibio_translator::audio::{capture, ingest};
use ibibio_translator::config::{config_path, Config};
use ibibio_translator::session::interactive::{self, render_clusters, InteractiveOptions};
use ibibio_translator::session::command::parse_record_seconds;
use ibibio_translator::session::{Submission, TranslationSession};
use ibibio_translator::store::ClusterStore;
use ibibio_translator::{prompts, tts};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Translation store file (defaults to the configured path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Move a corrupt store aside and start empty instead of failing
    #[arg(long, global = true)]
    recover: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a new English prompt
    Prompt {
        /// Speak the prompt
        #[arg(long)]
        speak: bool,
        /// Write the prompt speech to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Save a translation
    Add {
        #[arg(long)]
        cluster: String,
        #[arg(long)]
        english: String,
        #[arg(long, default_value = "")]
        ibibio: String,
        /// Recorded translation (.wav)
        #[arg(long)]
        audio: Option<PathBuf>,
    },
    /// Show saved translations
    List {
        /// Only this cluster
        cluster: Option<String>,
    },
    /// Remove a saved translation by position
    Delete {
        #[arg(long)]
        cluster: String,
        #[arg(long)]
        index: usize,
    },
    /// Write all translations as JSON (stdout by default)
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write prompt speech followed by a recording
    Merge {
        #[arg(long)]
        english: String,
        #[arg(long)]
        recording: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Record a translation from the microphone
    Record {
        #[arg(long, value_parser = parse_record_seconds)]
        seconds: f32,
        #[arg(long)]
        out: PathBuf,
        /// Audio input device index
        #[arg(long)]
        device: Option<usize>,
    },
    /// List audio input devices
    Devices,
    /// Show the effective configuration
    Config {
        /// Write it to the config file so it can be edited
        #[arg(long)]
        write: bool,
    },
    /// Interactive translation session (default)
    Session {
        /// Speak each prompt
        #[arg(long)]
        speak: bool,
        /// Audio input device index
        #[arg(long)]
        device: Option<usize>,
    },
}

fn init_logging(verbose: bool, config: &Config) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(args: &Args, config: &Config) -> Result<ClusterStore> {
    let path = args
        .store
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.store_path));
    let store = if args.recover {
        ClusterStore::load_or_recover(path)?
    } else {
        ClusterStore::load(path)?
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;
    init_logging(args.verbose, &config);

    info!("🗣️ Ibibio Translator v{} starting...", env!("CARGO_PKG_VERSION"));

    let default_command = Commands::Session {
        speak: false,
        device: None,
    };
    let command = args.command.as_ref().unwrap_or(&default_command);

    match command {
        Commands::Prompt { speak, out } => {
            let provider = prompts::create_provider(&config);
            let prompt = provider.next().await;
            if let Some(notice) = &prompt.notice {
                eprintln!("{notice}");
            }
            println!("{}", prompt.text);

            if *speak || out.is_some() {
                let engine = tts::create_engine(&config)?;
                let audio = engine.synthesize(&prompt.text).await?;
                if let Some(path) = out {
                    audio.write_to(path)?;
                    info!("💾 Wrote prompt speech to {}", path.display());
                }
                if *speak {
                    Player::new()?.play_sync(audio)?;
                }
            }
        }
        Commands::Add {
            cluster,
            english,
            ibibio,
            audio,
        } => {
            if let Some(path) = audio {
                ingest::load_upload(path)?;
            }
            let submission = Submission {
                source_text: english.clone(),
                translation_text: ibibio.clone(),
                has_audio: audio.is_some(),
                cluster: cluster.clone(),
            };
            let target_text = submission.resolve()?;
            let mut store = open_store(&args, &config)?;
            store.add_translation(english, &target_text, cluster)?;
            println!("Translation saved successfully!");
        }
        Commands::List { cluster } => {
            let store = open_store(&args, &config)?;
            match cluster {
                Some(name) => {
                    for (idx, record) in store.list(name)?.iter().enumerate() {
                        println!(
                            "- [{idx}] English: {}, Ibibio: {}",
                            record.source_text, record.target_text
                        );
                    }
                }
                None => println!("{}", render_clusters(&store)),
            }
        }
        Commands::Delete { cluster, index } => {
            let mut store = open_store(&args, &config)?;
            let removed = store.delete_translation(cluster, *index)?;
            println!("Deleted [{index}] from {cluster}: {}", removed.source_text);
        }
        Commands::Export { out } => {
            let store = open_store(&args, &config)?;
            let json = store.export_json()?;
            match out {
                Some(path) => {
                    std::fs::write(path, json)?;
                    info!("📤 Exported translations to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Merge {
            english,
            recording,
            out,
        } => {
            let engine = tts::create_engine(&config)?;
            let speech = engine.synthesize(english).await?;
            let recording = recording.as_deref().map(ingest::load_upload).transpose()?;
            let merged = merge_audio(
                &speech,
                recording.as_ref().map(|r| &r.buffer),
                config.merge_gap(),
            )?;
            merged.write_to(out)?;
            println!("Wrote combined audio to {}", out.display());
        }
        Commands::Record {
            seconds,
            out,
            device,
        } => {
            let (device, out) = (*device, out.clone());
            let duration = Duration::from_secs_f32(*seconds);
            let path = tokio::task::spawn_blocking(move || {
                capture::record_to_file(device, duration, &out)
            })
            .await??;
            println!("Saved recording to {}", path.display());
        }
        Commands::Config { write } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if *write {
                config.save()?;
                println!("Wrote configuration to {}", config_path().display());
            }
        }
        Commands::Devices => {
            for (i, name) in capture::list_devices(None)?.iter().enumerate() {
                println!("[{i}] {name}");
            }
        }
        Commands::Session { speak, device } => {
            let store = open_store(&args, &config)?;
            let mut session = TranslationSession::from_config(&config, store)?;
            let options = InteractiveOptions {
                player: if *speak { Some(Player::new()?) } else { None },
                recordings_dir: PathBuf::from(&config.recordings_dir),
                input_device: *device,
            };

            println!("English to Ibibio Translation ('help' lists commands)");
            let stdin = std::io::stdin();
            interactive::run(&mut session, &options, stdin.lock(), std::io::stdout()).await?;
        }
    }

    Ok(())
}
