//! Interactive session command grammar

use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Fetch a new prompt
    Next,
    /// Speak the current prompt
    Play,
    /// Set the text translation
    Text(String),
    /// Attach an uploaded `.wav` recording
    Audio(PathBuf),
    /// Record from the microphone for this many seconds
    Record(f32),
    /// Set the cluster name
    Cluster(String),
    /// Save the form
    Save,
    /// Write prompt speech + recording to a file
    Combine(PathBuf),
    List,
    Delete { cluster: String, index: usize },
    Export(PathBuf),
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  next                    fetch a new English prompt
  play                    speak the current prompt
  text <translation>      set the Ibibio translation
  audio <file.wav>        attach a recorded translation
  record <seconds>        record a translation from the microphone
  cluster <name>          set the cluster name
  save                    save the translation
  combine <out.wav>       write prompt speech followed by the recording
  list                    show saved clusters
  delete <cluster> <idx>  remove a saved translation
  export <file.json>      write all translations to a file
  help                    show this help
  quit                    leave the session";

/// Longest recording accepted, in seconds
pub const MAX_RECORD_SECONDS: f32 = 600.0;

/// Parse a recording length. Rejects zero, negative, NaN and anything
/// above `MAX_RECORD_SECONDS`.
pub fn parse_record_seconds(value: &str) -> Result<f32, String> {
    let secs: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    if !(secs > 0.0 && secs <= MAX_RECORD_SECONDS) {
        return Err(format!(
            "record duration must be between 0 and {MAX_RECORD_SECONDS} seconds"
        ));
    }
    Ok(secs)
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let require = |what: &str| -> Result<String, String> {
            if rest.is_empty() {
                Err(format!("'{word}' needs {what}"))
            } else {
                Ok(rest.to_string())
            }
        };

        match word.to_lowercase().as_str() {
            "next" | "n" => Ok(SessionCommand::Next),
            "play" | "p" => Ok(SessionCommand::Play),
            "text" | "t" => require("a translation").map(SessionCommand::Text),
            "audio" => require("a .wav file").map(|p| SessionCommand::Audio(p.into())),
            "record" => require("a duration in seconds")
                .and_then(|secs| parse_record_seconds(&secs))
                .map(SessionCommand::Record),
            "cluster" | "c" => require("a cluster name").map(SessionCommand::Cluster),
            "save" | "s" => Ok(SessionCommand::Save),
            "combine" => require("an output file").map(|p| SessionCommand::Combine(p.into())),
            "list" | "ls" => Ok(SessionCommand::List),
            "delete" | "rm" => {
                // Cluster names may contain spaces; the index is the last word
                let (cluster, index) = rest
                    .rsplit_once(char::is_whitespace)
                    .ok_or_else(|| "usage: delete <cluster> <index>".to_string())?;
                let index = index
                    .parse()
                    .map_err(|_| format!("'{index}' is not a valid index"))?;
                Ok(SessionCommand::Delete {
                    cluster: cluster.trim().to_string(),
                    index,
                })
            }
            "export" => require("an output file").map(|p| SessionCommand::Export(p.into())),
            "help" | "?" => Ok(SessionCommand::Help),
            "quit" | "exit" | "q" => Ok(SessionCommand::Quit),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command '{other}', try 'help'")),
        }
    }
}
