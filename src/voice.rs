//! Voice input: a recognizer is started once and later hands back a single
//! transcript. Capture cannot be cancelled once started.

use std::process::Command;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use crate::model::config::VoiceConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoiceError {
    #[error("Speech recognition not supported.")]
    Unsupported,
    #[error("speech recognition failed: {0}")]
    Failed(String),
    #[error("no transcript received within {0} seconds")]
    TimedOut(u64),
    #[error("recognizer stopped without a transcript")]
    Disconnected,
}

/// Write end handed to a recognizer. Consumed by `deliver`, so at most one
/// result is ever sent.
pub struct TranscriptSink(Sender<Result<String, VoiceError>>);

impl TranscriptSink {
    pub fn deliver(self, result: Result<String, VoiceError>) {
        // The receiver may already be gone; nothing is waiting then.
        let _ = self.0.send(result);
    }
}

/// Read end of a started capture.
pub struct PendingTranscript(Receiver<Result<String, VoiceError>>);

impl PendingTranscript {
    /// Non-blocking check. `None` while the recognizer is still working.
    pub fn poll(&self) -> Option<Result<String, VoiceError>> {
        match self.0.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(VoiceError::Disconnected)),
        }
    }

    /// Block until the transcript arrives or `timeout` passes.
    pub fn wait(&self, timeout: Duration) -> Result<String, VoiceError> {
        match self.0.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(VoiceError::TimedOut(timeout.as_secs())),
            Err(RecvTimeoutError::Disconnected) => Err(VoiceError::Disconnected),
        }
    }
}

/// A speech-to-text capability.
pub trait SpeechRecognizer {
    /// Begin capturing. Returns `Unsupported` when the capability is missing;
    /// otherwise the transcript is delivered through `sink`, possibly later
    /// and from another thread.
    fn start(&mut self, sink: TranscriptSink) -> Result<(), VoiceError>;
}

/// Start a capture and return the handle its transcript will arrive on.
pub fn begin_capture(
    recognizer: &mut dyn SpeechRecognizer,
) -> Result<PendingTranscript, VoiceError> {
    let (tx, rx) = mpsc::channel();
    recognizer.start(TranscriptSink(tx))?;
    Ok(PendingTranscript(rx))
}

/// Host without speech recognition.
pub struct Unsupported;

impl SpeechRecognizer for Unsupported {
    fn start(&mut self, _sink: TranscriptSink) -> Result<(), VoiceError> {
        Err(VoiceError::Unsupported)
    }
}

/// Runs an external speech-to-text command on a worker thread; its trimmed
/// stdout is the transcript.
pub struct CommandRecognizer {
    command: String,
}

impl CommandRecognizer {
    pub fn new(command: impl Into<String>) -> Self {
        CommandRecognizer {
            command: command.into(),
        }
    }

    /// Recognizer configured in `[voice]`, or `Unsupported` when no command is set.
    pub fn from_config(config: &VoiceConfig) -> Box<dyn SpeechRecognizer> {
        if config.command.trim().is_empty() {
            Box::new(Unsupported)
        } else {
            Box::new(CommandRecognizer::new(config.command.trim()))
        }
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn start(&mut self, sink: TranscriptSink) -> Result<(), VoiceError> {
        if self.command.trim().is_empty() {
            return Err(VoiceError::Unsupported);
        }
        let command = self.command.clone();
        thread::Builder::new()
            .name("voice-capture".into())
            .spawn(move || sink.deliver(run_transcriber(&command)))
            .map_err(|e| VoiceError::Failed(e.to_string()))?;
        Ok(())
    }
}

fn run_transcriber(command: &str) -> Result<String, VoiceError> {
    let output = shell(command)
        .output()
        .map_err(|e| VoiceError::Failed(format!("could not run '{}': {}", command, e)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VoiceError::Failed(format!(
            "'{}' exited with {}: {}",
            command,
            output.status,
            stderr.trim()
        )));
    }
    let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if transcript.is_empty() {
        return Err(VoiceError::Failed("empty transcript".to_string()));
    }
    Ok(transcript)
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(not(unix))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_fails_to_start() {
        assert_eq!(
            begin_capture(&mut Unsupported).err(),
            Some(VoiceError::Unsupported)
        );
    }

    #[test]
    fn empty_command_is_unsupported() {
        let config = VoiceConfig::default();
        let mut recognizer = CommandRecognizer::from_config(&config);
        assert!(matches!(
            begin_capture(recognizer.as_mut()),
            Err(VoiceError::Unsupported)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn command_stdout_is_transcript() {
        let mut recognizer = CommandRecognizer::new("echo '  buy some bread  '");
        let pending = begin_capture(&mut recognizer).unwrap();
        assert_eq!(
            pending.wait(Duration::from_secs(10)).unwrap(),
            "buy some bread"
        );
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_reports_failure() {
        let mut recognizer = CommandRecognizer::new("exit 3");
        let pending = begin_capture(&mut recognizer).unwrap();
        assert!(matches!(
            pending.wait(Duration::from_secs(10)),
            Err(VoiceError::Failed(_))
        ));
    }

    #[test]
    fn dropped_sink_is_disconnected() {
        struct Forgetful;
        impl SpeechRecognizer for Forgetful {
            fn start(&mut self, sink: TranscriptSink) -> Result<(), VoiceError> {
                drop(sink);
                Ok(())
            }
        }
        let pending = begin_capture(&mut Forgetful).unwrap();
        assert_eq!(pending.poll(), Some(Err(VoiceError::Disconnected)));
    }

    #[test]
    fn poll_before_delivery_is_none() {
        struct Slow(Option<TranscriptSink>);
        impl SpeechRecognizer for Slow {
            fn start(&mut self, sink: TranscriptSink) -> Result<(), VoiceError> {
                self.0 = Some(sink);
                Ok(())
            }
        }
        let mut slow = Slow(None);
        let pending = begin_capture(&mut slow).unwrap();
        assert_eq!(pending.poll(), None);
        slow.0.take().unwrap().deliver(Ok("study".into()));
        assert_eq!(pending.poll(), Some(Ok("study".into())));
    }
}
