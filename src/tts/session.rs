//! Speech synthesis processes.
//!
//! A [`SpeechSynthesizer`] turns text into a running [`SpeechSession`].  The
//! production [`CommandSynthesizer`] launches an external program (by default
//! `festival --tts`) directly, without a shell.  The text reaches the program
//! either on stdin or as a single argv element, so no quoting in the text can
//! turn into command execution.
//!
//! On Unix the program is started as the leader of a new process group, and
//! termination sends `SIGKILL` to the whole group.  Helpers forked by the
//! engine (audio players and the like) die with it.

use std::io::Write;
use std::process::{Child, Command, Stdio};

use thiserror::Error;

use crate::config::{TextDelivery, TtsConfig};

/// Argument placeholder replaced by the text in [`TextDelivery::Argument`] mode.
pub const TEXT_PLACEHOLDER: &str = "{text}";

#[derive(Debug, Error)]
pub enum SpeakError {
    #[error("failed to launch speech program `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// One running synthesis.
pub trait SpeechSession: Send {
    /// Non-blocking.  A session that crashed counts as finished.
    fn has_finished(&mut self) -> bool;

    /// Stop playback immediately.  Calling it on a finished session is a no-op.
    fn terminate(&mut self);
}

/// Starts speech sessions.
pub trait SpeechSynthesizer: Send + Sync {
    fn start(&self, text: &str) -> Result<Box<dyn SpeechSession>, SpeakError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechSynthesizer>, _: Box<dyn SpeechSession>) {}
};

/// Remove control characters other than newline and tab.
///
/// ```
/// use voice_assistant::tts::sanitize_text;
///
/// assert_eq!(sanitize_text("Hi\u{7}\tthere\r\n"), "Hi\tthere\n");
/// ```
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect()
}

// ---------------------------------------------------------------------------
// CommandSynthesizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
    delivery: TextDelivery,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>, args: Vec<String>, delivery: TextDelivery) -> Self {
        Self {
            program: program.into(),
            args,
            delivery,
        }
    }

    pub fn from_config(config: &TtsConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone(), config.delivery)
    }

    /// Argument list for one utterance.
    ///
    /// In argument mode every `{text}` placeholder is replaced; without a
    /// placeholder the text is appended as the last argument.
    pub fn arguments(&self, text: &str) -> Vec<String> {
        match self.delivery {
            TextDelivery::Stdin => self.args.clone(),
            TextDelivery::Argument => {
                let mut args: Vec<String> = self
                    .args
                    .iter()
                    .map(|a| a.replace(TEXT_PLACEHOLDER, text))
                    .collect();
                if !self.args.iter().any(|a| a.contains(TEXT_PLACEHOLDER)) {
                    args.push(text.to_owned());
                }
                args
            }
        }
    }

    fn command(&self, text: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.arguments(text))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(match self.delivery {
                TextDelivery::Stdin => Stdio::piped(),
                TextDelivery::Argument => Stdio::null(),
            });

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        cmd
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn start(&self, text: &str) -> Result<Box<dyn SpeechSession>, SpeakError> {
        let mut child = self.command(text).spawn().map_err(|source| SpeakError::Launch {
            program: self.program.clone(),
            source,
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            // Written from a helper so a slow reader never blocks the poll loop.
            let payload = format!("{text}\n");
            let spawned = std::thread::Builder::new()
                .name("tts-stdin".into())
                .spawn(move || {
                    if let Err(e) = stdin.write_all(payload.as_bytes()) {
                        log::debug!("tts: stdin closed early: {e}");
                    }
                });
            if let Err(e) = spawned {
                log::warn!("tts: could not start stdin writer: {e}");
            }
        }

        log::debug!("tts: started {} (pid {})", self.program, child.id());
        Ok(Box::new(ProcessSession::new(child)))
    }
}

// ---------------------------------------------------------------------------
// ProcessSession
// ---------------------------------------------------------------------------

/// A running synthesis process.  Dropping it while it still runs terminates
/// its process group.
pub struct ProcessSession {
    child: Child,
    done: bool,
}

impl ProcessSession {
    fn new(child: Child) -> Self {
        Self { child, done: false }
    }

    #[cfg(unix)]
    fn kill_group(&mut self) {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let pgid = Pid::from_raw(self.child.id() as i32);
        if let Err(e) = killpg(pgid, Signal::SIGKILL) {
            log::debug!("tts: killpg failed ({e}), killing leader only");
            let _ = self.child.kill();
        }
    }

    #[cfg(not(unix))]
    fn kill_group(&mut self) {
        let _ = self.child.kill();
    }
}

impl SpeechSession for ProcessSession {
    fn has_finished(&mut self) -> bool {
        if self.done {
            return true;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    log::warn!("tts: speech program exited with {status}");
                }
                self.done = true;
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("tts: lost track of speech program: {e}");
                self.done = true;
            }
        }
        self.done
    }

    fn terminate(&mut self) {
        if self.has_finished() {
            return;
        }
        self.kill_group();
        // Reap so no zombie is left behind.
        if let Err(e) = self.child.wait() {
            log::warn!("tts: wait after kill failed: {e}");
        }
        self.done = true;
        log::debug!("tts: terminated pid {}", self.child.id());
    }
}

impl Drop for ProcessSession {
    fn drop(&mut self) {
        self.terminate();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
