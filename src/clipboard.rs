/// Shopping-list copy: system clipboard access plus the short-lived "copied"
/// indicator shown on each plan.
use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

/// How long a plan shows "Copied!" after a successful write.
pub const COPIED_WINDOW: Duration = Duration::from_millis(2000);

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("no clipboard helper found (tried {0})")]
    NoHelper(String),
    #[error("{program} exited with {status}")]
    HelperFailed { program: String, status: ExitStatus },
    #[error("{program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

// ── System clipboard via helper programs ──────────────────────────────────────

/// Pipes text into the first clipboard helper available on this platform.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[cfg(target_os = "macos")]
const HELPERS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(windows)]
const HELPERS: &[(&str, &[&str])] = &[("clip", &[])];

#[cfg(not(any(target_os = "macos", windows)))]
const HELPERS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

impl Clipboard for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        write_via(HELPERS, text)
    }
}

/// Try each helper in order until one takes the text. A helper that is not
/// installed is skipped silently; one that fails is logged and skipped.
/// Returns the last failure, or `NoHelper` when none could be started.
fn write_via(helpers: &[(&str, &[&str])], text: &str) -> Result<(), ClipboardError> {
    let mut last_err = None;
    for &(program, args) in helpers {
        match run_helper(program, args, text) {
            Ok(()) => {
                debug!(program, bytes = text.len(), "copied to clipboard");
                return Ok(());
            }
            Err(ClipboardError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                debug!(error = %e, "clipboard helper failed, trying the next one");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        let tried: Vec<&str> = helpers.iter().map(|(p, _)| *p).collect();
        ClipboardError::NoHelper(tried.join(", "))
    }))
}

fn run_helper(program: &str, args: &[&str], text: &str) -> Result<(), ClipboardError> {
    let io_err = |source| ClipboardError::Io { program: program.to_string(), source };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(io_err)?;

    // stdin is dropped before the wait so the helper sees EOF
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(text.as_bytes()),
        None => Ok(()),
    };
    let status = child.wait().map_err(io_err)?;

    if !status.success() {
        return Err(ClipboardError::HelperFailed { program: program.to_string(), status });
    }
    written.map_err(io_err)
}

// ── Copy feedback ─────────────────────────────────────────────────────────────

/// "Copied" indicator for one rendered plan. It is true from a successful write
/// until `COPIED_WINDOW` later; while true, further triggers do nothing.
#[derive(Debug, Default, Clone)]
pub struct CopyFeedback {
    copied_at: Option<Instant>,
}

impl CopyFeedback {
    pub fn is_copied(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|t| now.saturating_duration_since(t) < COPIED_WINDOW)
    }

    /// Drop an expired indicator. Returns true when it flipped back just now.
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.copied_at.is_some() && !self.is_copied(now) {
            self.copied_at = None;
            return true;
        }
        false
    }

    /// Copy `items` joined by newlines. `Ok(false)` when nothing was written
    /// (empty list, or still inside the copied window).
    pub fn trigger<C: Clipboard + ?Sized>(
        &mut self,
        items: &[String],
        clipboard: &mut C,
        now: Instant,
    ) -> Result<bool, ClipboardError> {
        if items.is_empty() || self.is_copied(now) {
            return Ok(false);
        }
        clipboard.write_text(&items.join("\n"))?;
        self.copied_at = Some(now);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingClipboard {
        writes: Vec<String>,
        fail: bool,
    }

    impl Clipboard for RecordingClipboard {
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError::NoHelper("test".to_string()));
            }
            self.writes.push(text.to_string());
            Ok(())
        }
    }

    #[cfg(unix)]
    fn fake_helper(dir: &std::path::Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    // One test so no other test forks while a helper script is open for writing
    #[cfg(unix)]
    #[test]
    fn test_helpers_tried_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("received");
        let broken = fake_helper(dir.path(), "wl-copy", "exit 1");
        let working = fake_helper(dir.path(), "xclip", &format!("cat > '{}'", out.display()));
        let failing = fake_helper(dir.path(), "xsel", "cat > /dev/null; exit 3");
        let missing = dir.path().join("no-such-helper").to_string_lossy().into_owned();

        // An installed helper that fails falls through to the next one
        let helpers: [(&str, &[&str]); 2] = [
            (broken.as_str(), &[]),
            (working.as_str(), &["-selection", "clipboard"]),
        ];
        write_via(&helpers, "milk\nbread").unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "milk\nbread");

        // Every helper failing reports the last failure
        let helpers: [(&str, &[&str]); 3] =
            [(broken.as_str(), &[]), (missing.as_str(), &[]), (failing.as_str(), &[])];
        match write_via(&helpers, "milk").unwrap_err() {
            ClipboardError::HelperFailed { program, status } => {
                assert_eq!(program, failing);
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }

        // Nothing installed at all
        let helpers: [(&str, &[&str]); 1] = [(missing.as_str(), &[])];
        assert!(matches!(write_via(&helpers, "milk"), Err(ClipboardError::NoHelper(_))));
    }

    fn items() -> Vec<String> {
        vec!["milk".to_string(), "bread".to_string(), "eggs".to_string()]
    }

    #[test]
    fn test_copy_joins_items_with_newlines() {
        let mut cb = RecordingClipboard::default();
        let mut fb = CopyFeedback::default();
        let t0 = Instant::now();
        assert!(fb.trigger(&items(), &mut cb, t0).unwrap());
        assert_eq!(cb.writes, ["milk\nbread\neggs"]);
        assert!(fb.is_copied(t0));
    }

    #[test]
    fn test_second_trigger_inside_window_is_noop() {
        let mut cb = RecordingClipboard::default();
        let mut fb = CopyFeedback::default();
        let t0 = Instant::now();
        assert!(fb.trigger(&items(), &mut cb, t0).unwrap());
        assert!(!fb.trigger(&items(), &mut cb, t0 + Duration::from_millis(1999)).unwrap());
        assert_eq!(cb.writes.len(), 1);
    }

    #[test]
    fn test_indicator_reverts_at_two_seconds() {
        let mut cb = RecordingClipboard::default();
        let mut fb = CopyFeedback::default();
        let t0 = Instant::now();
        fb.trigger(&items(), &mut cb, t0).unwrap();

        assert!(fb.is_copied(t0 + Duration::from_millis(1999)));
        assert!(!fb.is_copied(t0 + COPIED_WINDOW));
        assert!(!fb.expire(t0 + Duration::from_millis(1500)));
        assert!(fb.expire(t0 + COPIED_WINDOW));
        assert!(!fb.expire(t0 + COPIED_WINDOW));

        // A new window can start once the old one is over
        assert!(fb.trigger(&items(), &mut cb, t0 + COPIED_WINDOW).unwrap());
        assert_eq!(cb.writes.len(), 2);
    }

    #[test]
    fn test_failed_write_leaves_indicator_off() {
        let mut cb = RecordingClipboard { fail: true, ..Default::default() };
        let mut fb = CopyFeedback::default();
        let t0 = Instant::now();
        assert!(fb.trigger(&items(), &mut cb, t0).is_err());
        assert!(!fb.is_copied(t0));
    }

    #[test]
    fn test_empty_list_writes_nothing() {
        let mut cb = RecordingClipboard::default();
        let mut fb = CopyFeedback::default();
        assert!(!fb.trigger(&[], &mut cb, Instant::now()).unwrap());
        assert!(cb.writes.is_empty());
    }
}
