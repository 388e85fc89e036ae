//! Tree-mirror strategies.
//!
//! A mirror makes a destination directory identical to a source directory,
//! deleting whatever the source no longer has. [`Rsync`] shells out to
//! `rsync`; [`NativeMirror`] does the same walk in-process.

use crate::error::TransferError;
use crate::file_util;
use clap::ValueEnum;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// A recursive, deleting directory sync.
pub trait Mirror {
    /// The operation as it would be shown in a dry run.
    fn describe(&self, src: &Path, dest: &Path) -> String;

    /// Mirrors `src` into `dest`, handing each line of progress output to
    /// `on_line`. Blocks until the mirror has finished.
    fn mirror(
        &self,
        src: &Path,
        dest: &Path,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<(), TransferError>;
}

/// Which [`Mirror`] implementation to use.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MirrorBackend {
    /// `rsync -av --delete`
    #[default]
    Rsync,
    /// Built-in copy and prune
    Native,
}

impl MirrorBackend {
    pub fn build(self) -> Box<dyn Mirror> {
        match self {
            MirrorBackend::Rsync => Box::new(Rsync::default()),
            MirrorBackend::Native => Box::new(NativeMirror),
        }
    }
}

/// Mirrors with `rsync -av --delete <src>/. <dest>/.`.
#[derive(Debug, Clone)]
pub struct Rsync {
    program: String,
}

impl Default for Rsync {
    fn default() -> Self {
        Self {
            program: "rsync".to_string(),
        }
    }
}

impl Rsync {
    /// Uses `program` instead of the `rsync` found on `PATH`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, src: &Path, dest: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-av")
            .arg("--delete")
            .arg(src.join("."))
            .arg(dest.join("."));
        cmd
    }
}

impl Mirror for Rsync {
    fn describe(&self, src: &Path, dest: &Path) -> String {
        let cmd = self.command(src, dest);
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        format!("{} {}", cmd.get_program().to_string_lossy(), args.join(" "))
    }

    fn mirror(
        &self,
        src: &Path,
        dest: &Path,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<(), TransferError> {
        let mut cmd = self.command(src, dest);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!(command = %self.describe(src, dest), "spawning mirror");

        let mut child = cmd.spawn().map_err(|source| TransferError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // Drain stderr on the side so a chatty child cannot block on a full pipe.
        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                String::from_utf8_lossy(&buf).into_owned()
            })
        });

        // A read failure must not leave the child running while the next item
        // starts, so it is held until the child has been reaped.
        let mut output = String::new();
        let mut read_error = None;
        if let Some(stdout) = child.stdout.take() {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(e) => {
                        read_error = Some(e);
                        break;
                    }
                }
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                on_line(line);
                output.push_str(line);
                output.push('\n');
            }
        }

        // The stream ending says nothing about success; ask for the status.
        let status = child.wait()?;
        let errors = stderr
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        if let Some(e) = read_error {
            return Err(TransferError::Io(e));
        }

        if status.success() {
            Ok(())
        } else {
            output.push_str(&errors);
            Err(TransferError::Exit {
                program: self.program.clone(),
                code: status.code(),
                output: output.trim_end().to_string(),
            })
        }
    }
}

/// In-process mirror built on [`file_util::mirror_tree`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeMirror;

impl Mirror for NativeMirror {
    fn describe(&self, src: &Path, dest: &Path) -> String {
        format!("mirror {} => {}", src.display(), dest.display())
    }

    fn mirror(
        &self,
        src: &Path,
        dest: &Path,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<(), TransferError> {
        let changed = file_util::mirror_tree(src, dest)?;
        on_line(&format!("{changed} entries updated"));
        Ok(())
    }
}
