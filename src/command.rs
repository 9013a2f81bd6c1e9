//! Command Module
//!
//! A line-oriented command set over the engine's operations, used by the
//! `logfs-shell` binary and by scripted tests.
//!
//! ## Grammar
//! ```text
//! mkdir <path>              create a directory
//! create <path>             create an empty file
//! rm <path>                 remove a file or empty directory
//! mv <from> <to>            rename / move
//! ls [path]                 list a directory (default "/")
//! stat <path>               attributes
//! cat <path>                file content
//! write <path> <text...>    replace file content with the rest of the line
//! writeat <path> <offset> <text...>
//! truncate <path> <size>    resize
//! utime <path> [atime]      touch timestamps
//! stats | verify | sync
//! ```
//! Blank lines and lines starting with `#` are ignored.

use std::fmt;

use crate::engine::{Attributes, Engine};
use crate::error::{LogFsError, Result};
use crate::log::LogStats;
use crate::record::InodeKind;
use crate::table::InodeId;
use crate::verify::VerifyReport;

/// A parsed engine command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mkdir { path: String },
    Create { path: String },
    Remove { path: String },
    Rename { from: String, to: String },
    List { path: String },
    Stat { path: String },
    Read { path: String },
    Write { path: String, data: Vec<u8> },
    WriteAt { path: String, offset: u64, data: Vec<u8> },
    Truncate { path: String, size: u64 },
    Utime { path: String, accessed: Option<i64> },
    Stats,
    Verify,
    Sync,
}

impl Command {
    /// Parse one line; `Ok(None)` for blank and comment lines
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (verb, rest) = split_word(line);
        let command = match verb {
            "mkdir" => Command::Mkdir {
                path: single_arg(verb, rest)?,
            },
            "create" => Command::Create {
                path: single_arg(verb, rest)?,
            },
            "rm" => Command::Remove {
                path: single_arg(verb, rest)?,
            },
            "mv" => {
                let (from, rest) = required_word(verb, rest)?;
                let to = single_arg(verb, rest)?;
                Command::Rename {
                    from: from.to_string(),
                    to,
                }
            }
            "ls" => Command::List {
                path: if rest.is_empty() {
                    "/".to_string()
                } else {
                    single_arg(verb, rest)?
                },
            },
            "stat" => Command::Stat {
                path: single_arg(verb, rest)?,
            },
            "cat" => Command::Read {
                path: single_arg(verb, rest)?,
            },
            "write" => {
                let (path, text) = required_word(verb, rest)?;
                Command::Write {
                    path: path.to_string(),
                    data: text.as_bytes().to_vec(),
                }
            }
            "writeat" => {
                let (path, rest) = required_word(verb, rest)?;
                let (offset, text) = required_word(verb, rest)?;
                Command::WriteAt {
                    path: path.to_string(),
                    offset: parse_number(verb, offset)?,
                    data: text.as_bytes().to_vec(),
                }
            }
            "truncate" => {
                let (path, rest) = required_word(verb, rest)?;
                Command::Truncate {
                    path: path.to_string(),
                    size: parse_number(verb, &single_arg(verb, rest)?)?,
                }
            }
            "utime" => {
                let (path, rest) = required_word(verb, rest)?;
                let accessed = if rest.is_empty() {
                    None
                } else {
                    Some(parse_number(verb, &single_arg(verb, rest)?)?)
                };
                Command::Utime {
                    path: path.to_string(),
                    accessed,
                }
            }
            "stats" => no_args(verb, rest, Command::Stats)?,
            "verify" => no_args(verb, rest, Command::Verify)?,
            "sync" => no_args(verb, rest, Command::Sync)?,
            other => {
                return Err(LogFsError::Command(format!("unknown command {:?}", other)));
            }
        };

        Ok(Some(command))
    }

    /// Whether the command can change engine state
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Command::List { .. }
                | Command::Stat { .. }
                | Command::Read { .. }
                | Command::Stats
                | Command::Verify
        )
    }
}

/// Result of executing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Done,
    Created(InodeId),
    Names(Vec<String>),
    Attributes(Attributes),
    Content(Vec<u8>),
    Written(usize),
    Stats(LogStats),
    Report(VerifyReport),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Done => write!(f, "ok"),
            Output::Created(id) => write!(f, "created {}", id),
            Output::Names(names) => write!(f, "{}", names.join("\n")),
            Output::Attributes(attrs) => write!(
                f,
                "id={} kind={} size={} mode={:o} modified={} accessed={}",
                attrs.id,
                match attrs.kind {
                    InodeKind::Directory => "directory",
                    InodeKind::File => "file",
                },
                attrs.size,
                attrs.mode(),
                attrs.modified,
                attrs.accessed
            ),
            Output::Content(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Output::Written(count) => write!(f, "wrote {} bytes", count),
            Output::Stats(stats) => write!(
                f,
                "cursor={}:{} written={} relocated={} rollovers={} wraps={} cleanings={} live_inodes={} live_blocks={}",
                stats.segment,
                stats.block,
                stats.blocks_written,
                stats.blocks_relocated,
                stats.rollovers,
                stats.wraps,
                stats.cleanings,
                stats.live_inodes,
                stats.live_blocks
            ),
            Output::Report(report) if report.is_clean() => write!(
                f,
                "clean: {} inodes, {} blocks",
                report.inodes_checked, report.blocks_referenced
            ),
            Output::Report(report) => write!(f, "{}", report.problems.join("\n")),
        }
    }
}

impl Engine {
    /// Execute a command
    ///
    /// Routes commands to the matching engine operation
    pub fn execute(&mut self, command: Command) -> Result<Output> {
        tracing::trace!("Executing {:?}", command);

        match command {
            Command::Mkdir { path } => self
                .create_entry(&path, InodeKind::Directory)
                .map(Output::Created),
            Command::Create { path } => self
                .create_entry(&path, InodeKind::File)
                .map(Output::Created),
            Command::Remove { path } => self.remove_entry(&path).map(|_| Output::Done),
            Command::Rename { from, to } => self.rename_entry(&from, &to).map(|_| Output::Done),
            Command::List { path } => self.list_children(&path).map(Output::Names),
            Command::Stat { path } => self.get_attributes(&path).map(Output::Attributes),
            Command::Read { path } => self.read_all(&path).map(Output::Content),
            Command::Write { path, data } => self.write_bytes(&path, &data).map(Output::Written),
            Command::WriteAt { path, offset, data } => {
                self.write_at(&path, offset, &data).map(Output::Written)
            }
            Command::Truncate { path, size } => self.resize(&path, size).map(|_| Output::Done),
            Command::Utime { path, accessed } => {
                self.update_times(&path, accessed).map(|_| Output::Done)
            }
            Command::Stats => self.stats().map(Output::Stats),
            Command::Verify => self.verify().map(Output::Report),
            Command::Sync => self.sync().map(|_| Output::Done),
        }
    }
}

// =============================================================================
// Parsing Helpers
// =============================================================================

/// First whitespace-delimited word and the trimmed remainder
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(end) => (&s[..end], s[end..].trim_start()),
        None => (s, ""),
    }
}

fn required_word<'a>(verb: &str, rest: &'a str) -> Result<(&'a str, &'a str)> {
    let (word, rest) = split_word(rest);
    if word.is_empty() {
        return Err(LogFsError::Command(format!("{}: missing argument", verb)));
    }
    Ok((word, rest))
}

fn single_arg(verb: &str, rest: &str) -> Result<String> {
    let (word, extra) = required_word(verb, rest)?;
    if !extra.is_empty() {
        return Err(LogFsError::Command(format!(
            "{}: unexpected argument {:?}",
            verb, extra
        )));
    }
    Ok(word.to_string())
}

fn no_args(verb: &str, rest: &str, command: Command) -> Result<Command> {
    if !rest.is_empty() {
        return Err(LogFsError::Command(format!("{} takes no arguments", verb)));
    }
    Ok(command)
}

fn parse_number<T: std::str::FromStr>(verb: &str, word: &str) -> Result<T> {
    word.parse()
        .map_err(|_| LogFsError::Command(format!("{}: {:?} is not a number", verb, word)))
}
