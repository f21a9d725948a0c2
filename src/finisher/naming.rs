use crate::error::{BoothError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

const COUNT_WIDTH: usize = 5;
const SHOT_INFIX: &str = "_shot_";

/// How output files are named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingScheme {
    /// Zero-padded counter continuing after existing files
    #[default]
    Sequential,
    /// Session id based names
    Random,
}

/// Produces destination names for composites and single shots.
///
/// Names are relative to the storage directory and carry no extension.
#[derive(Debug, Clone)]
pub struct PictureNaming {
    basename: String,
    scheme: NamingScheme,
    composite_counter: u32,
    shot_counter: u32,
    session: Uuid,
}

impl PictureNaming {
    /// Create a new naming scheme, expanding `strftime` fields in the
    /// basename with the current local time
    pub fn new(basedir: &Path, basename: &str, scheme: NamingScheme) -> Result<Self> {
        let basename = expand_basename(basename)?;
        let mut naming = Self::with_basename(basename, scheme);

        if scheme == NamingScheme::Sequential {
            naming.composite_counter = last_counter(basedir, &naming.basename)?;
            naming.shot_counter =
                last_counter(basedir, &format!("{}{}", naming.basename, SHOT_INFIX))?;
            info!(
                "Number of last existing file: {} ({} shots)",
                naming.composite_counter, naming.shot_counter
            );
        }
        info!(
            "Saving pictures as '{}' with {:?} naming",
            basedir.join(&naming.basename).display(),
            scheme
        );

        Ok(naming)
    }

    /// Naming for an already expanded basename, counters starting at zero
    pub fn with_basename(basename: String, scheme: NamingScheme) -> Self {
        Self {
            basename,
            scheme,
            composite_counter: 0,
            shot_counter: 0,
            session: Uuid::new_v4(),
        }
    }

    /// Reset the random id for a new session
    pub fn start_session(&mut self, session: Uuid) {
        self.session = session;
    }

    pub fn next_composite(&mut self) -> String {
        match self.scheme {
            NamingScheme::Sequential => {
                self.composite_counter += 1;
                format!(
                    "{}{:0width$}",
                    self.basename,
                    self.composite_counter,
                    width = COUNT_WIDTH
                )
            }
            NamingScheme::Random => format!("{}-{}", self.basename, self.session),
        }
    }

    /// Name for shot `index` of the current session
    pub fn next_shot(&mut self, index: u32) -> String {
        match self.scheme {
            NamingScheme::Sequential => {
                self.shot_counter += 1;
                format!(
                    "{}{}{:0width$}",
                    self.basename,
                    SHOT_INFIX,
                    self.shot_counter,
                    width = COUNT_WIDTH
                )
            }
            NamingScheme::Random => {
                format!("{}-{}{}{}", self.basename, self.session, SHOT_INFIX, index)
            }
        }
    }
}

fn expand_basename(pattern: &str) -> Result<String> {
    let mut expanded = String::new();
    write!(expanded, "{}", chrono::Local::now().format(pattern))
        .map_err(|_| BoothError::system(format!("Invalid basename pattern '{}'", pattern)))?;
    if expanded.trim().is_empty() {
        return Err(BoothError::system("Basename must not be empty"));
    }
    Ok(expanded)
}

/// Highest `<prefix>NNNNN.<ext>` counter below `basedir`, or zero
fn last_counter(basedir: &Path, prefix: &str) -> Result<u32> {
    let full = basedir.join(prefix);
    let (dir, stem) = if prefix.ends_with(std::path::MAIN_SEPARATOR) {
        // Files are named by counter only
        (full, String::new())
    } else {
        let dir = full
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let stem = full
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        (dir, stem)
    };

    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut last = 0;
    for entry in entries {
        let name = entry?.file_name().to_string_lossy().into_owned();
        let Some(rest) = name.strip_prefix(&stem) else {
            continue;
        };
        let Some((digits, _extension)) = rest.split_once('.') else {
            continue;
        };
        if digits.len() != COUNT_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        if let Ok(counter) = digits.parse::<u32>() {
            last = last.max(counter);
        }
    }
    Ok(last)
}
