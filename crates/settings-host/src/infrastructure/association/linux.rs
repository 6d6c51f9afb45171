//! Linux file associations via the XDG desktop specifications.
//!
//! # How Linux desktops pick a handler (for beginners)
//!
//! There is no single registry.  Three user-writable files cooperate:
//!
//! 1. A **shared-mime-info package** (`~/.local/share/mime/packages/*.xml`)
//!    declares a MIME type and the filename glob that maps to it, here
//!    `application/x-<tag>` for `*.<tag>`.
//! 2. A **desktop entry** (`~/.local/share/applications/*.desktop`) describes
//!    the handler program and the MIME types it accepts; its `Exec=` line is
//!    the command run when a file is opened (`%f` is the file path).
//! 3. **`mimeapps.list`** (`~/.config/mimeapps.list`) records the user's
//!    default handler per MIME type in its `[Default Applications]` section.
//!
//! `is_registered` reports `true` only when the desktop entry launches the
//! running executable *and* `mimeapps.list` names that entry as default.
//!
//! After a change, `update-mime-database` and `update-desktop-database` are
//! invoked best-effort so file managers pick the change up; their absence is
//! not an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use settings_core::{AssociationBinding, AssociationError, AssociationRegistrar};
use tracing::debug;

const DEFAULTS_SECTION: &str = "[Default Applications]";

/// XDG implementation of [`AssociationRegistrar`].
#[derive(Debug, Clone)]
pub struct XdgAssociationRegistrar {
    data_dir: Option<PathBuf>,
    config_dir: Option<PathBuf>,
    refresh_databases: bool,
}

impl XdgAssociationRegistrar {
    /// Uses `$XDG_DATA_HOME` and `$XDG_CONFIG_HOME` (or their defaults).
    pub fn new() -> Self {
        Self {
            data_dir: dirs::data_dir(),
            config_dir: dirs::config_dir(),
            refresh_databases: true,
        }
    }

    /// Uses explicit roots and never spawns the database update tools.
    pub fn with_roots(data_dir: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            config_dir: Some(config_dir.into()),
            refresh_databases: false,
        }
    }

    fn data_dir(&self) -> Result<&Path, AssociationError> {
        self.data_dir
            .as_deref()
            .ok_or_else(|| AssociationError::Platform("XDG data directory unavailable".into()))
    }

    fn config_dir(&self) -> Result<&Path, AssociationError> {
        self.config_dir
            .as_deref()
            .ok_or_else(|| AssociationError::Platform("XDG config directory unavailable".into()))
    }

    fn desktop_path(&self, binding: &AssociationBinding) -> Result<PathBuf, AssociationError> {
        Ok(self
            .data_dir()?
            .join("applications")
            .join(desktop_id(binding)))
    }

    fn mime_package_path(&self, binding: &AssociationBinding) -> Result<PathBuf, AssociationError> {
        Ok(self
            .data_dir()?
            .join("mime")
            .join("packages")
            .join(format!("settings-host-{}.xml", binding.tag)))
    }

    fn mimeapps_path(&self) -> Result<PathBuf, AssociationError> {
        Ok(self.config_dir()?.join("mimeapps.list"))
    }

    fn refresh(&self) {
        if !self.refresh_databases {
            return;
        }
        let Ok(data_dir) = self.data_dir() else {
            return;
        };
        for (tool, dir) in [
            ("update-mime-database", data_dir.join("mime")),
            ("update-desktop-database", data_dir.join("applications")),
        ] {
            match Command::new(tool).arg(&dir).status() {
                Ok(status) => debug!(tool, %status, "database refreshed"),
                Err(e) => debug!(tool, "database refresh skipped: {e}"),
            }
        }
    }
}

impl Default for XdgAssociationRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl AssociationRegistrar for XdgAssociationRegistrar {
    fn is_registered(&self, binding: &AssociationBinding) -> Result<bool, AssociationError> {
        let desktop_path = self.desktop_path(binding)?;
        let Some(entry) = read_optional(&desktop_path)? else {
            return Ok(false);
        };
        let expected_exec = format!("Exec={}", exec_line(&binding.executable));
        if !entry.lines().any(|line| line.trim_end() == expected_exec) {
            return Ok(false);
        }

        let mimeapps_path = self.mimeapps_path()?;
        let mimeapps = read_optional(&mimeapps_path)?.unwrap_or_default();
        let id = desktop_id(binding);
        Ok(default_handler(&mimeapps, &mime_type(binding))
            .is_some_and(|handlers| handlers.split(';').next() == Some(id.as_str())))
    }

    fn register(&self, binding: &AssociationBinding) -> Result<(), AssociationError> {
        write_file(&self.mime_package_path(binding)?, &mime_package(binding))?;
        write_file(&self.desktop_path(binding)?, &desktop_entry(binding))?;

        let mimeapps_path = self.mimeapps_path()?;
        let mimeapps = read_optional(&mimeapps_path)?.unwrap_or_default();
        let updated = set_default_handler(&mimeapps, &mime_type(binding), &desktop_id(binding));
        write_file(&mimeapps_path, &updated)?;

        self.refresh();
        Ok(())
    }

    fn deregister(&self, binding: &AssociationBinding) -> Result<(), AssociationError> {
        remove_optional(&self.desktop_path(binding)?)?;
        remove_optional(&self.mime_package_path(binding)?)?;

        let mimeapps_path = self.mimeapps_path()?;
        if let Some(mimeapps) = read_optional(&mimeapps_path)? {
            let updated =
                remove_default_handler(&mimeapps, &mime_type(binding), &desktop_id(binding));
            if updated != mimeapps {
                write_file(&mimeapps_path, &updated)?;
            }
        }

        self.refresh();
        Ok(())
    }
}

// ── File contents ─────────────────────────────────────────────────────────────

fn desktop_id(binding: &AssociationBinding) -> String {
    format!("settings-host-{}.desktop", binding.tag)
}

fn mime_type(binding: &AssociationBinding) -> String {
    format!("application/x-{}", binding.tag.to_lowercase())
}

fn desktop_entry(binding: &AssociationBinding) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=Settings ({tag})\n\
         Exec={exec}\n\
         MimeType={mime};\n\
         NoDisplay=true\n\
         Terminal=false\n",
        tag = binding.tag,
        exec = exec_line(&binding.executable),
        mime = mime_type(binding),
    )
}

fn mime_package(binding: &AssociationBinding) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <mime-info xmlns=\"http://www.freedesktop.org/standards/shared-mime-info\">\n  \
         <mime-type type=\"{mime}\">\n    \
         <comment>{tag} settings file</comment>\n    \
         <glob pattern=\"*.{tag}\"/>\n  \
         </mime-type>\n\
         </mime-info>\n",
        mime = xml_escape(&mime_type(binding)),
        tag = xml_escape(&binding.tag),
    )
}

/// `Exec=` value launching `executable` with the opened file.
///
/// The executable is always quoted; inside quotes `"`, `` ` ``, `$` and `\`
/// are backslash-escaped as the desktop entry specification requires.
fn exec_line(executable: &Path) -> String {
    let mut quoted = String::from("\"");
    for c in executable.to_string_lossy().chars() {
        if matches!(c, '"' | '`' | '$' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push_str("\" %f");
    quoted
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ── mimeapps.list editing ─────────────────────────────────────────────────────

/// Returns the handler list for `mime` in `[Default Applications]`.
fn default_handler<'a>(content: &'a str, mime: &str) -> Option<&'a str> {
    let mut in_defaults = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            in_defaults = trimmed == DEFAULTS_SECTION;
            continue;
        }
        if in_defaults {
            if let Some((key, value)) = trimmed.split_once('=') {
                if key.trim() == mime {
                    return Some(value.trim());
                }
            }
        }
    }
    None
}

/// Sets `mime=desktop_id` in `[Default Applications]`, creating the section if needed.
fn set_default_handler(content: &str, mime: &str, desktop_id: &str) -> String {
    let entry = format!("{mime}={desktop_id}");
    let mut out: Vec<String> = Vec::new();
    let mut in_defaults = false;
    let mut saw_section = false;
    let mut written = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            if in_defaults && !written {
                out.push(entry.clone());
                written = true;
            }
            in_defaults = trimmed == DEFAULTS_SECTION;
            saw_section |= in_defaults;
            out.push(line.to_string());
            continue;
        }
        if in_defaults && is_entry_for(trimmed, mime) {
            if !written {
                out.push(entry.clone());
                written = true;
            }
            continue;
        }
        out.push(line.to_string());
    }

    if !written {
        if !saw_section {
            if out.last().is_some_and(|l| !l.trim().is_empty()) {
                out.push(String::new());
            }
            out.push(DEFAULTS_SECTION.to_string());
        }
        out.push(entry);
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Removes `mime=` lines from `[Default Applications]` whose first handler
/// is `desktop_id`.  Entries naming another program are left alone.
fn remove_default_handler(content: &str, mime: &str, desktop_id: &str) -> String {
    let mut in_defaults = false;
    let mut out: Vec<&str> = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            in_defaults = trimmed == DEFAULTS_SECTION;
        } else if in_defaults && is_entry_for(trimmed, mime, desktop_id) {
            continue;
        }
        out.push(line);
    }
    if out.len() == content.lines().count() {
        return content.to_string();
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn is_entry_for(line: &str, mime: &str, desktop_id: &str) -> bool {
    line.split_once('=').is_some_and(|(key, handlers)| {
        key.trim() == mime && handlers.trim().split(';').next() == Some(desktop_id)
    })
}

// ── File helpers ──────────────────────────────────────────────────────────────

fn read_optional(path: &Path) -> Result<Option<String>, AssociationError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AssociationError::from_io(path, e)),
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), AssociationError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| AssociationError::from_io(dir, e))?;
    }
    fs::write(path, content).map_err(|e| AssociationError::from_io(path, e))
}

fn remove_optional(path: &Path) -> Result<(), AssociationError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AssociationError::from_io(path, e)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
