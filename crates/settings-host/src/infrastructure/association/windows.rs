//! Windows file associations via the per-user registry.
//!
//! # Registry layout (for beginners)
//!
//! Windows merges `HKEY_LOCAL_MACHINE\Software\Classes` and
//! `HKEY_CURRENT_USER\Software\Classes` into the `HKEY_CLASSES_ROOT` view.
//! Writing under the current user needs no administrator rights.  For the
//! tag `stk` and executable `C:\Apps\host.exe` this registrar writes:
//!
//! ```text
//! HKCU\Software\Classes\.stk                          (Default) = "stk_File"
//! HKCU\Software\Classes\stk_File\DefaultIcon          (Default) = "C:\Apps\host.exe"
//! HKCU\Software\Classes\stk_File\shell\open\command   (Default) = "\"C:\Apps\host.exe\" \"%1\""
//! ```
//!
//! `is_registered` compares the `open\command` value against the command
//! this executable would write.  `ERROR_ACCESS_DENIED` becomes
//! [`AssociationError::PermissionDenied`], which the store ignores.

use settings_core::{AssociationBinding, AssociationError, AssociationRegistrar};
use tracing::debug;

use windows::core::{HSTRING, PCWSTR};
use windows::Win32::Foundation::{ERROR_ACCESS_DENIED, ERROR_FILE_NOT_FOUND, ERROR_SUCCESS, WIN32_ERROR};
use windows::Win32::System::Registry::{
    RegCloseKey, RegCreateKeyExW, RegDeleteTreeW, RegGetValueW, RegSetValueExW, HKEY,
    HKEY_CURRENT_USER, KEY_WRITE, REG_OPTION_NON_VOLATILE, REG_SZ, RRF_RT_REG_SZ,
};
use windows::Win32::UI::Shell::{SHChangeNotify, SHCNE_ASSOCCHANGED, SHCNF_IDLIST};

const CLASSES_ROOT: &str = r"Software\Classes";

/// Windows implementation of [`AssociationRegistrar`] using the HKCU registry.
pub struct WindowsAssociationRegistrar;

impl WindowsAssociationRegistrar {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsAssociationRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl AssociationRegistrar for WindowsAssociationRegistrar {
    fn is_registered(&self, binding: &AssociationBinding) -> Result<bool, AssociationError> {
        let command_key = format!(r"{}\shell\open\command", binding.prog_id());
        let command = read_default_value(&command_key)?;
        Ok(command.as_deref() == Some(binding.open_command().as_str()))
    }

    fn register(&self, binding: &AssociationBinding) -> Result<(), AssociationError> {
        let prog_id = binding.prog_id();
        let executable = binding.executable.to_string_lossy();

        set_default_value(&binding.extension(), &prog_id)?;
        set_default_value(&format!(r"{prog_id}\DefaultIcon"), &executable)?;
        set_default_value(
            &format!(r"{prog_id}\shell\open\command"),
            &binding.open_command(),
        )?;

        notify_shell();
        Ok(())
    }

    fn deregister(&self, binding: &AssociationBinding) -> Result<(), AssociationError> {
        delete_tree(&binding.extension())?;
        delete_tree(&binding.prog_id())?;
        notify_shell();
        Ok(())
    }
}

// ── Registry helpers ──────────────────────────────────────────────────────────

fn classes_path(subkey: &str) -> HSTRING {
    HSTRING::from(format!(r"{CLASSES_ROOT}\{subkey}"))
}

fn check(status: WIN32_ERROR, subkey: &str) -> Result<(), AssociationError> {
    if status == ERROR_SUCCESS {
        Ok(())
    } else if status == ERROR_ACCESS_DENIED {
        Err(AssociationError::PermissionDenied(format!(
            r"HKCU\{CLASSES_ROOT}\{subkey}"
        )))
    } else {
        Err(AssociationError::Platform(format!(
            r"registry access to HKCU\{CLASSES_ROOT}\{subkey} failed with Win32 error {}",
            status.0
        )))
    }
}

/// Creates `subkey` if needed and sets its unnamed (default) string value.
fn set_default_value(subkey: &str, value: &str) -> Result<(), AssociationError> {
    let path = classes_path(subkey);
    let mut key = HKEY::default();

    // SAFETY: `path` is a valid NUL-terminated wide string that outlives the
    // call, and `key` is a valid out-pointer for the opened handle.
    let status = unsafe {
        RegCreateKeyExW(
            HKEY_CURRENT_USER,
            &path,
            0,
            PCWSTR::null(),
            REG_OPTION_NON_VOLATILE,
            KEY_WRITE,
            None,
            &mut key,
            None,
        )
    };
    check(status, subkey)?;

    // REG_SZ data is UTF-16LE including the terminating NUL.
    let data: Vec<u8> = value
        .encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect();

    // SAFETY: `key` was opened above with KEY_WRITE and is closed right after.
    let status = unsafe { RegSetValueExW(key, PCWSTR::null(), 0, REG_SZ, Some(&data)) };
    // SAFETY: `key` is a handle we own; it is not used after this point.
    unsafe {
        let _ = RegCloseKey(key);
    }
    check(status, subkey)
}

/// Reads the unnamed (default) string value of `subkey`, `None` if absent.
fn read_default_value(subkey: &str) -> Result<Option<String>, AssociationError> {
    let path = classes_path(subkey);
    let mut size: u32 = 0;

    // SAFETY: a size query with no data buffer; `size` is a valid out-pointer.
    let status = unsafe {
        RegGetValueW(
            HKEY_CURRENT_USER,
            &path,
            PCWSTR::null(),
            RRF_RT_REG_SZ,
            None,
            None,
            Some(&mut size),
        )
    };
    if status == ERROR_FILE_NOT_FOUND {
        return Ok(None);
    }
    check(status, subkey)?;

    let mut buf = vec![0u16; (size as usize).div_ceil(2)];
    // SAFETY: `buf` holds `size` bytes and outlives the call.
    let status = unsafe {
        RegGetValueW(
            HKEY_CURRENT_USER,
            &path,
            PCWSTR::null(),
            RRF_RT_REG_SZ,
            None,
            Some(buf.as_mut_ptr().cast()),
            Some(&mut size),
        )
    };
    if status == ERROR_FILE_NOT_FOUND {
        return Ok(None);
    }
    check(status, subkey)?;

    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    Ok(Some(String::from_utf16_lossy(&buf[..len])))
}

/// Deletes `subkey` and everything below it; a missing key is not an error.
fn delete_tree(subkey: &str) -> Result<(), AssociationError> {
    let path = classes_path(subkey);
    // SAFETY: `path` is a valid NUL-terminated wide string that outlives the call.
    let status = unsafe { RegDeleteTreeW(HKEY_CURRENT_USER, &path) };
    if status == ERROR_FILE_NOT_FOUND {
        return Ok(());
    }
    check(status, subkey)
}

/// Tells Explorer to reload file type associations.
fn notify_shell() {
    // SAFETY: SHCNE_ASSOCCHANGED takes no item pointers.
    unsafe { SHChangeNotify(SHCNE_ASSOCCHANGED, SHCNF_IDLIST, None, None) };
    debug!("shell notified of association change");
}
