//! Hardware fingerprint utilities

use crate::error::{Result, SdkError};

/// Generate a random UUID v4, for callers that prefer an unstable
/// per-install id over a machine fingerprint.
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generate a stable hardware id for this machine.
///
/// Platform-specific sources:
/// - Linux: `/etc/machine-id`
/// - macOS: IOPlatformSerialNumber from IOKit
/// - Windows: HKLM\SOFTWARE\Microsoft\Cryptography\MachineGuid
///
/// The raw id is hashed before returning so actual hardware identifiers
/// never leave the machine.
pub fn get_hardware_id() -> Result<String> {
    let raw_id = get_raw_machine_id()?;

    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    raw_id.hash(&mut hasher);
    let hash = hasher.finish();

    Ok(format!("hw-{:016x}", hash))
}

/// Best-effort human-readable machine name for activation records.
pub fn get_machine_name() -> Option<String> {
    hostname::get().ok().and_then(|h| h.into_string().ok())
}

/// OS description sent with activations, e.g. "linux x86_64".
pub fn get_os_info() -> String {
    format!("{} {}", std::env::consts::OS, std::env::consts::ARCH)
}

#[cfg(target_os = "linux")]
fn get_raw_machine_id() -> Result<String> {
    // Try /etc/machine-id first (systemd)
    if let Ok(id) = std::fs::read_to_string("/etc/machine-id") {
        let id = id.trim();
        if !id.is_empty() {
            return Ok(id.to_string());
        }
    }

    // Fallback to /var/lib/dbus/machine-id
    if let Ok(id) = std::fs::read_to_string("/var/lib/dbus/machine-id") {
        let id = id.trim();
        if !id.is_empty() {
            return Ok(id.to_string());
        }
    }

    Err(SdkError::HardwareId(
        "no machine-id file found; supply a hardware_id explicitly".into(),
    ))
}

#[cfg(target_os = "macos")]
fn get_raw_machine_id() -> Result<String> {
    let output = std::process::Command::new("ioreg")
        .args(["-rd1", "-c", "IOPlatformExpertDevice"])
        .output()
        .map_err(|e| SdkError::HardwareId(format!("failed to run ioreg: {e}")))?;

    let output_str = String::from_utf8_lossy(&output.stdout);

    // Line format: "IOPlatformSerialNumber" = "XXXXX"
    for marker in ["IOPlatformSerialNumber", "IOPlatformUUID"] {
        for line in output_str.lines() {
            if line.contains(marker) {
                if let Some(start) = line.rfind('"') {
                    if let Some(end) = line[..start].rfind('"') {
                        let value = &line[end + 1..start];
                        if !value.is_empty() {
                            return Ok(value.to_string());
                        }
                    }
                }
            }
        }
    }

    Err(SdkError::HardwareId(
        "could not parse ioreg output; supply a hardware_id explicitly".into(),
    ))
}

#[cfg(target_os = "windows")]
fn get_raw_machine_id() -> Result<String> {
    use winreg::enums::*;
    use winreg::RegKey;

    let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
    let crypto = hklm
        .open_subkey("SOFTWARE\\Microsoft\\Cryptography")
        .map_err(|e| SdkError::HardwareId(format!("failed to open registry key: {e}")))?;

    let machine_guid: String = crypto
        .get_value("MachineGuid")
        .map_err(|e| SdkError::HardwareId(format!("failed to read MachineGuid: {e}")))?;

    Ok(machine_guid)
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn get_raw_machine_id() -> Result<String> {
    Err(SdkError::HardwareId(
        "unsupported platform; supply a hardware_id explicitly".into(),
    ))
}
