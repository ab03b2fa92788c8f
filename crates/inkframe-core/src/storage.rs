//! Removable storage abstraction.
//! Holds the secrets file; the card is mounted fresh every cycle.

use alloc::format;
use alloc::string::String;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountMode {
    ReadWrite,
    ReadOnly,
}

/// Storage error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The block device could not be mounted.
    #[error("mount at {mount_point} failed: {reason}")]
    MountFailed { mount_point: String, reason: String },
    /// A read was attempted before mounting.
    #[error("storage not mounted")]
    NotMounted,
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Trait for the card behind the mount point
///
/// Implementations:
/// - `SdCard` for the device (SPI SD card on the FAT VFS)
/// - `MockStorage` for host tests
pub trait Storage {
    fn mount(&mut self, mount_point: &str, mode: MountMode) -> Result<(), StorageError>;

    fn unmount(&mut self, mount_point: &str) -> Result<(), StorageError>;

    /// Read entire file as string
    ///
    /// # Errors
    /// `NotFound` when the file is missing, `NotMounted` before a mount.
    fn read_to_string(&mut self, path: &str) -> Result<String, StorageError>;
}

/// Mount, and if that fails, unmount once and try again. A card left
/// mounted by an earlier cycle refuses the first mount.
pub fn mount_with_retry(
    storage: &mut dyn Storage,
    mount_point: &str,
    mode: MountMode,
) -> Result<(), StorageError> {
    match storage.mount(mount_point, mode) {
        Ok(()) => Ok(()),
        Err(first) => {
            log::warn!("mount failed ({}), remounting", first);
            if let Err(err) = storage.unmount(mount_point) {
                log::debug!("unmount before remount: {}", err);
            }
            storage.mount(mount_point, mode)
        }
    }
}

/// Join a directory and a file name with exactly one separator.
pub fn join_path(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if base.is_empty() {
        format!("/{}", name)
    } else {
        format!("{}/{}", base, name)
    }
}
