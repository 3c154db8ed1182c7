//! Host platform detection.
//!
//! The platform is probed once at startup and mapped to the shell dialect
//! used for both prompting and execution. Anything that isn't Windows is
//! treated as a POSIX host.

use std::fmt;

/// Shell syntax family for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    PowerShell,
    Posix,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::PowerShell => f.write_str("PowerShell"),
            Dialect::Posix => f.write_str("POSIX shell"),
        }
    }
}

/// The detected host: its OS family name and the shell dialect it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    os: &'static str,
    dialect: Dialect,
}

impl Platform {
    /// Probe the running host.
    pub fn detect() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS identifier (as in `std::env::consts::OS`) to a platform.
    pub fn from_os(os: &'static str) -> Self {
        let dialect = match os {
            "windows" => Dialect::PowerShell,
            _ => Dialect::Posix,
        };
        Self { os, dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn os(&self) -> &'static str {
        self.os
    }

    /// Label used when telling the model which command line it is an expert for.
    pub fn expert_label(&self) -> &'static str {
        match (self.dialect, self.os) {
            (Dialect::PowerShell, _) => "Windows PowerShell",
            (Dialect::Posix, "macos") => "macOS/Unix",
            (Dialect::Posix, _) => "Linux/Unix",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_maps_to_powershell() {
        let platform = Platform::from_os("windows");
        assert_eq!(platform.dialect(), Dialect::PowerShell);
        assert_eq!(platform.expert_label(), "Windows PowerShell");
    }

    #[test]
    fn test_unix_family_maps_to_posix() {
        for os in ["linux", "macos", "freebsd", "openbsd", "android"] {
            assert_eq!(Platform::from_os(os).dialect(), Dialect::Posix, "os: {}", os);
        }
        assert_eq!(Platform::from_os("macos").expert_label(), "macOS/Unix");
        assert_eq!(Platform::from_os("linux").expert_label(), "Linux/Unix");
    }

    #[test]
    fn test_unrecognized_defaults_to_posix() {
        let platform = Platform::from_os("plan9");
        assert_eq!(platform.dialect(), Dialect::Posix);
        assert_eq!(platform.expert_label(), "Linux/Unix");
    }

    #[test]
    fn test_detect_matches_build_target() {
        let platform = Platform::detect();
        if cfg!(windows) {
            assert_eq!(platform.dialect(), Dialect::PowerShell);
        } else {
            assert_eq!(platform.dialect(), Dialect::Posix);
        }
    }
}
