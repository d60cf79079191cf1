//! Host platform detection and release naming

use std::fmt;

use crate::core::model::{HookError, HookResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Windows,
    MacOs,
    Linux,
}

impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Windows => "windows",
            Os::MacOs => "macos",
            Os::Linux => "linux",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86_64,
    Aarch64,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
        }
    }
}

/// Operating system and CPU architecture of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    /// Detect the platform this binary was compiled for
    pub fn detect() -> HookResult<Self> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Build a platform from `std::env::consts` style names
    pub fn from_parts(os: &str, arch: &str) -> HookResult<Self> {
        let os = match os {
            "windows" => Os::Windows,
            "macos" => Os::MacOs,
            "linux" => Os::Linux,
            other => return Err(HookError::UnsupportedPlatform(format!("{}-{}", other, arch))),
        };
        let arch = match arch {
            "x86_64" => Arch::X86_64,
            "aarch64" => Arch::Aarch64,
            other => {
                return Err(HookError::UnsupportedPlatform(format!(
                    "{}-{}",
                    os.as_str(),
                    other
                )))
            }
        };
        Ok(Self { os, arch })
    }

    /// Executable file name of dfixxer on this platform
    pub fn binary_name(&self) -> &'static str {
        match self.os {
            Os::Windows => "dfixxer.exe",
            _ => "dfixxer",
        }
    }

    /// Architectures whose release assets can run here, preferred first.
    ///
    /// Arm macOS and Windows hosts emulate x86_64 binaries.
    pub fn candidate_arches(&self) -> Vec<Arch> {
        match (self.os, self.arch) {
            (Os::MacOs | Os::Windows, Arch::Aarch64) => vec![Arch::Aarch64, Arch::X86_64],
            (_, arch) => vec![arch],
        }
    }

    /// Asset name stem, e.g. `dfixxer-linux-x86_64`
    pub fn asset_base(&self, arch: Arch) -> String {
        format!("dfixxer-{}-{}", self.os.as_str(), arch.as_str())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.as_str(), self.arch.as_str())
    }
}
