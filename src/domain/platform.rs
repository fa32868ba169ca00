//! Host platform value object

use std::fmt;

/// Platform the recorder service is hosted on.
///
/// Platform-specific configuration sections are only honoured on the
/// matching platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Android,
    Ios,
    Web,
}

impl Platform {
    /// Detect the platform of the compile target
    pub const fn current() -> Self {
        if cfg!(target_os = "android") {
            Self::Android
        } else if cfg!(target_os = "ios") {
            Self::Ios
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_family = "wasm") {
            Self::Web
        } else {
            Self::Linux
        }
    }

    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "macos",
            Self::Windows => "windows",
            Self::Android => "android",
            Self::Ios => "ios",
            Self::Web => "web",
        }
    }

    /// Web hosts hand recordings back in memory rather than on disk
    pub const fn is_web(&self) -> bool {
        matches!(self, Self::Web)
    }

    pub const fn is_mobile(&self) -> bool {
        matches!(self, Self::Android | Self::Ios)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_web_is_web() {
        assert!(Platform::Web.is_web());
        assert!(!Platform::Linux.is_web());
        assert!(!Platform::Android.is_web());
    }

    #[test]
    fn mobile_platforms() {
        assert!(Platform::Android.is_mobile());
        assert!(Platform::Ios.is_mobile());
        assert!(!Platform::MacOs.is_mobile());
    }

    #[test]
    fn display_uses_lowercase_name() {
        assert_eq!(Platform::MacOs.to_string(), "macos");
        assert_eq!(Platform::Web.to_string(), "web");
    }
}
