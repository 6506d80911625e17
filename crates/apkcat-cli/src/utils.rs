use std::{
    fmt::Display,
    sync::{LazyLock, RwLock},
};

use apkcat_utils::bytes::{format_bytes, parse_size};
use nu_ansi_term::Color;

pub struct Icons;

impl Icons {
    pub const ARROW: &str = "→";
    pub const ARCH: &str = "🖥";
    pub const CALENDAR: &str = "📅";
    pub const CHECK: &str = "✓";
    pub const CHECKSUM: &str = "🔏";
    pub const CROSS: &str = "✗";
    pub const DESCRIPTION: &str = "📝";
    pub const LICENSE: &str = "📜";
    pub const LINK: &str = "🔗";
    pub const MAINTAINER: &str = "👤";
    pub const PACKAGE: &str = "📦";
    pub const SIZE: &str = "💾";
    pub const VERSION: &str = "🏁";
}

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let color = COLOR.read().unwrap();
        if *color {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

/// Formats an index size field, keeping the raw value when it is not a number.
pub fn pretty_size(raw: &str) -> String {
    match parse_size(raw) {
        0 if !raw.trim().starts_with('0') => raw.to_string(),
        bytes => format_bytes(bytes, 2),
    }
}

pub fn join_or_dash(values: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    let joined = values
        .into_iter()
        .map(|v| v.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}
