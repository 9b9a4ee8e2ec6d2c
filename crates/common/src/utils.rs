//! Utility functions for toolshell
//!
//! Registry key derivation plus a few formatting helpers.

use std::hash::Hasher;
use std::time::Duration;

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a hasher
///
/// # Examples
///
/// ```
/// use common::utils::Fnv1a32;
/// use std::hash::Hasher;
///
/// let mut hasher = Fnv1a32::default();
/// hasher.write(b"a");
/// assert_eq!(hasher.finish32(), 0xe40c292c);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a32(u32);

impl Fnv1a32 {
    /// Gets the 32-bit digest
    pub fn finish32(&self) -> u32 {
        self.0
    }
}

impl Default for Fnv1a32 {
    fn default() -> Self {
        Self(FNV32_OFFSET_BASIS)
    }
}

impl Hasher for Fnv1a32 {
    fn finish(&self) -> u64 {
        u64::from(self.0)
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u32::from(*byte);
            self.0 = self.0.wrapping_mul(FNV32_PRIME);
        }
    }
}

/// Removes every whitespace character from a command name
///
/// # Examples
///
/// ```
/// use common::utils::normalize_name;
///
/// assert_eq!(normalize_name("show  version"), "showversion");
/// ```
pub fn normalize_name(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Hashes an already normalized key
pub fn hash_key(key: &str) -> u32 {
    let mut hasher = Fnv1a32::default();
    hasher.write(key.as_bytes());
    hasher.finish32()
}

/// Registry key for a command name
pub fn command_key(name: &str) -> u32 {
    hash_key(&normalize_name(name))
}

/// Renders a duration as `1h 2m 5s`, or in ms/µs below one second.
/// Leading zero units are left out.
///
/// ```
/// use common::utils::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
/// assert_eq!(format_duration(Duration::from_millis(40)), "40ms");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs == 0 {
        return match duration.subsec_millis() {
            0 => format!("{}µs", duration.subsec_micros()),
            millis => format!("{}ms", millis),
        };
    }

    [(secs / 3600, 'h'), (secs / 60 % 60, 'm'), (secs % 60, 's')]
        .iter()
        .skip_while(|(value, _)| *value == 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keeps the first `max_chars` characters of `s`, marking a cut with `...`
///
/// ```
/// use common::utils::truncate_string;
///
/// assert_eq!(truncate_string("list extra args", 4), "list...");
/// assert_eq!(truncate_string("list", 10), "list");
/// ```
pub fn truncate_string(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv_reference_values() {
        assert_eq!(hash_key(""), 0x811c_9dc5);
        assert_eq!(hash_key("a"), 0xe40c_292c);
        assert_eq!(hash_key("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_known_collisions() {
        assert_eq!(hash_key("costarring"), hash_key("liquid"));
        assert_eq!(hash_key("declinate"), hash_key("macallums"));
        assert_ne!(hash_key("costarring"), hash_key("declinate"));
    }

    #[test]
    fn test_command_key_ignores_whitespace() {
        assert_eq!(command_key("show version"), hash_key("showversion"));
        assert_eq!(command_key(" show\tversion "), command_key("showversion"));
        assert_ne!(command_key("show version"), command_key("show"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h 0m 0s");
        assert_eq!(format_duration(Duration::from_micros(7)), "7µs");
    }

    #[test]
    fn test_truncate_string_is_char_safe() {
        assert_eq!(truncate_string("héllo wörld", 7), "héllo w...");
        assert_eq!(truncate_string("", 3), "");
    }
}
