//! Device fingerprinting fallback for guest identity.
//!
//! The fingerprint is a short base-36 digest of coarse browser signals.
//! It is collision-tolerant and trivially spoofable: two guests on the same
//! device profile will share one, and anyone can forge one. It exists so a
//! guest who cleared cookies lands on the same identity, nothing more.

/// Client-observed signals, as reported at registration time.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pub user_agent: String,
    pub language: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub timezone_offset_minutes: i32,
    pub hardware_concurrency: Option<u32>,
}

/// Reduce a profile to a short base-36 string with a 32-bit rolling hash.
pub fn fingerprint(profile: &DeviceProfile) -> String {
    let joined = format!(
        "{}|{}|{}x{}|{}|{}",
        profile.user_agent,
        profile.language,
        profile.screen_width,
        profile.screen_height,
        profile.timezone_offset_minutes,
        profile
            .hardware_concurrency
            .map(|n| n.to_string())
            .unwrap_or_default(),
    );

    let mut hash: i32 = 0;
    for c in joined.chars() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(c as i32);
    }

    to_base36(u64::from(hash.unsigned_abs()))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = String::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize] as char);
        n /= 36;
    }
    out.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> DeviceProfile {
        DeviceProfile {
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)".to_string(),
            language: "en-US".to_string(),
            screen_width: 390,
            screen_height: 844,
            timezone_offset_minutes: -120,
            hardware_concurrency: Some(6),
        }
    }

    #[test]
    fn same_profile_same_fingerprint() {
        assert_eq!(fingerprint(&profile()), fingerprint(&profile()));
    }

    #[test]
    fn fingerprint_is_base36() {
        let fp = fingerprint(&profile());
        assert!(!fp.is_empty());
        assert!(fp
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn different_user_agent_changes_fingerprint() {
        let mut other = profile();
        other.user_agent = "Mozilla/5.0 (X11; Linux x86_64)".to_string();
        assert_ne!(fingerprint(&profile()), fingerprint(&other));
    }

    #[test]
    fn missing_core_count_still_hashes() {
        let mut other = profile();
        other.hardware_concurrency = None;
        let fp = fingerprint(&other);
        assert!(!fp.is_empty());
    }
}
