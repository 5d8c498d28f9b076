//! Label vocabulary shared by formatters and backend sinks.
//!
//! Each label is a small closed set. Picks derive an index from a
//! `(identity, seq)` key so the same line always carries the same labels.

macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Label value as sent to backends.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Value selected by a stable key.
            pub fn from_key(key: u64) -> Self {
                Self::ALL[(key % Self::ALL.len() as u64) as usize]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary!(
    /// Log severity.
    Level {
        Info => "info",
        Warn => "warn",
        Debug => "debug",
        Error => "error",
    }
);

vocabulary!(
    /// Application component that emitted the line.
    Component {
        DevelopSend => "develop-send",
        FullStackEnd => "full-stack-end",
        Frontend => "frontend",
        EverythingElse => "everything-else",
        Backend => "backend",
    }
);

vocabulary!(
    /// Service that emitted the line.
    Service {
        PotatoesCart => "potatoes-cart",
        Phishing => "phishing",
        StatelessDatabase => "stateless-database",
        RandomPoliciesGenerator => "random-policies-generator",
        CookieJar => "cookie-jar",
        DistributedUnicorn => "distributed-unicorn",
    }
);

vocabulary!(
    /// Container output stream.
    Stream {
        Stdout => "stdout",
        Stderr => "stderr",
    }
);

/// Stable 64-bit key for a `(identity, seq)` pair.
///
/// FNV-1a over the identity, then a splitmix64 finalizer over the sequence
/// number, so neighbouring sequence numbers spread across the vocabulary.
pub fn line_key(identity: &str, seq: u64) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in identity.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }

    let mut z = hash ^ seq.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_vocabulary_strings() {
        assert_eq!(Level::Warn.as_str(), "warn");
        assert_eq!(Component::FullStackEnd.to_string(), "full-stack-end");
        assert_eq!(Service::ALL.len(), 6);
        assert_eq!(Stream::ALL.len(), 2);
    }

    #[test]
    fn test_keyed_picks_cover_vocabulary() {
        let seen: HashSet<_> = (0..500)
            .map(|seq| Level::from_key(line_key("host.0.ABC", seq)))
            .collect();
        assert_eq!(seen.len(), Level::ALL.len());
    }

    #[test]
    fn test_line_key_is_stable() {
        assert_eq!(line_key("host.0.ABC", 10), line_key("host.0.ABC", 10));
        assert_ne!(line_key("host.0.ABC", 10), line_key("host.0.ABC", 11));
        assert_ne!(line_key("host.0.ABC", 10), line_key("host.1.ABC", 10));
    }

    #[test]
    fn test_from_key_spreads() {
        let seen: HashSet<_> = (0..100)
            .map(|seq| Stream::from_key(line_key("host", seq)))
            .collect();
        assert_eq!(seen.len(), 2);
    }
}
