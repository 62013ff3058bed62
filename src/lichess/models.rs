use serde::{Deserialize, Serialize};

/// An NDJSON feed the client knows how to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Current tournaments, falling back to the arena listing
    Tournaments,
    /// Most recent games of one user
    UserGames { username: String, max: u32 },
}

/// Rating categories offered on the leaderboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PerfType {
    Bullet,
    Blitz,
    Rapid,
    Classical,
    Correspondence,
    Chess960,
    KingOfTheHill,
    ThreeCheck,
}

impl PerfType {
    pub const ALL: [PerfType; 8] = [
        PerfType::Bullet,
        PerfType::Blitz,
        PerfType::Rapid,
        PerfType::Classical,
        PerfType::Correspondence,
        PerfType::Chess960,
        PerfType::KingOfTheHill,
        PerfType::ThreeCheck,
    ];

    /// Key used in API paths and in a player's `perfs` object.
    pub fn key(self) -> &'static str {
        match self {
            PerfType::Bullet => "bullet",
            PerfType::Blitz => "blitz",
            PerfType::Rapid => "rapid",
            PerfType::Classical => "classical",
            PerfType::Correspondence => "correspondence",
            PerfType::Chess960 => "chess960",
            PerfType::KingOfTheHill => "kingOfTheHill",
            PerfType::ThreeCheck => "threeCheck",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PerfType::Bullet => "Bullet",
            PerfType::Blitz => "Blitz",
            PerfType::Rapid => "Rapid",
            PerfType::Classical => "Classical",
            PerfType::Correspondence => "Correspondence",
            PerfType::Chess960 => "Chess960",
            PerfType::KingOfTheHill => "King of the Hill",
            PerfType::ThreeCheck => "Three-check",
        }
    }

    pub fn from_key(key: &str) -> Option<PerfType> {
        PerfType::ALL.into_iter().find(|p| p.key() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_keys_round_trip() {
        for perf in PerfType::ALL {
            assert_eq!(PerfType::from_key(perf.key()), Some(perf));
        }
        assert_eq!(PerfType::from_key("atomic"), None);
    }

    #[test]
    fn test_perf_serde_matches_key() {
        let json = serde_json::to_string(&PerfType::KingOfTheHill).unwrap();
        assert_eq!(json, "\"kingOfTheHill\"");
        assert_eq!(PerfType::ThreeCheck.display_name(), "Three-check");
    }
}
