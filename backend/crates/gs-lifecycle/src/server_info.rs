use serde::Serialize;

/// One connected player, as the comma-separated fields of a roster line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerInfo {
    pub fields: Vec<String>,
}

impl PlayerInfo {
    pub fn from_line(line: &str) -> Self {
        Self {
            fields: line.split(',').map(|f| f.trim().to_string()).collect(),
        }
    }

    /// First field, which the roster uses for the display name
    pub fn name(&self) -> Option<&str> {
        self.fields.first().map(String::as_str)
    }
}

/// Occupancy as of the last successful query.
///
/// Always replaced as a whole; never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfoSnapshot {
    pub running: bool,
    pub player_count: usize,
    pub players: Vec<PlayerInfo>,
}

impl ServerInfoSnapshot {
    pub fn not_running() -> Self {
        Self {
            running: false,
            player_count: 0,
            players: Vec::new(),
        }
    }

    /// Parse a roster response: header line, then one player per line.
    ///
    /// The count is lines minus the header; blank lines are not players.
    pub fn from_roster(response: &str) -> Self {
        let players: Vec<PlayerInfo> = response
            .lines()
            .skip(1)
            .filter(|line| !line.trim().is_empty())
            .map(PlayerInfo::from_line)
            .collect();

        Self {
            running: true,
            player_count: players.len(),
            players,
        }
    }
}
