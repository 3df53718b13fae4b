//! Device family classification from free-text identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of controller families; each one owns a default button/axis table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFamily {
    Xbox,
    PlayStation,
    Nintendo,
    SteamDeck,
    Generic,
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeviceFamily::Xbox => "Xbox",
            DeviceFamily::PlayStation => "PlayStation",
            DeviceFamily::Nintendo => "Nintendo",
            DeviceFamily::SteamDeck => "Steam Deck",
            DeviceFamily::Generic => "Generic",
        };
        f.write_str(label)
    }
}

// Checked top to bottom. Steam Input relabels whatever is behind it, so the
// virtual/aggregated patterns have to win over any vendor name it passes through.
const FAMILY_PATTERNS: &[(DeviceFamily, &[&str])] = &[
    (
        DeviceFamily::SteamDeck,
        &["valve", "steam", "neptune", "28de"],
    ),
    (
        DeviceFamily::PlayStation,
        &[
            "sony",
            "playstation",
            "dualsense",
            "dualshock",
            "ps3",
            "ps4",
            "ps5",
            "054c",
        ],
    ),
    (
        DeviceFamily::Nintendo,
        &["nintendo", "switch", "joy-con", "pro controller", "057e"],
    ),
    (
        DeviceFamily::Xbox,
        &["xbox", "x-box", "microsoft", "xinput", "045e"],
    ),
];

/// Maps a device identifier to its family. Unknown ids resolve to `Generic`.
pub fn classify(device_id: &str) -> DeviceFamily {
    let id = device_id.to_lowercase();
    FAMILY_PATTERNS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| id.contains(p)))
        .map(|(family, _)| *family)
        .unwrap_or(DeviceFamily::Generic)
}
