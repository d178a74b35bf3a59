//! The fixed palette entities can be tagged with.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorTag {
    Green,
    Yellow,
    Cyan,
    Navy,
    Red,
    Purple,
    Turquoise,
    Brown,
    Magenta,
    Blue,
    NavyGrey,
    ArmyGreen,
    Gold,
    Orange,
}

impl ColorTag {
    pub const ALL: [ColorTag; 14] = [
        Self::Green,
        Self::Yellow,
        Self::Cyan,
        Self::Navy,
        Self::Red,
        Self::Purple,
        Self::Turquoise,
        Self::Brown,
        Self::Magenta,
        Self::Blue,
        Self::NavyGrey,
        Self::ArmyGreen,
        Self::Gold,
        Self::Orange,
    ];

    /// Returns the canonical tag string stored in documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Cyan => "cyan",
            Self::Navy => "navy",
            Self::Red => "red",
            Self::Purple => "purple",
            Self::Turquoise => "turquoise",
            Self::Brown => "brown",
            Self::Magenta => "magenta",
            Self::Blue => "blue",
            Self::NavyGrey => "navy-grey",
            Self::ArmyGreen => "army-green",
            Self::Gold => "gold",
            Self::Orange => "orange",
        }
    }
}

impl fmt::Display for ColorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ColorTag {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let wanted = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == wanted)
            .ok_or_else(|| format!("unknown color tag '{}'", value.trim()))
    }
}
