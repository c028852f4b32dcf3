/// Enumerations for Word document elements.
///
/// This module provides the enumerations the editor matches formatting
/// against, named after their VBA API counterparts.
use std::fmt;
use std::str::FromStr;

/// `w:highlight/@w:val` value that explicitly means "no highlight".
pub const NO_HIGHLIGHT: &str = "none";

/// Specifies a text highlight colour.
///
/// Corresponds to the VBA `WdColorIndex` enumeration, restricted to the
/// sixteen colours Word offers for highlighting.
///
/// The XML form (`w:highlight/@w:val`) and the VBA form use different words
/// for the same colour: VBA `Turquoise` is XML `cyan`, and VBA `Green` is XML
/// `darkGreen` while XML `green` is VBA `BrightGreen`.
///
/// # Examples
///
/// ```rust
/// use runspan::ooxml::docx::enums::WdColorIndex;
///
/// let color = WdColorIndex::Turquoise;
/// assert_eq!(color.to_xml(), "cyan");
/// assert_eq!(WdColorIndex::from_xml("darkGreen"), Some(WdColorIndex::Green));
/// assert_eq!("BRIGHT_GREEN".parse::<WdColorIndex>().unwrap(), WdColorIndex::BrightGreen);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum WdColorIndex {
    Black = 1,
    Blue = 2,
    Turquoise = 3,
    BrightGreen = 4,
    Pink = 5,
    Red = 6,
    Yellow = 7,
    White = 8,
    DarkBlue = 9,
    Teal = 10,
    Green = 11,
    Violet = 12,
    DarkRed = 13,
    DarkYellow = 14,
    Gray50 = 15,
    Gray25 = 16,
}

impl WdColorIndex {
    /// Every highlight colour, in `WdColorIndex` order.
    pub const ALL: [WdColorIndex; 16] = [
        Self::Black,
        Self::Blue,
        Self::Turquoise,
        Self::BrightGreen,
        Self::Pink,
        Self::Red,
        Self::Yellow,
        Self::White,
        Self::DarkBlue,
        Self::Teal,
        Self::Green,
        Self::Violet,
        Self::DarkRed,
        Self::DarkYellow,
        Self::Gray50,
        Self::Gray25,
    ];

    /// Convert the colour to its `w:highlight/@w:val` value.
    #[inline]
    pub const fn to_xml(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::Blue => "blue",
            Self::Turquoise => "cyan",
            Self::BrightGreen => "green",
            Self::Pink => "magenta",
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::White => "white",
            Self::DarkBlue => "darkBlue",
            Self::Teal => "darkCyan",
            Self::Green => "darkGreen",
            Self::Violet => "darkMagenta",
            Self::DarkRed => "darkRed",
            Self::DarkYellow => "darkYellow",
            Self::Gray50 => "darkGray",
            Self::Gray25 => "lightGray",
        }
    }

    /// Parse a colour from its `w:highlight/@w:val` value.
    ///
    /// Returns `None` for `none` and for unrecognized values.
    #[inline]
    pub fn from_xml(s: &str) -> Option<Self> {
        match s {
            "black" => Some(Self::Black),
            "blue" => Some(Self::Blue),
            "cyan" => Some(Self::Turquoise),
            "green" => Some(Self::BrightGreen),
            "magenta" => Some(Self::Pink),
            "red" => Some(Self::Red),
            "yellow" => Some(Self::Yellow),
            "white" => Some(Self::White),
            "darkBlue" => Some(Self::DarkBlue),
            "darkCyan" => Some(Self::Teal),
            "darkGreen" => Some(Self::Green),
            "darkMagenta" => Some(Self::Violet),
            "darkRed" => Some(Self::DarkRed),
            "darkYellow" => Some(Self::DarkYellow),
            "darkGray" => Some(Self::Gray50),
            "lightGray" => Some(Self::Gray25),
            _ => None,
        }
    }

    /// The VBA-style constant name, e.g. `BRIGHT_GREEN`.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Black => "BLACK",
            Self::Blue => "BLUE",
            Self::Turquoise => "TURQUOISE",
            Self::BrightGreen => "BRIGHT_GREEN",
            Self::Pink => "PINK",
            Self::Red => "RED",
            Self::Yellow => "YELLOW",
            Self::White => "WHITE",
            Self::DarkBlue => "DARK_BLUE",
            Self::Teal => "TEAL",
            Self::Green => "GREEN",
            Self::Violet => "VIOLET",
            Self::DarkRed => "DARK_RED",
            Self::DarkYellow => "DARK_YELLOW",
            Self::Gray50 => "GRAY_50",
            Self::Gray25 => "GRAY_25",
        }
    }

    fn from_name(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .trim_start_matches("wd")
            .chars()
            .filter(|c| *c != '_' && *c != ' ' && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|c| c.name().replace('_', "") == normalized)
    }
}

impl FromStr for WdColorIndex {
    type Err = crate::Error;

    /// Accepts the exact XML value first (`cyan`, `darkGreen`), then the VBA
    /// name in any case with optional `wd` prefix and separators
    /// (`TURQUOISE`, `wdBrightGreen`, `gray_25`).
    fn from_str(s: &str) -> crate::Result<Self> {
        Self::from_xml(s)
            .or_else(|| Self::from_name(s))
            .ok_or_else(|| crate::Error::UnknownColor(s.to_string()))
    }
}

impl fmt::Display for WdColorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_values_round_trip() {
        for color in WdColorIndex::ALL {
            assert_eq!(WdColorIndex::from_xml(color.to_xml()), Some(color));
        }
        assert_eq!(WdColorIndex::from_xml(NO_HIGHLIGHT), None);
    }

    #[test]
    fn test_parse_vba_names() {
        assert_eq!("TURQUOISE".parse::<WdColorIndex>().unwrap(), WdColorIndex::Turquoise);
        assert_eq!("wdBrightGreen".parse::<WdColorIndex>().unwrap(), WdColorIndex::BrightGreen);
        assert_eq!("gray_25".parse::<WdColorIndex>().unwrap(), WdColorIndex::Gray25);
        assert_eq!("Dark Yellow".parse::<WdColorIndex>().unwrap(), WdColorIndex::DarkYellow);
    }

    #[test]
    fn test_xml_value_wins_over_vba_name() {
        // lowercase `green` is the XML value for bright green
        assert_eq!("green".parse::<WdColorIndex>().unwrap(), WdColorIndex::BrightGreen);
        assert_eq!("GREEN".parse::<WdColorIndex>().unwrap(), WdColorIndex::Green);
    }

    #[test]
    fn test_unknown_color() {
        let err = "mauve".parse::<WdColorIndex>().unwrap_err();
        assert!(matches!(err, crate::Error::UnknownColor(ref s) if s == "mauve"));
    }

    #[test]
    fn test_display() {
        assert_eq!(WdColorIndex::Gray50.to_string(), "GRAY_50");
    }
}
