use anyhow::{Context, Error, Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A display resolution in pixels, written as `WIDTHxHEIGHT`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    /// The horizontal size in pixels.
    pub width: u16,
    /// The vertical size in pixels.
    pub height: u16,
}

impl Resolution {
    /// The resolution assumed before anything has been detected.
    pub const DEFAULT: Resolution = Resolution::new(1024, 768);

    /// Create a new [Resolution] of `width` by `height` pixels.
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// The graphics mode that selects this resolution, falling back to automatic
    /// selection if the firmware does not support it.
    pub fn gfxmode(&self) -> String {
        format!("{}x{};auto", self.width, self.height)
    }
}

impl Display for Resolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let Some((width, height)) = input.trim().split_once('x') else {
            bail!("resolution '{}' is not of the form WIDTHxHEIGHT", input);
        };
        let width = width
            .trim()
            .parse::<u16>()
            .with_context(|| format!("invalid width in resolution '{}'", input))?;
        let height = height
            .trim()
            .parse::<u16>()
            .with_context(|| format!("invalid height in resolution '{}'", input))?;
        Ok(Self::new(width, height))
    }
}

impl TryFrom<String> for Resolution {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_width_by_height() {
        assert_eq!("1920x1080".parse::<Resolution>().ok(), Some(Resolution::new(1920, 1080)));
        assert_eq!(" 800x600\n".parse::<Resolution>().ok(), Some(Resolution::new(800, 600)));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("1920".parse::<Resolution>().is_err());
        assert!("1920xabc".parse::<Resolution>().is_err());
        assert!("70000x1080".parse::<Resolution>().is_err());
    }

    #[test]
    fn encodes_gfxmode() {
        assert_eq!(Resolution::new(1920, 1080).gfxmode(), "1920x1080;auto");
    }
}
