//! These structs provide the CLI interface for the bill-split CLI.

use crate::config::RenderSettings;
use crate::Result;
use clap::Parser;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// bill-split: Split a shared utility bill between two people.
///
/// The program asks for both people's names, their previous and current meter readings and the
/// total bill. Each person's usage is the difference between their readings. The person who used
/// more than half of the combined units pays the other for the excess at the per-unit cost.
///
/// The calculation is drawn onto a JPEG image named after both people and the current time, which
/// is written to the output directory.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[clap(flatten)]
    render: RenderArgs,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn render(&self) -> &RenderArgs {
        &self.render
    }
}

/// Arguments that control logging and where the receipt goes.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory the receipt image is written to. Defaults to the directory containing this
    /// program.
    #[arg(long, env = "BILL_SPLIT_OUTPUT_DIR", default_value_t = default_output_dir())]
    output_dir: DisplayPath,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn output_dir(&self) -> &DisplayPath {
        &self.output_dir
    }
}

/// Arguments that control how the receipt image is drawn.
#[derive(Debug, Parser, Clone)]
pub struct RenderArgs {
    /// Image width in pixels.
    #[arg(long, default_value_t = 1080)]
    width: u32,

    /// Distance between lines in pixels. The image height is the number of lines times this, plus
    /// twice the padding.
    #[arg(long, default_value_t = 80)]
    line_height: u32,

    /// Margin around the text in pixels.
    #[arg(long, default_value_t = 100)]
    padding: u32,

    /// Text size in pixels.
    #[arg(long, default_value_t = 32)]
    font_size: u32,

    /// The font family to draw with. Falls back to any installed sans-serif font.
    #[arg(long, default_value = "Arial")]
    font_family: String,

    /// A font file (.ttf, .otf, .ttc) to load in addition to the system fonts.
    #[arg(long, env = "BILL_SPLIT_FONT_FILE")]
    font_file: Option<PathBuf>,

    /// JPEG quality from 1 to 100.
    #[arg(long, default_value_t = 90)]
    quality: u8,
}

impl RenderArgs {
    /// Validates the arguments and converts them into `RenderSettings`.
    pub fn settings(&self) -> Result<RenderSettings> {
        RenderSettings::new(
            self.width,
            self.line_height,
            self.padding,
            self.font_size,
            self.font_family.clone(),
            self.font_file.clone(),
            self.quality,
        )
    }
}

fn default_output_dir() -> DisplayPath {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    DisplayPath(match exe_dir {
        Some(dir) => dir,
        None => {
            error!(
                "There was an error when trying to find the directory of this program. You can \
                get around this by providing --output-dir or BILL_SPLIT_OUTPUT_DIR. The receipt \
                will be written to the current directory.",
            );
            PathBuf::from(".")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["bill-split"]).unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::INFO);
        assert_eq!(args.render().settings().unwrap(), RenderSettings::default());
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "bill-split",
            "--log-level",
            "debug",
            "--output-dir",
            "/tmp/receipts",
            "--width",
            "640",
            "--quality",
            "70",
        ])
        .unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        assert_eq!(args.common().output_dir().path(), Path::new("/tmp/receipts"));
        let settings = args.render().settings().unwrap();
        assert_eq!(settings.width(), 640);
        assert_eq!(settings.quality(), 70);
        assert_eq!(settings.line_height(), 80);
    }

    #[test]
    fn test_invalid_quality() {
        let args = Args::try_parse_from(["bill-split", "--quality", "0"]).unwrap();
        assert!(args.render().settings().is_err());
    }

    #[test]
    fn test_unknown_argument() {
        assert!(Args::try_parse_from(["bill-split", "extra"]).is_err());
    }

    #[test]
    fn test_display_path() {
        let path = DisplayPath::from(PathBuf::from("a/b"));
        assert_eq!(path.to_string(), "a/b");
        assert_eq!(DisplayPath::from_str("a/b").unwrap(), path);
    }
}
