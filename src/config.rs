//! Configuration for a bill-split run.
//!
//! There is no configuration file. The `Config` object is built from command line arguments (or
//! their environment variable fallbacks) and holds the output directory along with the settings
//! used to draw the receipt image.

use crate::{utils, Result};
use anyhow::{ensure, Context};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const WIDTH: u32 = 1080;
const LINE_HEIGHT: u32 = 80;
const PADDING: u32 = 100;
const FONT_SIZE: u32 = 32;
const FONT_FAMILY: &str = "Arial";
const QUALITY: u8 = 90;

/// How the receipt image is laid out and encoded.
///
/// The image is `width` pixels wide and `lines * line_height + 2 * padding` pixels tall.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct RenderSettings {
    /// Image width in pixels.
    width: u32,

    /// Vertical distance between consecutive lines, in pixels.
    line_height: u32,

    /// Blank margin on the left and above and below the text, in pixels.
    padding: u32,

    /// Text size in pixels.
    font_size: u32,

    /// Preferred font family. Any sans-serif font is used when it is not installed.
    font_family: String,

    /// An extra font file to load in addition to the system fonts.
    #[serde(skip_serializing_if = "Option::is_none")]
    font_file: Option<PathBuf>,

    /// JPEG quality, 1 to 100.
    quality: u8,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: WIDTH,
            line_height: LINE_HEIGHT,
            padding: PADDING,
            font_size: FONT_SIZE,
            font_family: FONT_FAMILY.to_string(),
            font_file: None,
            quality: QUALITY,
        }
    }
}

impl RenderSettings {
    /// Creates new settings, checking that they can produce an image.
    ///
    /// # Errors
    /// - `width`, `line_height` or `font_size` is zero
    /// - `font_family` is blank
    /// - `quality` is not within 1..=100
    pub fn new(
        width: u32,
        line_height: u32,
        padding: u32,
        font_size: u32,
        font_family: impl Into<String>,
        font_file: Option<PathBuf>,
        quality: u8,
    ) -> Result<Self> {
        let settings = Self {
            width,
            line_height,
            padding,
            font_size,
            font_family: font_family.into(),
            font_file,
            quality,
        };
        ensure!(settings.width > 0, "The image width must be greater than zero");
        ensure!(
            settings.line_height > 0,
            "The line height must be greater than zero"
        );
        ensure!(
            settings.font_size > 0,
            "The font size must be greater than zero"
        );
        ensure!(
            !settings.font_family.trim().is_empty(),
            "The font family cannot be empty"
        );
        ensure!(
            (1..=100).contains(&settings.quality),
            "The JPEG quality must be between 1 and 100, got {}",
            settings.quality
        );
        Ok(settings)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn line_height(&self) -> u32 {
        self.line_height
    }

    pub fn padding(&self) -> u32 {
        self.padding
    }

    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_file(&self) -> Option<&Path> {
        self.font_file.as_deref()
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// The image height needed for `line_count` lines.
    pub fn height(&self, line_count: usize) -> Result<u32> {
        let lines = u32::try_from(line_count).context("Too many lines to draw")?;
        lines
            .checked_mul(self.line_height)
            .and_then(|text| text.checked_add(self.padding.checked_mul(2)?))
            .context("The image would be too tall")
    }
}

/// The `Config` object represents the configuration of a run. You instantiate it by providing the
/// output directory, which is created if it does not exist, and the render settings.
#[derive(Debug, Clone)]
pub struct Config {
    output_dir: PathBuf,
    render: RenderSettings,
}

impl Config {
    /// This will
    /// - create `output_dir` if it does not exist
    /// - canonicalize it
    /// - return the configuration object
    ///
    /// # Errors
    /// - Returns an error if the directory cannot be created or resolved.
    pub async fn new(output_dir: impl Into<PathBuf>, render: RenderSettings) -> Result<Self> {
        let maybe_relative = output_dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the output directory")?;
        let output_dir = utils::canonicalize(&maybe_relative).await?;
        debug!("Receipts will be written to {}", output_dir.display());
        Ok(Self { output_dir, render })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn render(&self) -> &RenderSettings {
        &self.render
    }
}
