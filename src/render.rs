//! Draws receipt lines onto a white JPEG image.
//!
//! The lines are laid out as an SVG document, rasterized with `resvg` and encoded with the
//! `image` crate's JPEG encoder.

use crate::config::RenderSettings;
use crate::{utils, Result};
use anyhow::Context;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use resvg::usvg::fontdb::{Database, Family, Query};
use resvg::usvg::{Options, Tree};
use std::borrow::Cow;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiny_skia::{Pixmap, Transform};
use tracing::{debug, warn};

const BACKGROUND: &str = "#ffffff";
const TEXT_COLOR: &str = "#000000";
/// Distance from the top of a line's row down to its text baseline.
const BASELINE_OFFSET: u32 = 20;
/// Tried in order when the preferred font family is not installed.
const FALLBACK_FAMILIES: &[&str] = &["DejaVu Sans", "Liberation Sans", "Noto Sans", "Helvetica"];

/// Renders receipts with a fixed set of fonts and settings.
#[derive(Clone)]
pub struct Renderer {
    settings: RenderSettings,
    fontdb: Arc<Database>,
}

impl Renderer {
    /// Loads the system fonts, plus the font file from `settings` if there is one. The generic
    /// `sans-serif` family is pointed at the preferred family when it is installed, otherwise at
    /// another installed family so that text is always drawn.
    ///
    /// # Errors
    /// - The font file cannot be read.
    pub fn new(settings: RenderSettings) -> Result<Self> {
        let mut fontdb = Database::new();
        fontdb.load_system_fonts();
        if let Some(font_file) = settings.font_file() {
            fontdb
                .load_font_file(font_file)
                .with_context(|| format!("Unable to load font file {}", font_file.display()))?;
        }
        match sans_serif_family(&fontdb, settings.font_family()) {
            Some(family) => {
                if family != settings.font_family() {
                    warn!(
                        "The font family '{}' is not installed, using '{family}' instead",
                        settings.font_family()
                    );
                }
                fontdb.set_sans_serif_family(family);
            }
            None => warn!("No fonts were found, the receipt image will not contain any text"),
        }
        debug!("Loaded {} font faces", fontdb.len());
        Ok(Self {
            settings,
            fontdb: Arc::new(fontdb),
        })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Rasterizes `lines`, encodes them as JPEG and writes them to `output_dir`. The file is named
    /// after `stem` and the current time, see `file_name`.
    ///
    /// Returns the path of the written file.
    pub async fn render(
        &self,
        lines: &[String],
        stem: &str,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let image = self.rasterize(lines)?;
        let jpeg = self.encode(&image)?;
        let millis = chrono::Utc::now().timestamp_millis();
        let path = output_dir.join(file_name(stem, millis));
        utils::write(&path, jpeg).await?;
        debug!(
            "Wrote a {}x{} receipt to {}",
            image.width(),
            image.height(),
            path.display()
        );
        Ok(path)
    }

    /// Draws `lines` on a white background, one row per line.
    pub fn rasterize(&self, lines: &[String]) -> Result<RgbImage> {
        let width = self.settings.width();
        let height = self.settings.height(lines.len())?;
        let svg = self.svg(lines, height);

        let options = Options {
            fontdb: self.fontdb.clone(),
            ..Options::default()
        };
        let tree = Tree::from_str(&svg, &options).context("Unable to lay out the receipt")?;

        let mut pixmap = Pixmap::new(width, height)
            .with_context(|| format!("Unable to allocate a {width}x{height} image"))?;
        resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

        // The background is opaque, so demultiplying only drops the alpha channel.
        let rgb = pixmap
            .pixels()
            .iter()
            .flat_map(|pixel| {
                let color = pixel.demultiply();
                [color.red(), color.green(), color.blue()]
            })
            .collect();
        RgbImage::from_raw(width, height, rgb).context("Unable to convert the rendered receipt")
    }

    /// Encodes `image` as JPEG at the configured quality.
    pub fn encode(&self, image: &RgbImage) -> Result<Vec<u8>> {
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.settings.quality())
            .encode_image(image)
            .context("Unable to encode the receipt as JPEG")?;
        Ok(jpeg)
    }

    /// Lays out `lines` as an SVG document `height` pixels tall. Empty lines keep their row but
    /// produce no text element.
    fn svg(&self, lines: &[String], height: u32) -> String {
        let width = self.settings.width();
        let padding = self.settings.padding();
        let line_height = self.settings.line_height();

        let mut svg = String::with_capacity(512 + lines.len() * 128);
        let _ = writeln!(
            &mut svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        );
        let _ = writeln!(
            &mut svg,
            r#"<style>text {{ font-family: '{}', sans-serif; font-size: {}px; }}</style>"#,
            escape_xml(self.settings.font_family()),
            self.settings.font_size()
        );
        let _ = writeln!(
            &mut svg,
            r#"<rect width="{width}" height="{height}" fill="{BACKGROUND}" />"#
        );

        for (index, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let y = padding + index as u32 * line_height + BASELINE_OFFSET;
            let _ = writeln!(
                &mut svg,
                r#"<text x="{padding}" y="{y}" fill="{TEXT_COLOR}" xml:space="preserve">{}</text>"#,
                escape_xml(line)
            );
        }

        svg.push_str("</svg>");
        svg
    }
}

/// The receipt file name: `<url encoded stem>_<unix millis>.jpg`.
pub fn file_name(stem: &str, millis: i64) -> String {
    format!("{}_{millis}.jpg", url_encode(stem))
}

/// Percent-encodes everything except ASCII letters, digits and `-._*`. Spaces become `%20`.
fn url_encode(s: &str) -> String {
    // byte_serialize writes spaces as '+' and a literal '+' as %2B, so '+' is always a space.
    url::form_urlencoded::byte_serialize(s.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// The family `sans-serif` should resolve to: `preferred` if installed, then the first installed
/// fallback family, then the family of any loaded face.
fn sans_serif_family(fontdb: &Database, preferred: &str) -> Option<String> {
    let installed = |family: &str| {
        let query = Query {
            families: &[Family::Name(family)],
            ..Query::default()
        };
        fontdb.query(&query).is_some()
    };
    if installed(preferred) {
        return Some(preferred.to_string());
    }
    FALLBACK_FAMILIES
        .iter()
        .find(|family| installed(family))
        .map(|family| family.to_string())
        .or_else(|| {
            fontdb
                .faces()
                .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
        })
}

/// Characters that may not appear in an XML document, such as C0 control characters.
fn is_xml_illegal(c: char) -> bool {
    (c < ' ' && !matches!(c, '\t' | '\n' | '\r')) || matches!(c, '\u{FFFE}' | '\u{FFFF}')
}

/// Escapes XML markup characters and drops characters XML cannot hold.
fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s
        .chars()
        .any(|c| matches!(c, '&' | '<' | '>' | '"' | '\'') || is_xml_illegal(c))
    {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + 10);
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            c if is_xml_illegal(c) => {}
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lines(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    fn small() -> Renderer {
        let settings = RenderSettings::new(200, 20, 10, 12, "Arial", None, 80).unwrap();
        Renderer::new(settings).unwrap()
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            file_name("Rahim_Karim", 1760000000000),
            "Rahim_Karim_1760000000000.jpg"
        );
    }

    #[test]
    fn test_file_name_encodes() {
        assert_eq!(
            file_name("Ana María_Jo+Bo/x", 5),
            "Ana%20Mar%C3%ADa_Jo%2BBo%2Fx_5.jpg"
        );
        assert_eq!(url_encode("a.b-c*d"), "a.b-c*d");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("plain"), "plain");
        assert_eq!(escape_xml("<A & 'B'>"), "&lt;A &amp; &#39;B&#39;&gt;");
    }

    #[test]
    fn test_escape_xml_drops_control_characters() {
        assert_eq!(escape_xml("Bo\u{1}b"), "Bob");
        assert_eq!(escape_xml("a\u{1b}<b\u{FFFF}"), "a&lt;b");
        assert_eq!(escape_xml("tab\there"), "tab\there");
    }

    #[test]
    fn test_rasterize_name_with_control_character() {
        let renderer = small();
        let image = renderer
            .rasterize(&lines(&["Bo\u{1}b used: 1-0 = 1 unit"]))
            .unwrap();
        assert_eq!(image.height(), 20 + 2 * 10);
    }

    fn dark_pixels(image: &RgbImage) -> usize {
        image
            .pixels()
            .filter(|pixel| pixel.0.iter().all(|channel| *channel < 128))
            .count()
    }

    #[test]
    fn test_sans_serif_family_without_fonts() {
        assert!(sans_serif_family(&Database::new(), "Arial").is_none());
    }

    #[test]
    fn test_sans_serif_family_is_installed() {
        let mut fontdb = Database::new();
        fontdb.load_system_fonts();
        if fontdb.len() == 0 {
            return;
        }
        let family = sans_serif_family(&fontdb, "No Such Family 8d1f").unwrap();
        let query = Query {
            families: &[Family::Name(&family)],
            ..Query::default()
        };
        assert!(fontdb.query(&query).is_some(), "{family}");
    }

    #[test]
    fn test_rasterize_draws_text_when_family_is_missing() {
        let settings =
            RenderSettings::new(400, 40, 10, 24, "No Such Family 8d1f", None, 80).unwrap();
        let renderer = Renderer::new(settings).unwrap();
        if renderer.fontdb.len() == 0 {
            // Nothing can be drawn on a host without fonts.
            return;
        }
        let image = renderer
            .rasterize(&lines(&["A used: 150-100 = 50 unit"]))
            .unwrap();
        assert!(dark_pixels(&image) > 0);
    }

    #[test]
    fn test_rasterize_draws_text_with_default_settings() {
        let renderer = Renderer::new(RenderSettings::default()).unwrap();
        if renderer.fontdb.len() == 0 {
            return;
        }
        let image = renderer
            .rasterize(&lines(&["A used: 150-100 = 50 unit", "", "Total"]))
            .unwrap();
        assert!(dark_pixels(&image) > 0);
    }

    #[test]
    fn test_svg_layout() {
        let renderer = Renderer::new(RenderSettings::default()).unwrap();
        let receipt = lines(&["A used: 150-100 = 50 unit", "", "Tom & Jerry"]);
        let svg = renderer.svg(&receipt, 440);
        assert!(svg.starts_with(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="1080" height="440""#
        ));
        assert!(svg.contains(r##"fill="#ffffff""##));
        assert!(svg.contains("font-size: 32px"));
        // The spacer keeps its row but draws nothing.
        assert_eq!(svg.matches("<text ").count(), 2);
        assert!(svg.contains(r#"<text x="100" y="120" "#));
        assert!(svg.contains(r#"<text x="100" y="280" "#));
        assert!(svg.contains(">Tom &amp; Jerry</text>"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_rasterize_size_and_background() {
        let renderer = small();
        let image = renderer.rasterize(&lines(&["one", "two", "three"])).unwrap();
        assert_eq!(image.width(), 200);
        assert_eq!(image.height(), 3 * 20 + 2 * 10);
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(image.get_pixel(199, 79).0, [255, 255, 255]);
    }

    #[test]
    fn test_encode_is_jpeg() {
        let renderer = small();
        let image = renderer.rasterize(&lines(&["hello"])).unwrap();
        let jpeg = renderer.encode(&image).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 200);
        assert_eq!(decoded.height(), 40);
    }

    #[tokio::test]
    async fn test_render_writes_one_file() {
        let dir = TempDir::new().unwrap();
        let renderer = small();
        let path = renderer
            .render(&lines(&["x", "y"]), "A B_C", dir.path())
            .await
            .unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        let millis = name
            .strip_prefix("A%20B_C_")
            .and_then(|rest| rest.strip_suffix(".jpg"))
            .unwrap();
        assert!(!millis.is_empty());
        assert!(millis.chars().all(|c| c.is_ascii_digit()));

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_missing_font_file() {
        let settings = RenderSettings::new(
            200,
            20,
            10,
            12,
            "Arial",
            Some(PathBuf::from("/definitely/not/a/font.ttf")),
            80,
        )
        .unwrap();
        assert!(Renderer::new(settings).is_err());
    }
}
