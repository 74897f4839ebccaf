//! Replay a recorded stroke script over an image, export the mask, and
//! optionally send the edit to the remote API. Also drives the
//! mask-free endpoints: image generation and the product studio.

mod remote;
mod script;

use std::path::{Path, PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand};
use visionary_mask::generate::MAX_RESULTS;
use visionary_mask::{
    ApiConfig, AspectRatio, DisplaySize, EditFeature, EnhanceRequest, GenerateRequest,
    GenerateSettings, ImageStyle, ProductMode, ProductRequest, ProductSettings, Session,
    ShadowType, SourceImage, Upload,
};

use crate::script::StrokeScript;

/// Paint masks from stroke scripts and run fill / erase edits.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export the mask painted by a stroke script.
    Mask {
        #[command(flatten)]
        input: Input,

        /// Output mask path (PNG).
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the image with the mask overlay drawn on top.
        #[arg(long, value_name = "PATH")]
        preview: Option<PathBuf>,
    },

    /// Paint the mask and submit it for editing.
    Submit {
        #[command(flatten)]
        input: Input,

        /// Edit to perform: "fill" or "erase".
        #[arg(short, long)]
        feature: EditFeature,

        /// What should appear in the masked area (fill only).
        #[arg(short, long)]
        prompt: Option<String>,

        #[command(flatten)]
        remote: Remote,

        /// Where to save the edited image.
        #[arg(short, long, default_value = visionary_mask::api::RESULT_FILENAME)]
        output: PathBuf,

        /// Also save the exported mask.
        #[arg(long, value_name = "PATH")]
        mask: Option<PathBuf>,
    },

    /// Generate images from a text prompt.
    Generate {
        /// Description of the image.
        prompt: String,

        /// Rewrite the prompt with the enhancement endpoint first.
        #[arg(long)]
        enhance: bool,

        /// How many images to generate (1-4).
        #[arg(short = 'n', long, default_value_t = 1,
              value_parser = clap::value_parser!(u8).range(1..=i64::from(MAX_RESULTS)))]
        count: u8,

        /// Aspect ratio: 1:1, 16:9, 9:16, 4:3 or 3:4.
        #[arg(long, default_value_t = AspectRatio::default())]
        aspect_ratio: AspectRatio,

        /// Rendering style, e.g. "realistic" or "oil-painting".
        #[arg(long, default_value_t = ImageStyle::default())]
        style: ImageStyle,

        #[command(flatten)]
        remote: Remote,

        /// Where to save the images. Several images are numbered
        /// `name-1.png`, `name-2.png`, ...
        #[arg(short, long, default_value = visionary_mask::api::RESULT_FILENAME)]
        output: PathBuf,
    },

    /// Restage a product photo: packshot, shadow, or lifestyle scene.
    Product {
        /// Product image path.
        image: PathBuf,

        /// Mode: packshot, shadow, or lifestyle.
        #[arg(short, long, default_value = "packshot")]
        mode: ProductMode,

        /// Packshot background color.
        #[arg(long, value_name = "#RRGGBB", default_value = visionary_mask::product::DEFAULT_BACKGROUND)]
        background: String,

        /// Shadow mode's shadow: regular or float.
        #[arg(long, default_value = "regular")]
        shadow: ShadowType,

        /// Lifestyle mode's scene.
        #[arg(long, default_value = visionary_mask::product::DEFAULT_SCENE)]
        scene: String,

        #[command(flatten)]
        remote: Remote,

        /// Where to save the result.
        #[arg(short, long, default_value = visionary_mask::api::RESULT_FILENAME)]
        output: PathBuf,
    },
}

/// Image and strokes shared by the mask subcommands.
#[derive(ClapArgs)]
struct Input {
    /// Source image path.
    image: PathBuf,

    /// Stroke script (JSON).
    #[arg(short, long, value_name = "JSON")]
    strokes: PathBuf,

    /// Rendered size the strokes were recorded at, as "WxH". Overrides
    /// the script's own `display`.
    #[arg(long, value_name = "WxH", value_parser = parse_display)]
    display: Option<DisplaySize>,
}

/// Connection settings shared by every subcommand that calls the API.
#[derive(ClapArgs)]
struct Remote {
    /// Base URL of the image API (absolute URL or bare host name).
    #[arg(long, env = "VISIONARY_API_URL")]
    api_url: String,

    /// API key forwarded to the server.
    #[arg(long, env = "VISIONARY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, value_name = "SECS", default_value_t = 120)]
    timeout: u64,
}

impl Remote {
    fn config(self) -> Result<ApiConfig, visionary_mask::ConfigError> {
        Ok(ApiConfig::new(self.api_url)?
            .with_api_key(self.api_key)
            .with_timeout_secs(Some(self.timeout)))
    }
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

/// Parse `--display "WxH"` into a usable display size.
fn parse_display(s: &str) -> Result<DisplaySize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("display must be 'WxH', got: '{s}'"))?;
    let width: f64 = w
        .trim()
        .parse()
        .map_err(|e| format!("invalid display width '{w}': {e}"))?;
    let height: f64 = h
        .trim()
        .parse()
        .map_err(|e| format!("invalid display height '{h}': {e}"))?;
    let size = DisplaySize::new(width, height);
    if !size.is_usable() {
        return Err(format!("display size must be positive, got: '{s}'"));
    }
    Ok(size)
}

/// Path for image `index` (0-based) of `total`: `base` itself for a
/// single image, otherwise `stem-N.ext`.
fn numbered(base: &Path, index: usize, total: usize) -> PathBuf {
    if total <= 1 {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map_or_else(|| "image".into(), |s| s.to_string_lossy());
    let name = match base.extension() {
        Some(ext) => format!("{stem}-{}.{}", index + 1, ext.to_string_lossy()),
        None => format!("{stem}-{}", index + 1),
    };
    base.with_file_name(name)
}

// ---------------------------------------------------------------------------
// Session setup
// ---------------------------------------------------------------------------

/// Read an image file into an upload named after the file.
fn read_upload(path: &Path) -> Result<Upload, std::io::Error> {
    log::info!("Reading image from {}", path.display());
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map_or_else(|| "image".to_owned(), |n| n.to_string_lossy().into_owned());
    Ok(Upload::new(bytes, filename))
}

/// Load the image into a fresh session and replay the strokes over it.
fn paint(feature: EditFeature, input: &Input) -> Result<Session, Box<dyn std::error::Error>> {
    let upload = read_upload(&input.image)?;
    let mut session = Session::new(feature);
    let ticket = session.begin_load()?;
    let dimensions = session.finish_load(ticket, upload)?;
    log::info!("Loaded {dimensions} image");

    let mut script = StrokeScript::parse(&std::fs::read_to_string(&input.strokes)?)?;
    if input.display.is_some() {
        script.display = input.display;
    }
    let drawn = script.replay(&mut session)?;
    log::info!(
        "Replayed {} strokes ({drawn} points) from {}",
        script.strokes.len(),
        input.strokes.display()
    );
    Ok(session)
}

fn write_mask(session: &Session, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let export = session.controller().export_mask()?;
    if export.fallback {
        log::warn!("mask could not be composited; writing an all-black mask");
    }
    std::fs::write(path, &export.png)?;
    log::info!("Saved {} mask to {}", export.dimensions, path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn run_mask(
    input: &Input,
    output: &Path,
    preview: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    // The overlay only affects the preview.
    let session = paint(EditFeature::GenerativeFill, input)?;
    write_mask(&session, output)?;

    if let Some(path) = preview {
        let composed = session
            .controller()
            .preview()
            .ok_or("no image to preview")?;
        composed.save(path)?;
        log::info!("Saved preview to {}", path.display());
    }
    Ok(())
}

fn run_submit(
    input: &Input,
    feature: EditFeature,
    prompt: Option<String>,
    config: &ApiConfig,
    output: &Path,
    mask: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = paint(feature, input)?;
    if let Some(path) = mask {
        write_mask(&session, path)?;
    }
    if let Some(prompt) = prompt {
        session.set_prompt(prompt);
    }

    let request = session.begin_submit(config.api_key.as_deref())?;
    let client = remote::client(config)?;
    log::info!("{}...", feature.busy_label());
    let outcome = remote::submit(&client, config, &request);
    let url = session.finish_submit(outcome)?.to_owned();
    log::info!("Result available at {url}");

    let image = remote::download(&client, &url)?;
    std::fs::write(output, &image)?;
    log::info!("Saved result to {}", output.display());
    Ok(())
}

fn run_generate(
    prompt: &str,
    enhance: bool,
    settings: &GenerateSettings,
    config: &ApiConfig,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = remote::client(config)?;
    let key = config.api_key.as_deref();

    let prompt = if enhance {
        let request = EnhanceRequest::new(prompt, key)?;
        let enhanced = remote::enhance(&client, config, &request)?;
        log::info!("Enhanced prompt: {enhanced}");
        enhanced
    } else {
        prompt.to_owned()
    };

    let request = GenerateRequest::new(&prompt, settings, key)?;
    log::info!(
        "Generating {} {} image(s) in {} style...",
        settings.count(),
        settings.aspect_ratio,
        settings.style
    );
    let urls = remote::generate(&client, config, &request)?;
    for (index, url) in urls.iter().enumerate() {
        let path = numbered(output, index, urls.len());
        std::fs::write(&path, remote::download(&client, url)?)?;
        log::info!("Saved {url} to {}", path.display());
    }
    Ok(())
}

fn run_product(
    image: &Path,
    mode: ProductMode,
    settings: &ProductSettings,
    config: &ApiConfig,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = SourceImage::decode(read_upload(image)?)?;
    log::info!("Loaded {} product image", source.dimensions());

    let request = ProductRequest::new(&source, mode, settings, config.api_key.as_deref())?;
    let client = remote::client(config)?;
    log::info!("Creating {mode} shot...");
    let url = remote::submit(&client, config, &request)?.into_url();
    log::info!("Result available at {url}");

    std::fs::write(output, remote::download(&client, &url)?)?;
    log::info!("Saved result to {}", output.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::Mask {
            input,
            output,
            preview,
        } => run_mask(&input, &output, preview.as_deref()),
        Command::Submit {
            input,
            feature,
            prompt,
            remote,
            output,
            mask,
        } => run_submit(
            &input,
            feature,
            prompt,
            &remote.config()?,
            &output,
            mask.as_deref(),
        ),
        Command::Generate {
            prompt,
            enhance,
            count,
            aspect_ratio,
            style,
            remote,
            output,
        } => {
            let mut settings = GenerateSettings::default();
            settings.aspect_ratio = aspect_ratio;
            settings.style = style;
            settings.set_count(count);
            run_generate(&prompt, enhance, &settings, &remote.config()?, &output)
        }
        Command::Product {
            image,
            mode,
            background,
            shadow,
            scene,
            remote,
            output,
        } => {
            let settings = ProductSettings {
                background_color: background,
                shadow_type: shadow,
                scene_description: scene,
            };
            run_product(&image, mode, &settings, &remote.config()?, &output)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_accepts_either_separator() {
        assert_eq!(parse_display("200x150").unwrap(), DisplaySize::new(200.0, 150.0));
        assert_eq!(parse_display("640X480").unwrap(), DisplaySize::new(640.0, 480.0));
        assert_eq!(parse_display("12.5 x 7").unwrap(), DisplaySize::new(12.5, 7.0));
    }

    #[test]
    fn display_rejects_malformed_sizes() {
        assert!(parse_display("200").is_err());
        assert!(parse_display("ax150").is_err());
        assert!(parse_display("0x150").is_err());
        assert!(parse_display("200x-1").is_err());
    }

    #[test]
    fn submit_reads_feature_names() {
        let args = Args::try_parse_from([
            "visionary-cli",
            "submit",
            "photo.png",
            "--strokes",
            "strokes.json",
            "--feature",
            "erase",
            "--api-url",
            "https://api.example.com",
        ])
        .unwrap();
        let Command::Submit {
            feature, output, ..
        } = args.command
        else {
            unreachable!("parsed a submit command");
        };
        assert_eq!(feature, EditFeature::ObjectEraser);
        assert_eq!(output, PathBuf::from(visionary_mask::api::RESULT_FILENAME));
    }

    #[test]
    fn mask_requires_output() {
        assert!(
            Args::try_parse_from(["visionary-cli", "mask", "photo.png", "--strokes", "s.json"])
                .is_err()
        );
    }

    #[test]
    fn generate_reads_settings() {
        let args = Args::try_parse_from([
            "visionary-cli",
            "generate",
            "a fox in snow",
            "-n",
            "3",
            "--aspect-ratio",
            "9:16",
            "--style",
            "digital-art",
            "--api-url",
            "api.example.com",
        ])
        .unwrap();
        let Command::Generate {
            prompt,
            enhance,
            count,
            aspect_ratio,
            style,
            ..
        } = args.command
        else {
            unreachable!("parsed a generate command");
        };
        assert_eq!(prompt, "a fox in snow");
        assert!(!enhance);
        assert_eq!(count, 3);
        assert_eq!(aspect_ratio, AspectRatio::Vertical);
        assert_eq!(style, ImageStyle::DigitalArt);
    }

    #[test]
    fn generate_count_is_bounded() {
        for count in ["0", "5"] {
            assert!(
                Args::try_parse_from([
                    "visionary-cli",
                    "generate",
                    "x",
                    "-n",
                    count,
                    "--api-url",
                    "h",
                ])
                .is_err()
            );
        }
    }

    #[test]
    fn product_defaults_to_white_packshot() {
        let args = Args::try_parse_from([
            "visionary-cli",
            "product",
            "mug.jpg",
            "--api-url",
            "https://api.example.com",
        ])
        .unwrap();
        let Command::Product {
            mode,
            background,
            shadow,
            scene,
            ..
        } = args.command
        else {
            unreachable!("parsed a product command");
        };
        assert_eq!(mode, ProductMode::Packshot);
        assert_eq!(background, "#FFFFFF");
        assert_eq!(shadow, ShadowType::Regular);
        assert_eq!(scene, "A professional studio setting");
    }

    #[test]
    fn several_images_are_numbered() {
        let base = Path::new("out/result.png");
        assert_eq!(numbered(base, 0, 1), PathBuf::from("out/result.png"));
        assert_eq!(numbered(base, 0, 3), PathBuf::from("out/result-1.png"));
        assert_eq!(numbered(base, 2, 3), PathBuf::from("out/result-3.png"));
        assert_eq!(numbered(Path::new("shot"), 1, 2), PathBuf::from("shot-2"));
    }
}
