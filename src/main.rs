//! permaqr command-line entrypoint

use anyhow::Context;
use clap::Parser;
use permaqr::{EcLevel, PermaqrConfig, QrGenerator, QrPayload, logging, render_report};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "permaqr",
    version,
    about = "Generate a permanent QR code PNG for a URL"
)]
struct Cli {
    /// Text or URL to encode (defaults to the configured URL)
    url: Option<String>,

    /// Optional configuration file (toml/yaml). Defaults to permaqr.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Destination PNG file, overwritten if it exists
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// QR version (1-40); the minimum when fitting is enabled
    #[arg(long = "qr-version", value_name = "N")]
    qr_version: Option<u8>,

    /// Error correction level (L, M, Q or H)
    #[arg(long, value_name = "LEVEL")]
    ec_level: Option<EcLevel>,

    /// Pixels per module
    #[arg(long, value_name = "PX")]
    box_size: Option<u32>,

    /// Quiet zone width in modules
    #[arg(long, value_name = "MODULES")]
    border: Option<u32>,

    /// Fail instead of upgrading the version when the payload does not fit
    #[arg(long)]
    no_fit: bool,

    /// Colour of dark modules (CSS syntax)
    #[arg(long, value_name = "COLOR")]
    fill_color: Option<String>,

    /// Colour of light modules and the quiet zone (CSS syntax)
    #[arg(long, value_name = "COLOR")]
    back_color: Option<String>,

    /// Decode the rendered image and check it before writing
    #[arg(long)]
    verify: bool,

    /// Print the generation report as JSON instead of the confirmation line
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn apply(self, config: &mut PermaqrConfig) {
        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(version) = self.qr_version {
            config.qr.version = version;
        }
        if let Some(level) = self.ec_level {
            config.qr.ec_level = level;
        }
        if let Some(box_size) = self.box_size {
            config.qr.box_size = box_size;
        }
        if let Some(border) = self.border {
            config.qr.border = border;
        }
        if self.no_fit {
            config.qr.fit = false;
        }
        if let Some(color) = self.fill_color {
            config.qr.fill_color = color;
        }
        if let Some(color) = self.back_color {
            config.qr.back_color = color;
        }
        if self.verify {
            config.verify = true;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let json = cli.json;

    let mut config = PermaqrConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    logging::init(&config.logging)?;
    match &config.source {
        Some(path) => info!("Using configuration file: {}", path.display()),
        None => debug!("No permaqr.toml / permaqr.yaml found, using defaults"),
    }
    config.validate()?;

    info!(url = %config.url, output = %config.output.display(), "Generating QR code");

    let payload = QrPayload::new(config.url.as_str())?;
    let report = QrGenerator::new(&config.qr)?
        .with_verification(config.verify)
        .generate(&payload, &config.output)
        .with_context(|| format!("failed to generate {}", config.output.display()))?;

    let rendered = render_report(&report)?;
    if json {
        println!("{}", rendered.to_json_string()?);
    } else {
        for line in &rendered.human {
            println!("{line}");
        }
    }

    Ok(())
}
