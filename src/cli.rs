use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use fex_lib::format::validate_scale;
use fex_lib::ImageFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fex")]
#[command(
    version,
    about = "Figma Exporter - Export rendered frame images from a Figma page",
    long_about = "Figma Exporter (FEX)\n\nFetches the Figma file named by --url, selects the children of the page given by its node-id (FRAME by default), renders them in one batch and saves each image to --image-save-path as <name>__<node-id>__<timestamp>.<format>.\n\nExit codes: 0 all images saved, 1 some images failed, 2 nothing exported (bad input or fatal error)."
)]
pub struct Cli {
    #[arg(
        long,
        short = 'u',
        help = "Figma file URL including the page node-id (e.g., https://www.figma.com/file/KEY/Title?node-id=1-2)"
    )]
    pub url: String,

    #[arg(
        long,
        short = 't',
        value_name = "TOKEN",
        help = "Figma personal access token (defaults to FIGMA_TOKEN, then FIGMA_OAUTH_TOKEN)"
    )]
    pub access_token: Option<String>,

    #[arg(
        long,
        short = 'p',
        value_name = "PATH",
        default_value = "./figma/images",
        help = "Directory the images are saved to; created if missing"
    )]
    pub image_save_path: PathBuf,

    #[arg(
        long,
        short = 'n',
        default_value = "FRAME",
        help = "Node types to export (comma-separated, e.g., FRAME,COMPONENT)"
    )]
    pub node_types: String,

    #[arg(
        long,
        short = 'i',
        value_name = "PATTERN",
        help = "Skip nodes whose name matches this regular expression"
    )]
    pub ignore_node_name: Option<String>,

    #[arg(
        long,
        short = 's',
        default_value = "2",
        value_parser = parse_scale,
        help = "Image scaling factor, a number between 0.01 and 4"
    )]
    pub scale: f32,

    #[arg(
        long,
        short = 'f',
        value_enum,
        default_value = "png",
        help = "Image output format"
    )]
    pub format: FormatArg,

    #[arg(
        long,
        default_value = "4",
        value_parser = clap::value_parser!(u16).range(1..),
        help = "Maximum number of images downloaded at once"
    )]
    pub concurrency: u16,

    #[arg(
        long,
        value_name = "SECS",
        default_value = "30",
        value_parser = clap::value_parser!(u64).range(1..),
        help = "HTTP timeout (seconds) for API calls and each image download"
    )]
    pub timeout: u64,

    #[arg(long, value_enum, default_value = "json", help = "Report format")]
    pub output_format: OutputFormat,

    #[arg(long, short, help = "Report file path (stdout if omitted)")]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Optional config file (TOML) with defaults for any flag; CLI flags override config"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose logging on stderr")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Jpg,
    Png,
    Svg,
    Pdf,
}

impl From<FormatArg> for ImageFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Jpg => ImageFormat::Jpg,
            FormatArg::Png => ImageFormat::Png,
            FormatArg::Svg => ImageFormat::Svg,
            FormatArg::Pdf => ImageFormat::Pdf,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
}

/// Records which flags came from the command line rather than defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlagSources {
    pub image_save_path: bool,
    pub node_types: bool,
    pub scale: bool,
    pub format: bool,
    pub concurrency: bool,
    pub timeout: bool,
}

impl FlagSources {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let explicit = |id: &str| matches.value_source(id) == Some(ValueSource::CommandLine);
        Self {
            image_save_path: explicit("image_save_path"),
            node_types: explicit("node_types"),
            scale: explicit("scale"),
            format: explicit("format"),
            concurrency: explicit("concurrency"),
            timeout: explicit("timeout"),
        }
    }
}

fn parse_scale(raw: &str) -> Result<f32, String> {
    let scale: f32 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    validate_scale(scale).map_err(|e| e.to_string())
}

pub fn parse() -> (Cli, FlagSources) {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    (cli, FlagSources::from_matches(&matches))
}
