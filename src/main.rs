use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use seasonfit::client::RelayClient;
use seasonfit::compose;
use seasonfit::config::{RelayConfig, DEFAULT_BODY_LIMIT};
use seasonfit::palette::{self, Season, Swatch, PRESETS};
use seasonfit::relay::{self, RESULT_FILE_NAME};
use seasonfit::removal::{Upload, DEFAULT_ENDPOINT};
use seasonfit::Session;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Keeps `columns * tile` and `rows * tile` well inside `u32`.
const MAX_TILE: i64 = 4096;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the background-removal relay
    Serve(ServeArgs),

    /// Remove a photo's background through a relay and render it on the swatches
    Preview(PreviewArgs),

    /// Print the preset swatch tables
    Palette {
        /// Only print this season
        #[arg(long)]
        season: Option<Season>,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// remove.bg API key
    #[arg(long, env = "REMOVEBG_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Upstream background-removal endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    upstream_url: String,

    /// Maximum upload size in bytes
    #[arg(long, default_value_t = DEFAULT_BODY_LIMIT)]
    body_limit: usize,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// Photo to process
    #[arg(short, long)]
    input: PathBuf,

    /// Directory for the processed image and composites
    #[arg(short, long, default_value = "preview")]
    output_dir: PathBuf,

    /// Base URL of a running relay
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    relay: String,

    /// Only render this season's swatches
    #[arg(long)]
    season: Option<Season>,

    /// Extra background as HEX:SEASON, e.g. "#F5E1DA:spring"
    #[arg(long, value_parser = parse_custom)]
    custom: Vec<Swatch>,

    /// Confirm a swatch by name (or custom hex); repeat to pick several
    #[arg(long)]
    pick: Vec<String>,

    /// Tile size of the contact sheet in pixels
    #[arg(
        long,
        default_value_t = 160,
        value_parser = clap::value_parser!(u32).range(1..=MAX_TILE)
    )]
    tile: u32,
}

fn parse_custom(value: &str) -> Result<Swatch, String> {
    let (hex, season) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("expected HEX:SEASON, got {value:?}"))?;
    let season: Season = season.parse().map_err(|e| format!("{e}"))?;
    Swatch::custom(format!("Custom {hex}"), hex, season).map_err(|e| format!("{e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Preview(args) => preview(args).await,
        Command::Palette { season } => {
            print_palette(season);
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = RelayConfig {
        addr: SocketAddr::new(args.host, args.port),
        upstream_url: args.upstream_url,
        body_limit: args.body_limit,
        ..RelayConfig::default()
    }
    .with_api_key(args.api_key);

    tracing::info!("seasonfit relay starting");
    tracing::info!("Upstream: {}", config.upstream_url);
    tracing::info!("Body limit: {} bytes", config.body_limit);

    relay::serve(&config).await.context("Relay server failed")
}

async fn preview(args: PreviewArgs) -> Result<()> {
    let upload = read_upload(&args.input)?;
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    let client = RelayClient::new(&args.relay);
    let mut session = Session::new();
    session.select_image(upload);

    let (ticket, upload) = session.begin_removal()?;
    tracing::info!("Removing background via {}", client.endpoint());
    let result = client
        .remove_background(&upload)
        .await
        .map_err(|e| e.user_message());
    session.complete_removal(ticket, result);

    if let Some(error) = session.error() {
        bail!("{}", error);
    }
    let processed = session
        .processed()
        .context("Relay returned no image")?
        .clone();

    let processed_path = args.output_dir.join(RESULT_FILE_NAME);
    std::fs::write(&processed_path, &processed)
        .with_context(|| format!("Failed to write {}", processed_path.display()))?;
    tracing::info!("Saved {}", processed_path.display());

    let subject = compose::decode_subject(&processed)?;
    let mut swatches: Vec<Swatch> = match args.season {
        Some(season) => palette::swatches(season).collect(),
        None => PRESETS.iter().map(Swatch::from).collect(),
    };
    swatches.extend(args.custom);

    for swatch in &swatches {
        session.preview_swatch(swatch)?;
        let path = args.output_dir.join(composite_file_name(swatch));
        compose::composite(&subject, swatch.rgb())
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!("Saved {}", path.display());
    }

    let sheet_path = args.output_dir.join("contact-sheet.png");
    compose::contact_sheet(&subject, &swatches, args.tile)
        .save(&sheet_path)
        .with_context(|| format!("Failed to write {}", sheet_path.display()))?;
    tracing::info!(
        "Rendered {} swatches into {}",
        swatches.len(),
        args.output_dir.display()
    );

    for name in &args.pick {
        let swatch = find_swatch(&swatches, name)
            .with_context(|| format!("No swatch named {name:?}"))?;
        session.confirm_swatch(swatch)?;
    }

    for (season, count) in session.counts().iter() {
        println!("{:<8} {}", season.key(), count);
    }
    match session.analysis() {
        Some(sentence) => println!("{sentence}"),
        None => println!("No swatches picked."),
    }

    Ok(())
}

fn read_upload(path: &Path) -> Result<Upload> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if bytes.is_empty() {
        bail!("{} is empty", path.display());
    }

    let mut upload = Upload::new(bytes);
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        upload = upload.with_file_name(name);
    }
    if let Ok(format) = image::ImageFormat::from_path(path) {
        upload = upload.with_content_type(format.to_mime_type());
    }
    Ok(upload)
}

fn find_swatch<'a>(swatches: &'a [Swatch], name: &str) -> Option<&'a Swatch> {
    let custom = palette::parse_hex(name).ok().map(palette::to_hex);
    swatches.iter().find(|s| {
        s.name.eq_ignore_ascii_case(name.trim()) || custom.as_deref() == Some(s.hex.as_str())
    })
}

fn composite_file_name(swatch: &Swatch) -> String {
    let slug: String = swatch
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("{}-{}.png", swatch.season.key(), slug.trim_matches('-'))
}

fn print_palette(season: Option<Season>) {
    let seasons = match season {
        Some(season) => vec![season],
        None => Season::ALL.to_vec(),
    };

    for season in seasons {
        println!("{} ({})", season.label(), season.key());
        for swatch in palette::swatches(season) {
            println!("  {:<14} {}", swatch.name, swatch.hex);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview_args(extra: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec!["seasonfit", "preview", "--input", "me.jpg"];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv)
    }

    fn tile(cli: Cli) -> u32 {
        match cli.command {
            Command::Preview(args) => args.tile,
            other => panic!("expected preview, got {other:?}"),
        }
    }

    #[test]
    fn test_tile_defaults_and_bounds() {
        assert_eq!(tile(preview_args(&[]).unwrap()), 160);
        assert_eq!(tile(preview_args(&["--tile", "4096"]).unwrap()), 4096);
        assert!(preview_args(&["--tile", "0"]).is_err());
        assert!(preview_args(&["--tile", "4097"]).is_err());
        assert!(preview_args(&["--tile", "4000000000"]).is_err());
    }

    #[test]
    fn test_parse_custom_swatch() {
        let swatch = parse_custom("#f5e1da:spring").unwrap();
        assert_eq!(swatch.hex, "#F5E1DA");
        assert_eq!(swatch.season, Season::Spring);
        assert!(parse_custom("#f5e1da").is_err());
        assert!(parse_custom("#zzzzzz:winter").is_err());
    }
}
