use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::{fs, path::PathBuf, sync::Arc};

use crate::{
    config::Config,
    domain::{
        album::Album,
        cover::CoverImage,
        track::{FieldName, FieldUpdates},
    },
    http::server::HttpServer,
    library::{Library, mutate::MutationReport},
    remote::{HttpImageFetcher, ImageFetcher},
};

#[derive(Parser)]
#[command(name = "opustag")]
#[command(version = "0.1")]
#[command(about = "FLAC tag and album cover editor")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Group the FLAC files under a directory into albums
    Scan {
        /// Directory to scan, defaults to the configured music directory
        path: Option<PathBuf>,
        /// Print the albums as JSON
        #[arg(long)]
        json: bool,
    },
    /// Extract the cover of a file
    Cover {
        file: PathBuf,
        /// Where to write the image
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Write tag fields into files
    Update {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Embed a cover image into files
    Embed {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Download the image from this URL
        #[arg(long, conflicts_with = "image", required_unless_present = "image")]
        url: Option<String>,
        /// Read the image from a local file
        #[arg(long)]
        image: Option<PathBuf>,
        /// Override the MIME type guessed from the image file name
        #[arg(long, requires = "image")]
        mime: Option<String>,
    },
    /// Run http server exposing the library
    Serve,
}

#[derive(Args, Default)]
pub struct FieldArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    artist: Option<String>,
    #[arg(long)]
    album_artist: Option<String>,
    #[arg(long)]
    album: Option<String>,
    #[arg(long)]
    year: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long)]
    composer: Option<String>,
    #[arg(long)]
    track_number: Option<String>,
}

impl FieldArgs {
    fn into_updates(self) -> FieldUpdates {
        [
            (FieldName::Title, self.title),
            (FieldName::Artist, self.artist),
            (FieldName::AlbumArtist, self.album_artist),
            (FieldName::Album, self.album),
            (FieldName::Year, self.year),
            (FieldName::Genre, self.genre),
            (FieldName::Composer, self.composer),
            (FieldName::TrackNumber, self.track_number),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect()
    }
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = Config::load_or_default(&cli.config)?;
    let library = Library::new(&cfg.library);

    match cli.command {
        Commands::Scan { path, json } => {
            let root = path.unwrap_or_else(|| cfg.library.default_root());
            let albums = library.scan(&root)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&albums)?);
            } else {
                print_albums(&albums);
            }
        }

        Commands::Cover { file, out } => {
            let cover = library
                .get_cover_bytes(&file)?
                .with_context(|| format!("No cover found for {}", file.display()))?;
            fs::write(&out, &cover.data)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!(
                "Wrote {} ({}, {} bytes)",
                out.display(),
                cover.mime_type,
                cover.data.len()
            );
        }

        Commands::Update { files, fields } => {
            let updates = fields.into_updates();
            if updates.is_empty() {
                anyhow::bail!("No fields given, nothing to update");
            }
            print_report(&library.update_fields(&files, &updates));
        }

        Commands::Embed {
            files,
            url,
            image,
            mime,
        } => {
            let report = match (url, image) {
                (Some(url), _) => {
                    let fetcher = HttpImageFetcher::new(cfg.fetch.timeout());
                    library.embed_cover_from_url(&files, &url, &fetcher)?
                }
                (None, Some(image)) => {
                    let data = fs::read(&image)
                        .with_context(|| format!("Failed to read {}", image.display()))?;
                    let cover = match mime {
                        Some(mime) => CoverImage::new(data, mime),
                        None => CoverImage::from_file_data(&image, data),
                    };
                    library.embed_cover(&files, &cover)
                }
                (None, None) => anyhow::bail!("Either --url or --image is required"),
            };
            print_report(&report);
        }

        Commands::Serve => {
            println!("Starting HTTP server...");

            let fetcher: Arc<dyn ImageFetcher> =
                Arc::new(HttpImageFetcher::new(cfg.fetch.timeout()));
            let http_server = HttpServer::new(cfg.library, cfg.http, fetcher);

            println!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr, http_server.config.port
            );
            http_server.run();
        }
    }

    Ok(())
}

fn print_albums(albums: &[Album]) {
    println!("Found {} albums", albums.len());
    for album in albums {
        let cover = if album.has_cover { "" } else { " [no cover]" };
        println!(
            "{} - {} ({} tracks){}",
            album.artist, album.title, album.track_count, cover
        );
        println!("  id: {}", album.id);
        for track in &album.tracks {
            println!(
                "    {:>3}. {}",
                track.ordinal(),
                track.title.as_deref().unwrap_or("")
            );
        }
    }
}

fn print_report(report: &MutationReport) {
    println!("Processed {} files", report.processed);
    if !report.failures.is_empty() {
        println!("Failed ({}):", report.failures.len());
        for failure in &report.failures {
            println!("    - {}: {}", failure.path.to_string_lossy(), failure.reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_flags_become_field_updates() {
        let cli = Cli::parse_from([
            "opustag",
            "update",
            "a.flac",
            "b.flac",
            "--genre",
            "Jazz",
            "--album-artist",
            "Various",
        ]);

        let Commands::Update { files, fields } = cli.command else {
            panic!("expected update command");
        };
        assert_eq!(files.len(), 2);

        let updates = fields.into_updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[&FieldName::Genre], "Jazz");
        assert_eq!(updates[&FieldName::AlbumArtist], "Various");
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::parse_from(["opustag", "scan", "--json"]);
        assert_eq!(cli.config, PathBuf::from("config.toml"));
        assert!(matches!(cli.command, Commands::Scan { path: None, json: true }));
    }

    #[test]
    fn test_embed_requires_a_source() {
        assert!(Cli::try_parse_from(["opustag", "embed", "a.flac"]).is_err());
        assert!(
            Cli::try_parse_from([
                "opustag", "embed", "a.flac", "--url", "http://x", "--image", "c.jpg"
            ])
            .is_err()
        );
        assert!(Cli::try_parse_from(["opustag", "embed", "a.flac", "--image", "c.jpg"]).is_ok());
    }

    #[test]
    fn test_mime_needs_image() {
        assert!(
            Cli::try_parse_from(["opustag", "embed", "a.flac", "--url", "http://x", "--mime", "image/png"])
                .is_err()
        );
    }
}
