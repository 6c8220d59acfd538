use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Manage embeddable media records from the command line
#[derive(Parser)]
#[command(name = "embeddable")]
#[command(about = "Attach remote media to records, mirror thumbnails and render embeds", long_about = None)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "EMBEDDABLE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create or update an embed and synchronize it with its source
    Save {
        /// Existing embed id; omit to create
        #[arg(long)]
        id: Option<i64>,
        /// Record type profile for new embeds (e.g. Embed, Video)
        #[arg(short = 't', long = "type")]
        record_type: Option<String>,
        #[arg(short, long)]
        url: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Attach an already stored image asset
        #[arg(long)]
        image: Option<i64>,
        /// Acting user id stamped on mirrored assets
        #[arg(long)]
        user: Option<i64>,
    },
    /// Show one embed as JSON
    Show { id: i64 },
    /// List embeds (title, type, URL)
    List {
        #[arg(short = 't', long = "type")]
        record_type: Option<String>,
    },
    /// Render an embed to HTML
    Render {
        id: i64,
        /// Base template name
        #[arg(long, default_value = "Embed")]
        template: String,
        /// CSS classes, space separated; may be repeated
        #[arg(long)]
        class: Vec<String>,
    },
    /// Delete an embed (mirrored images are kept)
    Delete { id: i64 },
    /// Print the edit form layout for a record type as JSON
    Form {
        #[arg(default_value = "Embed")]
        record_type: String,
    },
    /// Print the metadata extracted from a URL
    Fetch { url: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_render_with_repeated_classes() {
        let cli = Cli::try_parse_from(["embeddable", "render", "3", "--class", "wide", "--class", "dark"]).unwrap();
        match cli.command {
            Commands::Render { id, template, class } => {
                assert_eq!(id, 3);
                assert_eq!(template, "Embed");
                assert_eq!(class, vec!["wide".to_string(), "dark".to_string()]);
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn unknown_subcommands_are_rejected() {
        assert!(Cli::try_parse_from(["embeddable", "vacuum"]).is_err());
    }
}
