mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use embeddable::config::EmbedConfig;
use embeddable::render::RenderOptions;
use embeddable::{EmbedInput, Embeddable};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("embeddable=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EmbedConfig::load(cli.config.as_deref())?;
    let app = Embeddable::connect(config).await?;

    match cli.command {
        Commands::Save { id, record_type, url, title, description, image, user } => {
            let input = EmbedInput { id, record_type, title, source_url: url, description, image_id: image };
            let record = app.save_embed(input, user).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Show { id } => {
            let record = app.get_embed(id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::List { record_type } => {
            for s in app.list_summaries(record_type.as_deref()).await? {
                println!("{}\t{}\t{}\t{}", s.id, s.title, s.embed_type, s.source_url);
            }
        }
        Commands::Render { id, template, class } => {
            let opts = class.iter().fold(RenderOptions::default().with_template(template), |o, c| o.with_class(c));
            println!("{}", app.render_embed(id, &opts).await?);
        }
        Commands::Delete { id } => {
            if app.delete_embed(id).await? {
                println!("Deleted embed {id}");
            } else {
                println!("No embed with id {id}");
            }
        }
        Commands::Form { record_type } => {
            println!("{}", serde_json::to_string_pretty(&app.form_fields(&record_type))?);
        }
        Commands::Fetch { url } => {
            let meta = app.fetch_metadata(&url).await?;
            println!("{}", serde_json::to_string_pretty(&meta)?);
        }
    }
    Ok(())
}
