use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use csv::Reader;
use facebook_pagekit::{
    BatchOutcome, GraphClient, GraphConfig, pick_template, remote_error,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v19.0";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Publish a text post to the page feed
    Post {
        #[arg(short, long)]
        message: String,
        /// Treat the message as a topic and wrap it in a promotional caption
        #[arg(long)]
        viral: bool,
    },
    /// Schedule a post for a later unix timestamp
    Schedule {
        #[arg(short, long)]
        message: String,
        #[arg(short, long)]
        publish_time: i64,
    },
    /// Edit the message of an existing post
    Update {
        #[arg(long)]
        post_id: String,
        #[arg(short, long)]
        message: String,
    },
    DeletePost {
        #[arg(long)]
        post_id: String,
    },
    /// List recent page posts
    Posts,
    /// List comments on a post
    Comments {
        #[arg(long)]
        post_id: String,
    },
    Reply {
        #[arg(long)]
        comment_id: String,
        #[arg(short, long)]
        message: String,
    },
    DeleteComment {
        #[arg(long)]
        comment_id: String,
    },
    HideComment {
        #[arg(long)]
        comment_id: String,
    },
    UnhideComment {
        #[arg(long)]
        comment_id: String,
    },
    /// Fetch insight metrics for a post
    Insights {
        #[arg(long)]
        post_id: String,
        #[arg(short, long, required = true)]
        metrics: Vec<String>,
        #[arg(long, default_value = "lifetime")]
        period: String,
    },
    FanCount,
    ShareCount {
        #[arg(long)]
        post_id: String,
    },
    PostImage {
        #[arg(short, long)]
        url: String,
        #[arg(short, long)]
        caption: String,
    },
    PostVideo {
        #[arg(short, long)]
        url: String,
        #[arg(short, long)]
        description: String,
    },
    /// Post every media URL from a CSV column, best-effort
    PostBatch {
        #[arg(long)]
        media: String,
        #[arg(long)]
        column: String,
        #[arg(short, long)]
        caption: String,
    },
    /// Send a direct message, optionally with media attachments
    SendDm {
        #[arg(long)]
        user_id: String,
        #[arg(short, long)]
        message: String,
        #[arg(long)]
        media: Vec<String>,
    },
    /// Publish page stories from media URLs
    Story {
        #[arg(long, required = true)]
        media: Vec<String>,
    },
}

fn config_from_env() -> Result<GraphConfig> {
    let base_url =
        std::env::var("GRAPH_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let page_id = std::env::var("FB_PAGE_ID").context("FB_PAGE_ID is not set")?;
    let access_token =
        std::env::var("FB_PAGE_ACCESS_TOKEN").context("FB_PAGE_ACCESS_TOKEN is not set")?;

    Ok(GraphConfig {
        base_url,
        page_id,
        access_token,
    })
}

fn print_envelope(envelope: &Value) -> Result<()> {
    if let Some(error) = remote_error(envelope) {
        bail!("Graph API error: {}", serde_json::to_string_pretty(error)?);
    }
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(())
}

fn print_batch_outcome(outcome: &BatchOutcome) -> Result<()> {
    for item in &outcome.results {
        if item.succeeded() {
            println!("ok   {}", item.media_url);
        } else if let Some(error) = &item.error {
            println!("fail {}: {}", item.media_url, error);
        } else {
            println!("fail {}: remote API error", item.media_url);
        }
    }

    if !outcome.success {
        bail!("no batch item succeeded");
    }
    println!("{} of {} items succeeded",
        outcome.results.iter().filter(|r| r.succeeded()).count(),
        outcome.results.len());
    Ok(())
}

fn read_media_column(path: &str, column: &str) -> Result<Vec<String>> {
    let mut urls = Vec::new();
    let mut rdr = Reader::from_path(path)?;

    for result in rdr.deserialize() {
        let record: HashMap<String, String> = result?;
        if let Some(url) = record.get(column) {
            urls.push(url.clone());
        }
    }

    Ok(urls)
}

fn batch_spinner(message: String) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let client = GraphClient::new(config_from_env()?)?;

    match cli.command {
        Command::Post { message, viral } => {
            let message = if viral { pick_template(&message) } else { message };
            let envelope = client.post_message(&message).await?;
            print_envelope(&envelope)?;
        }
        Command::Schedule {
            message,
            publish_time,
        } => {
            let envelope = client.schedule_post(&message, publish_time).await?;
            print_envelope(&envelope)?;
        }
        Command::Update { post_id, message } => {
            let envelope = client.update_post(&post_id, &message).await?;
            print_envelope(&envelope)?;
        }
        Command::DeletePost { post_id } => {
            let envelope = client.delete_post(&post_id).await?;
            print_envelope(&envelope)?;
        }
        Command::Posts => {
            let envelope = client.get_posts().await?;
            print_envelope(&envelope)?;
        }
        Command::Comments { post_id } => {
            let envelope = client.get_comments(&post_id).await?;
            print_envelope(&envelope)?;
        }
        Command::Reply {
            comment_id,
            message,
        } => {
            let envelope = client.reply_to_comment(&comment_id, &message).await?;
            print_envelope(&envelope)?;
        }
        Command::DeleteComment { comment_id } => {
            let envelope = client.delete_comment(&comment_id).await?;
            print_envelope(&envelope)?;
        }
        Command::HideComment { comment_id } => {
            let envelope = client.hide_comment(&comment_id).await?;
            print_envelope(&envelope)?;
        }
        Command::UnhideComment { comment_id } => {
            let envelope = client.unhide_comment(&comment_id).await?;
            print_envelope(&envelope)?;
        }
        Command::Insights {
            post_id,
            metrics,
            period,
        } => {
            let envelope = if metrics.len() == 1 {
                client.get_insights(&post_id, &metrics[0], &period).await?
            } else {
                client.get_bulk_insights(&post_id, &metrics, &period).await?
            };
            print_envelope(&envelope)?;
        }
        Command::FanCount => {
            println!("{}", client.page_fan_count().await?);
        }
        Command::ShareCount { post_id } => {
            println!("{}", client.post_share_count(&post_id).await?);
        }
        Command::PostImage { url, caption } => {
            let envelope = client.post_image(&url, &caption).await?;
            print_envelope(&envelope)?;
        }
        Command::PostVideo { url, description } => {
            let envelope = client.post_video(&url, &description).await?;
            print_envelope(&envelope)?;
        }
        Command::PostBatch {
            media,
            column,
            caption,
        } => {
            let urls = read_media_column(&media, &column)?;
            if urls.is_empty() {
                bail!("no media URLs found in column '{column}'");
            }
            println!("{} media items found", urls.len());

            let pb = batch_spinner(format!("Posting {} media items", urls.len()))?;
            let outcome = client.post_media_batch(&urls, &caption).await;
            pb.finish_and_clear();

            print_batch_outcome(&outcome)?;
        }
        Command::SendDm {
            user_id,
            message,
            media,
        } => {
            if media.is_empty() {
                let envelope = client.send_message(&user_id, &message).await?;
                print_envelope(&envelope)?;
            } else {
                let receipt = client
                    .send_message_with_media(&user_id, &message, &media)
                    .await?;
                println!("{}", serde_json::to_string_pretty(&receipt)?);
            }
        }
        Command::Story { media } => {
            let pb = batch_spinner(format!("Publishing {} story items", media.len()))?;
            let outcome = client.create_story(&media).await;
            pb.finish_and_clear();

            print_batch_outcome(&outcome)?;
        }
    }

    Ok(())
}
