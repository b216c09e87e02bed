use clap::{Parser, Subcommand};
use gateway_sdk::GatewayClient;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for the media gateway", long_about = None)]
struct Cli {
    #[arg(short, long, env = "GATEWAY_URL", default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print search suggestions for a partial query
    Suggest { query: String },
    /// Print one page of search results
    Search {
        query: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        /// relevance, rating, upload_date or view_count
        #[arg(short, long)]
        sort_by: Option<String>,
    },
    /// Print the stream selection for a video id
    Manifest { id: String },
    /// Fetch a byte range through the media proxy and print the response head
    Probe {
        target: String,
        #[arg(short, long, default_value = "bytes=0-1023")]
        range: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let client = GatewayClient::new(&cli.url);

    match cli.command {
        Commands::Suggest { query } => {
            for suggestion in client.suggest(&query).await? {
                println!("{suggestion}");
            }
        }
        Commands::Search { query, page, sort_by } => {
            let results = client.search(&query, page, sort_by.as_deref()).await?;
            for video in &results.videos {
                println!(
                    "{}  {}  ({})",
                    video["id"].as_str().unwrap_or("-"),
                    video["title"].as_str().unwrap_or("-"),
                    video["duration"].as_str().unwrap_or("live"),
                );
            }
            match results.next_page_token {
                Some(next) => println!("-- next page: {next}"),
                None => println!("-- last page"),
            }
        }
        Commands::Manifest { id } => {
            let summary = client.manifest(&id).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Probe { target, range } => {
            let res = client.proxy(&target, Some(&range)).await?;
            println!("{}", res.status());
            for (name, value) in res.headers() {
                println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
            }
            let body = res.bytes().await?;
            println!("-- {} body bytes", body.len());
        }
    }

    Ok(())
}
