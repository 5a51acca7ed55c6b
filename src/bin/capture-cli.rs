use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "capture-cli")]
#[command(about = "Management CLI for the HTTP capture service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List captured requests
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        per_page: u32,
    },
    /// Show a single captured request
    Show { id: i64 },
    /// Delete a single captured request
    Delete { id: i64 },
    /// Clear all captured requests
    Clear,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::List { page, per_page } => {
            let res = client
                .get(format!(
                    "{}/api/requests?page={}&per_page={}",
                    cli.url, page, per_page
                ))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Show { id } => {
            let res = client
                .get(format!("{}/api/requests/{}", cli.url, id))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Delete { id } => {
            let res = client
                .delete(format!("{}/api/requests/{}", cli.url, id))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Clear => {
            let res = client
                .delete(format!("{}/api/requests", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let body: Value = res.json().await?;
    println!("HTTP {}", status);
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
