use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use api_monitor::monitor::{ProblemKind, Severity};

#[derive(Parser)]
#[command(name = "monitor-cli")]
#[command(about = "Management CLI for the API monitor", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check monitor health
    Status,
    /// List recorded requests
    Requests(RequestFilters),
    /// List detected problems
    Problems(ProblemFilters),
}

#[derive(Args)]
struct RequestFilters {
    #[arg(long)]
    method: Option<String>,
    #[arg(long)]
    response_code: Option<u16>,
    #[arg(long)]
    min_response_code: Option<u16>,
    #[arg(long)]
    max_response_code: Option<u16>,
    #[arg(long)]
    min_response_time: Option<u64>,
    #[arg(long)]
    max_response_time: Option<u64>,
    /// RFC 3339 timestamp
    #[arg(long)]
    start_date: Option<String>,
    /// RFC 3339 timestamp
    #[arg(long)]
    end_date: Option<String>,
    /// Substring of the path
    #[arg(long)]
    search: Option<String>,
    #[arg(long, value_parser = ["created_at", "response_time"])]
    sort_by: Option<String>,
    #[arg(long, value_parser = ["asc", "desc"])]
    order: Option<String>,
}

impl RequestFilters {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        push(&mut params, "method", &self.method);
        push(&mut params, "response_code", &self.response_code);
        push(&mut params, "min_response_code", &self.min_response_code);
        push(&mut params, "max_response_code", &self.max_response_code);
        push(&mut params, "min_response_time", &self.min_response_time);
        push(&mut params, "max_response_time", &self.max_response_time);
        push(&mut params, "start_date", &self.start_date);
        push(&mut params, "end_date", &self.end_date);
        push(&mut params, "search", &self.search);
        push(&mut params, "sort_by", &self.sort_by);
        push(&mut params, "order", &self.order);
        params
    }
}

#[derive(Args)]
struct ProblemFilters {
    /// error_5xx, error_4xx, rate_limit, slow_response or timeout
    #[arg(long)]
    problem_type: Option<ProblemKind>,
    /// medium, high or critical
    #[arg(long)]
    severity: Option<Severity>,
    #[arg(long, value_parser = ["created_at", "severity"])]
    sort_by: Option<String>,
    #[arg(long, value_parser = ["asc", "desc"])]
    order: Option<String>,
}

impl ProblemFilters {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        push(&mut params, "problem_type", &self.problem_type);
        push(&mut params, "severity", &self.severity);
        push(&mut params, "sort_by", &self.sort_by);
        push(&mut params, "order", &self.order);
        params
    }
}

fn push<T: ToString>(params: &mut Vec<(&'static str, String)>, name: &'static str, value: &Option<T>) {
    if let Some(value) = value {
        params.push((name, value.to_string()));
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Status => client.get(format!("{base}/health")).send().await?,
        Commands::Requests(filters) => {
            client
                .get(format!("{base}/api/requests"))
                .query(&filters.params())
                .send()
                .await?
        }
        Commands::Problems(filters) => {
            client
                .get(format!("{base}/api/problems"))
                .query(&filters.params())
                .send()
                .await?
        }
    };
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: monitor returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
