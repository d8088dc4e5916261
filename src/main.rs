use chrono::Local;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};
use vahan_scrap::{info_time, process::Crawler, request::DashboardClient, CrawlConfig, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let start_time = Local::now();
    let config = CrawlConfig::default();
    let client = DashboardClient::connect(&config.url, &config.category_filter).await?;
    let reports = Crawler::new(client, config).run().await?;

    for report in &reports {
        match &report.outcome {
            Ok(path) => info_time!(
                "{}: {} records, {} anomalies -> {}",
                report.year,
                report.records,
                report.anomalies.len(),
                path.display()
            ),
            Err(err) => error!(year = report.year, "no output: {err}"),
        }
    }

    let failed = reports.iter().filter(|r| !r.success()).count();
    info_time!(start_time, "Full program time, {} of {} years failed:", failed, reports.len());

    Ok(())
}
