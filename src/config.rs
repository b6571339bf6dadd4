use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Runtime settings. Flags fall back to `DASHBOARD_*` environment
/// variables, which may come from a `.env` file.
#[derive(Debug, Clone, Parser)]
#[command(name = "dashboardd")]
#[command(about = "Student performance dashboard API", long_about = None)]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "DASHBOARD_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// SQLite database holding students and subject scores
    #[arg(long, env = "DASHBOARD_DATABASE", default_value = "student_dashboard.db")]
    pub database: PathBuf,

    /// CSV file the analytics routes read on every request
    #[arg(long, env = "DASHBOARD_DATASET", default_value = "data/student_data.csv")]
    pub dataset: PathBuf,
}
