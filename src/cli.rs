// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Defines all subcommands and global flags

use crate::config::Overrides;
use crate::util::parse_date;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "maktab")]
#[command(about = "Fetch and summarize profiMaktab school diaries", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (default: $XDG_CONFIG_HOME/maktab/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL
    #[arg(long, global = true, env = "MAKTAB_API_BASE")]
    pub api_base: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Portal login
    #[arg(long, global = true, env = "MAKTAB_USERNAME")]
    pub username: Option<String>,

    /// Portal password
    #[arg(long, global = true, env = "MAKTAB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Student to track (with --username/--password) or to select from config
    #[arg(long, global = true)]
    pub student_id: Option<u64>,

    /// Display name for --student-id
    #[arg(long, global = true)]
    pub student_name: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable throttling between requests
    #[arg(long, global = true)]
    pub no_throttle: bool,

    /// Throttle range in ms (min:max)
    #[arg(long, global = true, value_parser = parse_throttle_range)]
    pub throttle_ms: Option<(u64, u64)>,
}

fn parse_throttle_range(s: &str) -> Result<(u64, u64), String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err("Expected format: min:max".into());
    }

    let min = parts[0].parse().map_err(|_| "Invalid min value")?;
    let max = parts[1].parse().map_err(|_| "Invalid max value")?;

    if min > max {
        return Err("min must be <= max".into());
    }

    Ok((min, max))
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Fetch and print diary summaries for all configured students (default)
    Diary {
        /// Day to fetch (YYYY-MM-DD, default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// List the students visible to a login
    Students,

    /// Print the raw student record
    Student {
        /// Student ID
        id: u64,
    },

    /// Keep summaries fresh; press Enter to refresh immediately
    Watch {
        /// Seconds between scheduled refreshes
        #[arg(long, default_value_t = 3600)]
        interval_secs: u64,
    },
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Diary { date: None })
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            config_path: self.config.clone(),
            api_base: self.api_base.clone(),
            timeout_secs: self.timeout_secs,
            username: self.username.clone(),
            password: self.password.clone(),
            student_id: self.student_id,
            student_name: self.student_name.clone(),
        }
    }

    /// Effective throttle range; `(0, 0)` means off.
    pub fn throttle(&self) -> (u64, u64) {
        if self.no_throttle {
            (0, 0)
        } else {
            self.throttle_ms.unwrap_or((100, 300))
        }
    }
}
