use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Select, Text};
use owm_core::{Config, ForecastRecord, Location, OpenWeather, Units};
use tracing::debug;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "owm", version, about = "OpenWeatherMap XML client")]
pub struct Cli {
    /// Verbosity level (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Unit system for this request, overriding the configured one.
    #[arg(long, global = true)]
    pub units: Option<Units>,

    /// Print records as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key and default units.
    Configure,

    /// Show current conditions.
    Current {
        /// "<lat>,<lon>", a numeric city id, or a city name such as "London,uk".
        #[arg(allow_hyphen_values = true)]
        location: Location,
    },

    /// Show the three-hourly forecast.
    Hourly {
        #[arg(allow_hyphen_values = true)]
        location: Location,

        /// Number of three-hour steps to request.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },

    /// Show the daily forecast (up to 10 days).
    Daily {
        #[arg(allow_hyphen_values = true)]
        location: Location,

        /// Number of days to request.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        let mut settings = config.client_settings();
        if let Some(units) = self.units {
            settings.units = units;
        }
        debug!(
            host = %settings.host,
            port = settings.port,
            units = %settings.units,
            "client configured"
        );
        let mut weather = OpenWeather::new(settings);

        match self.command {
            Command::Configure => configure(&mut config)?,
            Command::Current { location } => {
                let record = weather
                    .fetch_current(&location)
                    .await
                    .with_context(|| format!("Failed to fetch current weather for {location}"))?;
                print_records(std::slice::from_ref(record), self.json)?;
            }
            Command::Hourly { location, count } => {
                weather
                    .fetch_hourly(&location, count)
                    .await
                    .with_context(|| format!("Failed to fetch hourly forecast for {location}"))?;
                print_records(weather.entries(), self.json)?;
            }
            Command::Daily { location, count } => {
                weather
                    .fetch_daily(&location, count)
                    .await
                    .with_context(|| format!("Failed to fetch daily forecast for {location}"))?;
                print_records(weather.entries(), self.json)?;
            }
        }

        Ok(())
    }
}

fn configure(config: &mut Config) -> anyhow::Result<()> {
    let api_key = Text::new("OpenWeatherMap API key:")
        .with_initial_value(config.api_key.as_deref().unwrap_or_default())
        .with_help_message("Leave empty to send requests without an APPID")
        .prompt()?;
    config.set_api_key(&api_key);

    let cursor = Units::all().iter().position(|u| *u == config.units).unwrap_or_default();
    config.units = Select::new("Unit system:", Units::all().to_vec())
        .with_starting_cursor(cursor)
        .prompt()?;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

fn print_records(records: &[ForecastRecord], json: bool) -> anyhow::Result<()> {
    if json {
        let out = serde_json::to_string_pretty(records).context("Failed to serialize records")?;
        println!("{out}");
    } else {
        for record in records {
            println!("{record}");
        }
    }
    Ok(())
}
