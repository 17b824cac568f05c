use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use dewy_core::{
    Config, Coordinates, DeviceServices, FetchCoordinator, LocationRefreshFlow, OpenWeatherSource,
    PostalCode, RefreshOutcome, Units,
};
use inquire::{Password, Select, Text};

use crate::{
    render::spawn_renderer,
    terminal::{FixedLocation, PromptPermissions, TerminalNotifier},
};

const FETCH_FAILED_MESSAGE: &str = "Problem getting weather data. Please check your ZIP code.";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "dewy", version, about = "Weather by ZIP code or location")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store an OpenWeather API key, preferred units and a default ZIP code.
    Configure,

    /// Current conditions for a ZIP code.
    Current {
        /// Falls back to `default_zip` from the config file.
        zip: Option<String>,
    },

    /// Daily forecast for a ZIP code.
    Forecast { zip: Option<String> },

    /// Current conditions, then the forecast if that succeeded.
    Show { zip: Option<String> },

    /// Current conditions for a latitude/longitude pair.
    Coords {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },

    /// Run the location refresh and print the resulting notification.
    Locate {
        /// Latitude reported as the device fix; omit both to simulate no fix.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Treat both permissions as already granted.
        #[arg(long, short)]
        yes: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        if let Command::Configure = self.command {
            return configure();
        }

        let config = Config::load()?;
        let source = OpenWeatherSource::from_config(&config)?;
        let coordinator = FetchCoordinator::new(Arc::new(source));
        let renderer = spawn_renderer(coordinator.state(), config.units);

        // Let the renderer drain before the failure (if any) reaches `main`.
        let outcome = execute(self.command, &config, &coordinator).await;
        finish(coordinator, renderer).await?;
        outcome
    }
}

async fn execute(
    command: Command,
    config: &Config,
    coordinator: &FetchCoordinator,
) -> anyhow::Result<()> {
    match command {
        Command::Configure => Ok(()),
        Command::Current { zip } => {
            let code = resolve_zip(config, zip.as_deref())?;
            coordinator
                .fetch_current_by_postal_code(&code)
                .await
                .map_err(|_| anyhow!(FETCH_FAILED_MESSAGE))
        }
        Command::Forecast { zip } => {
            let code = resolve_zip(config, zip.as_deref())?;
            coordinator
                .fetch_forecast_by_postal_code(&code)
                .await
                .map_err(|_| anyhow!(FETCH_FAILED_MESSAGE))
        }
        Command::Show { zip } => {
            let code = resolve_zip(config, zip.as_deref())?;
            coordinator
                .fetch_current_by_postal_code(&code)
                .await
                .map_err(|_| anyhow!(FETCH_FAILED_MESSAGE))?;
            coordinator
                .fetch_forecast_by_postal_code(&code)
                .await
                .map_err(|_| anyhow!("Problem getting forecast data."))
        }
        Command::Coords { lat, lon } => coordinator
            .fetch_current_by_coordinates(lat, lon)
            .await
            .map(drop)
            .map_err(|_| anyhow!("Problem getting weather data for ({lat}, {lon}).")),
        Command::Locate { lat, lon, yes } => {
            let fix = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
            let permissions = if yes {
                PromptPermissions::pre_granted()
            } else {
                PromptPermissions::default()
            };
            let device = DeviceServices {
                permissions: Arc::new(permissions),
                location: Arc::new(FixedLocation(fix)),
                notifications: Arc::new(TerminalNotifier),
            };

            let flow = LocationRefreshFlow::new(coordinator.clone(), device)
                .with_units(config.units)
                .with_fix_timeout(config.location_timeout());

            // The flow itself stays silent; only the exit status reports a missed notification.
            match flow.trigger().await {
                RefreshOutcome::Shown(_) => Ok(()),
                outcome => {
                    tracing::debug!(?outcome, "location refresh posted nothing");
                    Err(anyhow!("No location notification was posted."))
                }
            }
        }
    }
}

/// Drop the last state handle so the renderer drains and exits.
async fn finish(
    coordinator: FetchCoordinator,
    renderer: tokio::task::JoinHandle<()>,
) -> anyhow::Result<()> {
    drop(coordinator);
    renderer.await.context("Renderer task failed")?;
    Ok(())
}

/// The ZIP given on the command line, or the configured default, validated.
fn resolve_zip(config: &Config, explicit: Option<&str>) -> anyhow::Result<PostalCode> {
    let zip = config.zip_or_default(explicit)?;
    Ok(PostalCode::parse(zip)?)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let units = Select::new(
        "Units:",
        vec![Units::Imperial, Units::Metric, Units::Standard],
    )
    .prompt()
    .context("Failed to read units")?;

    let default_zip = Text::new("Default ZIP code (leave empty for none):")
        .with_initial_value(config.default_zip.as_deref().unwrap_or_default())
        .prompt()
        .context("Failed to read default ZIP code")?;
    let default_zip = match default_zip.trim() {
        "" => None,
        zip => Some(PostalCode::parse(zip)?.to_string()),
    };

    config.set_api_key(api_key.trim().to_string());
    config.units = units;
    config.default_zip = default_zip;
    config.save()?;

    println!(
        "Saved configuration to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use dewy_core::{CurrentConditions, ForecastSet, SourceError, WeatherSource};

    use super::*;

    /// Source that records the postal codes it was asked for and always fails.
    #[derive(Default)]
    struct Offline {
        asked: Mutex<Vec<String>>,
    }

    impl Offline {
        fn record(&self, code: &PostalCode) -> SourceError {
            if let Ok(mut asked) = self.asked.lock() {
                asked.push(code.to_string());
            }
            SourceError::Empty { endpoint: "offline" }
        }
    }

    #[async_trait]
    impl WeatherSource for Offline {
        async fn current_by_postal_code(
            &self,
            code: &PostalCode,
        ) -> Result<CurrentConditions, SourceError> {
            Err(self.record(code))
        }

        async fn forecast_by_postal_code(
            &self,
            code: &PostalCode,
        ) -> Result<ForecastSet, SourceError> {
            Err(self.record(code))
        }

        async fn current_by_coordinates(
            &self,
            _coordinates: Coordinates,
        ) -> Result<CurrentConditions, SourceError> {
            Err(SourceError::Empty { endpoint: "offline" })
        }
    }

    fn offline_coordinator() -> (Arc<Offline>, FetchCoordinator) {
        let source = Arc::new(Offline::default());
        let coordinator = FetchCoordinator::new(Arc::clone(&source) as Arc<dyn WeatherSource>);
        (source, coordinator)
    }

    #[test]
    fn parses_negative_coordinates() {
        let cli = Cli::try_parse_from(["dewy", "coords", "44.2950", "-93.2688"]).expect("parse");
        match cli.command {
            Command::Coords { lat, lon } => {
                assert_eq!(lat, 44.2950);
                assert_eq!(lon, -93.2688);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn locate_requires_both_coordinates() {
        assert!(Cli::try_parse_from(["dewy", "locate", "--lat", "44.29"]).is_err());
        assert!(
            Cli::try_parse_from(["dewy", "locate", "--lat", "44.29", "--lon", "-93.26", "-y"])
                .is_ok()
        );
        assert!(Cli::try_parse_from(["dewy", "locate"]).is_ok());
    }

    #[test]
    fn zip_argument_is_optional() {
        let cli = Cli::try_parse_from(["dewy", "current"]).expect("parse");
        assert!(matches!(cli.command, Command::Current { zip: None }));
    }

    #[test]
    fn resolve_zip_rejects_short_codes() {
        let config = Config::default();

        let err = resolve_zip(&config, Some("5502")).unwrap_err();
        assert_eq!(err.to_string(), "Zip code must be 5 digits.");
        assert_eq!(
            resolve_zip(&config, Some("55021")).expect("zip").to_string(),
            "55021"
        );
    }

    #[test]
    fn resolve_zip_falls_back_to_configured_default() {
        let mut config = Config::default();
        assert!(resolve_zip(&config, None).is_err());

        config.default_zip = Some("55057".into());
        assert_eq!(resolve_zip(&config, None).expect("zip").to_string(), "55057");
    }

    #[tokio::test]
    async fn failed_fetch_is_reported_as_error() {
        let (_, coordinator) = offline_coordinator();
        let command = Command::Current {
            zip: Some("55021".into()),
        };

        let err = execute(command, &Config::default(), &coordinator)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), FETCH_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn invalid_zip_is_reported_without_fetching() {
        let (source, coordinator) = offline_coordinator();
        let command = Command::Forecast {
            zip: Some("abc".into()),
        };

        assert!(
            execute(command, &Config::default(), &coordinator)
                .await
                .is_err()
        );
        assert!(source.asked.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn show_without_zip_uses_default() {
        let (source, coordinator) = offline_coordinator();
        let mut config = Config::default();
        config.default_zip = Some("55021".into());

        let result = execute(Command::Show { zip: None }, &config, &coordinator).await;

        assert!(result.is_err());
        // Current conditions failed, so the forecast is never requested.
        assert_eq!(*source.asked.lock().expect("lock"), vec!["55021".to_string()]);
    }

    #[tokio::test]
    async fn invalid_coordinates_are_reported_as_error() {
        let (_, coordinator) = offline_coordinator();

        let result = execute(
            Command::Coords {
                lat: 91.0,
                lon: 0.0,
            },
            &Config::default(),
            &coordinator,
        )
        .await;
        assert!(result.is_err());
    }
}
