use std::{fmt::Display, sync::Arc};

use chrono::{DateTime, Local, TimeZone, Utc};
use dewy_core::{CurrentConditions, ForecastSet, Units, WeatherIcon, WeatherState};
use tokio::task::JoinHandle;

/// Print every state change until the state holder is dropped.
pub fn spawn_renderer(state: Arc<WeatherState>, units: Units) -> JoinHandle<()> {
    let mut current = state.subscribe_current();
    let mut forecast = state.subscribe_forecast();
    drop(state);

    tokio::spawn(async move {
        let (mut current_open, mut forecast_open) = (true, true);
        loop {
            tokio::select! {
                res = current.changed(), if current_open => match res {
                    Ok(()) => {
                        if let Some(c) = current.borrow_and_update().clone() {
                            println!("{}", current_text(&c, units, &Local));
                        }
                    }
                    Err(_) => current_open = false,
                },
                res = forecast.changed(), if forecast_open => match res {
                    Ok(()) => {
                        if let Some(f) = forecast.borrow_and_update().clone() {
                            println!("{}", forecast_text(&f, units, &Local));
                        }
                    }
                    Err(_) => forecast_open = false,
                },
                else => break,
            }
        }
    })
}

pub fn current_text<Tz>(c: &CurrentConditions, units: Units, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let suffix = units.temperature_suffix();
    let primary = c.primary_condition();
    let icon = WeatherIcon::from_code(primary.map(|w| w.icon.as_str()));
    let description = primary.map(|w| w.description.as_str()).unwrap_or("Unknown");

    let mut out = format!(
        "{}, {}\n  {:.0}{suffix} [{}] {}\n  Feels like {:.0}{suffix}  Low {:.0}{suffix}  High {:.0}{suffix}\n  Humidity {}%  Pressure {} hPa\n  Wind {:.1} at {}°",
        c.name,
        c.sys.country,
        c.main.temp,
        icon.resource_name(),
        description,
        c.main.feels_like,
        c.main.temp_min,
        c.main.temp_max,
        c.main.humidity,
        c.main.pressure,
        c.wind.speed,
        c.wind.deg,
    );
    if let Some(gust) = c.wind.gust {
        out.push_str(&format!(", gusts {gust:.1}"));
    }
    out.push_str(&format!(
        "\n  Sunrise {}  Sunset {}",
        format_clock(c.sunrise(), tz),
        format_clock(c.sunset(), tz)
    ));
    out
}

pub fn forecast_text<Tz>(f: &ForecastSet, units: Units, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let suffix = units.temperature_suffix();
    let mut out = format!("{}-day forecast for {}, {}", f.cnt, f.city.name, f.city.country);

    for day in &f.list {
        let description = day
            .weather
            .first()
            .map(|w| w.description.as_str())
            .unwrap_or("Unknown");
        out.push_str(&format!(
            "\n  {}  {:.0}{suffix}  ({:.0}/{:.0})  {}",
            day_of_week(day.timestamp(), tz),
            day.temp.day,
            day.temp.min,
            day.temp.max,
            description,
        ));
    }
    out
}

/// `hh:mm AM/PM` in `tz`.
pub fn format_clock<Tz>(at: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format_in(at, tz, "%I:%M %p")
}

/// Abbreviated weekday (`Mon`, `Tue`, ...) in `tz`.
pub fn day_of_week<Tz>(at: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format_in(at, tz, "%a")
}

/// `--` stands in for timestamps chrono can't represent.
fn format_in<Tz>(at: Option<DateTime<Utc>>, tz: &Tz, fmt: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.map(|t| t.with_timezone(tz).format(fmt).to_string())
        .unwrap_or_else(|| "--".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dewy_core::model::{
        City, ConditionDescriptor, DailyForecast, DailyTemperature, epoch_to_utc,
    };

    #[test]
    fn clock_uses_twelve_hour_format() {
        // 2024-06-11 10:00:00 UTC
        assert_eq!(format_clock(epoch_to_utc(1_718_100_000), &Utc), "10:00 AM");
        // 2024-06-12 01:16:40 UTC
        assert_eq!(format_clock(epoch_to_utc(1_718_155_000), &Utc), "01:16 AM");
    }

    #[test]
    fn weekday_is_abbreviated() {
        assert_eq!(day_of_week(epoch_to_utc(0), &Utc), "Thu");
        assert_eq!(day_of_week(epoch_to_utc(86_400 * 4), &Utc), "Mon");
    }

    #[test]
    fn out_of_range_timestamp_renders_placeholder() {
        assert_eq!(format_clock(epoch_to_utc(i64::MAX), &Utc), "--");
    }

    #[test]
    fn forecast_rows_use_day_timestamps() {
        let day = |dt, temp: f64, weather: Vec<ConditionDescriptor>| DailyForecast {
            dt,
            temp: DailyTemperature {
                day: temp,
                min: temp - 10.0,
                max: temp + 8.0,
            },
            weather,
        };
        let set = ForecastSet {
            city: City {
                name: "Faribault".into(),
                country: "US".into(),
            },
            cnt: 2,
            list: vec![
                day(
                    0,
                    70.0,
                    vec![ConditionDescriptor {
                        description: "light rain".into(),
                        icon: "10d".into(),
                    }],
                ),
                day(86_400, 65.0, Vec::new()),
            ],
        };

        let text = forecast_text(&set, Units::Imperial, &Utc);
        assert!(text.starts_with("2-day forecast for Faribault, US"));
        assert!(text.contains("Thu  70°F  (60/78)  light rain"));
        assert!(text.contains("Fri  65°F  (55/73)  Unknown"));
    }
}
