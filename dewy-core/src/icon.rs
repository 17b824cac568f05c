/// Local icon for an OpenWeather icon code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherIcon {
    Sunny,
    Moon,
    FewCloudsDay,
    FewCloudsNight,
    ScatteredClouds,
    BrokenClouds,
    Rain,
    Thunderstorm,
    Snow,
    Mist,
    Unknown,
}

impl WeatherIcon {
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("01d") => Self::Sunny,
            Some("01n") => Self::Moon,
            Some("02d") => Self::FewCloudsDay,
            Some("02n") => Self::FewCloudsNight,
            Some("03d" | "03n") => Self::ScatteredClouds,
            Some("04d" | "04n") => Self::BrokenClouds,
            Some("09d" | "09n" | "10d" | "10n") => Self::Rain,
            Some("11d" | "11n") => Self::Thunderstorm,
            Some("13d" | "13n") => Self::Snow,
            Some("50d" | "50n") => Self::Mist,
            _ => Self::Unknown,
        }
    }

    /// Resource name of the bundled icon.
    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Moon => "moon",
            Self::FewCloudsDay => "few_clouds_day",
            Self::FewCloudsNight => "few_clouds_night",
            Self::ScatteredClouds => "scattered_clouds",
            Self::BrokenClouds => "broken_clouds",
            Self::Rain => "rain",
            Self::Thunderstorm => "thunderstorm",
            Self::Snow => "snow",
            Self::Mist => "mist",
            Self::Unknown => "unknown",
        }
    }
}
