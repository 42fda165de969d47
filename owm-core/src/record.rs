//! The most recently fetched forecast and its typed accessors.
//!
//! Every field is kept as the raw string scraped from the payload. Accessors parse on
//! demand; numeric readers return `0` when a value is absent or unparsable.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::{extract::extract_attribute, model::ForecastKind};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Temperature {
    pub value: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub night: Option<String>,
    pub evening: Option<String>,
    pub morning: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Measurement {
    pub value: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Wind {
    pub speed_value: Option<String>,
    pub speed_name: Option<String>,
    pub direction_deg: Option<String>,
    pub direction_code: Option<String>,
    pub direction_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Clouds {
    /// The `value` attribute as delivered: a percentage for current conditions, a
    /// description for forecasts.
    pub value: Option<String>,
    pub name: Option<String>,
    pub all: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Precipitation {
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Condition {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastRecord {
    pub temperature: Temperature,
    pub humidity: Measurement,
    pub pressure: Measurement,
    pub wind: Wind,
    pub clouds: Clouds,
    pub visibility: Option<String>,
    pub precipitation: Precipitation,
    pub condition: Condition,
    /// Timestamp as delivered, e.g. `2020-01-01T13:00:00`, or a bare date for daily
    /// forecasts.
    pub day: Option<String>,
    /// `None` until the first successful fetch.
    pub kind: Option<ForecastKind>,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Day,
    ConditionId,
    ConditionName,
    PrecipitationValue,
    PrecipitationType,
    WindDeg,
    WindCode,
    WindDirectionName,
    WindSpeed,
    WindSpeedName,
    Temperature,
    TemperatureMin,
    TemperatureMax,
    TemperatureNight,
    TemperatureEvening,
    TemperatureMorning,
    TemperatureUnit,
    PressureValue,
    PressureUnit,
    HumidityValue,
    HumidityUnit,
    CloudsValue,
    CloudsName,
    CloudsAll,
    CloudsUnit,
    Visibility,
}

type FieldTable = &'static [(&'static str, &'static str, Field)];

const CURRENT_FIELDS: FieldTable = &[
    ("temperature", "value", Field::Temperature),
    ("temperature", "min", Field::TemperatureMin),
    ("temperature", "max", Field::TemperatureMax),
    ("temperature", "unit", Field::TemperatureUnit),
    ("humidity", "value", Field::HumidityValue),
    ("humidity", "unit", Field::HumidityUnit),
    ("pressure", "value", Field::PressureValue),
    ("pressure", "unit", Field::PressureUnit),
    ("speed", "value", Field::WindSpeed),
    ("speed", "name", Field::WindSpeedName),
    ("direction", "value", Field::WindDeg),
    ("direction", "code", Field::WindCode),
    ("direction", "name", Field::WindDirectionName),
    ("clouds", "value", Field::CloudsValue),
    ("clouds", "value", Field::CloudsAll),
    ("clouds", "name", Field::CloudsName),
    ("visibility", "value", Field::Visibility),
    ("precipitation", "value", Field::PrecipitationValue),
    ("precipitation", "mode", Field::PrecipitationType),
    ("weather", "number", Field::ConditionId),
    ("weather", "value", Field::ConditionName),
    ("lastupdate", "value", Field::Day),
];

// Shared by hourly and daily entries; the timestamp and headline temperature differ.
const ENTRY_FIELDS: FieldTable = &[
    ("symbol", "number", Field::ConditionId),
    ("symbol", "name", Field::ConditionName),
    ("precipitation", "value", Field::PrecipitationValue),
    ("precipitation", "type", Field::PrecipitationType),
    ("windDirection", "deg", Field::WindDeg),
    ("windDirection", "code", Field::WindCode),
    ("windDirection", "name", Field::WindDirectionName),
    ("windSpeed", "mps", Field::WindSpeed),
    ("windSpeed", "name", Field::WindSpeedName),
    ("temperature", "min", Field::TemperatureMin),
    ("temperature", "max", Field::TemperatureMax),
    ("temperature", "night", Field::TemperatureNight),
    ("temperature", "eve", Field::TemperatureEvening),
    ("temperature", "morn", Field::TemperatureMorning),
    ("temperature", "unit", Field::TemperatureUnit),
    ("pressure", "value", Field::PressureValue),
    ("pressure", "unit", Field::PressureUnit),
    ("humidity", "value", Field::HumidityValue),
    ("humidity", "unit", Field::HumidityUnit),
    ("clouds", "value", Field::CloudsValue),
    ("clouds", "value", Field::CloudsName),
    ("clouds", "all", Field::CloudsAll),
    ("clouds", "unit", Field::CloudsUnit),
    ("visibility", "value", Field::Visibility),
];

const HOURLY_FIELDS: FieldTable = &[
    ("time", "from", Field::Day),
    ("temperature", "value", Field::Temperature),
];

const DAILY_FIELDS: FieldTable = &[
    ("time", "day", Field::Day),
    ("temperature", "day", Field::Temperature),
];

impl ForecastRecord {
    /// Builds a record of `kind` by scraping `buffer`, one extraction per field.
    pub fn scrape(kind: ForecastKind, buffer: &str) -> Self {
        let tables: &[FieldTable] = match kind {
            ForecastKind::Current => &[CURRENT_FIELDS],
            ForecastKind::Hourly => &[HOURLY_FIELDS, ENTRY_FIELDS],
            ForecastKind::Daily => &[DAILY_FIELDS, ENTRY_FIELDS],
        };

        let mut record = Self {
            kind: Some(kind),
            ..Self::default()
        };
        for (tag, attribute, field) in tables.iter().flat_map(|table| table.iter()) {
            *record.slot_mut(*field) = extract_attribute(buffer, tag, attribute).map(str::to_owned);
        }
        record
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Day => &mut self.day,
            Field::ConditionId => &mut self.condition.id,
            Field::ConditionName => &mut self.condition.name,
            Field::PrecipitationValue => &mut self.precipitation.value,
            Field::PrecipitationType => &mut self.precipitation.kind,
            Field::WindDeg => &mut self.wind.direction_deg,
            Field::WindCode => &mut self.wind.direction_code,
            Field::WindDirectionName => &mut self.wind.direction_name,
            Field::WindSpeed => &mut self.wind.speed_value,
            Field::WindSpeedName => &mut self.wind.speed_name,
            Field::Temperature => &mut self.temperature.value,
            Field::TemperatureMin => &mut self.temperature.min,
            Field::TemperatureMax => &mut self.temperature.max,
            Field::TemperatureNight => &mut self.temperature.night,
            Field::TemperatureEvening => &mut self.temperature.evening,
            Field::TemperatureMorning => &mut self.temperature.morning,
            Field::TemperatureUnit => &mut self.temperature.unit,
            Field::PressureValue => &mut self.pressure.value,
            Field::PressureUnit => &mut self.pressure.unit,
            Field::HumidityValue => &mut self.humidity.value,
            Field::HumidityUnit => &mut self.humidity.unit,
            Field::CloudsValue => &mut self.clouds.value,
            Field::CloudsName => &mut self.clouds.name,
            Field::CloudsAll => &mut self.clouds.all,
            Field::CloudsUnit => &mut self.clouds.unit,
            Field::Visibility => &mut self.visibility,
        }
    }

    pub fn kind(&self) -> Option<ForecastKind> {
        self.kind
    }

    pub fn temperature(&self) -> f32 {
        parse_float(&self.temperature.value)
    }

    pub fn min_temperature(&self) -> f32 {
        parse_float(&self.temperature.min)
    }

    pub fn max_temperature(&self) -> f32 {
        parse_float(&self.temperature.max)
    }

    pub fn night_temperature(&self) -> f32 {
        parse_float(&self.temperature.night)
    }

    pub fn evening_temperature(&self) -> f32 {
        parse_float(&self.temperature.evening)
    }

    pub fn morning_temperature(&self) -> f32 {
        parse_float(&self.temperature.morning)
    }

    pub fn temperature_unit(&self) -> Option<&str> {
        self.temperature.unit.as_deref()
    }

    pub fn humidity(&self) -> u32 {
        parse_int(&self.humidity.value).try_into().unwrap_or(0)
    }

    pub fn humidity_unit(&self) -> Option<&str> {
        self.humidity.unit.as_deref()
    }

    pub fn pressure(&self) -> f32 {
        parse_float(&self.pressure.value)
    }

    pub fn pressure_unit(&self) -> Option<&str> {
        self.pressure.unit.as_deref()
    }

    pub fn wind_speed(&self) -> f32 {
        parse_float(&self.wind.speed_value)
    }

    /// Descriptive speed, e.g. "Gentle Breeze".
    pub fn wind_name(&self) -> Option<&str> {
        self.wind.speed_name.as_deref()
    }

    /// Compass code, e.g. "WSW".
    pub fn wind_direction(&self) -> Option<&str> {
        self.wind.direction_code.as_deref()
    }

    pub fn wind_direction_degrees(&self) -> f32 {
        parse_float(&self.wind.direction_deg)
    }

    pub fn wind_direction_name(&self) -> Option<&str> {
        self.wind.direction_name.as_deref()
    }

    /// Cloud cover in percent.
    pub fn clouds(&self) -> u32 {
        parse_int(&self.clouds.all).try_into().unwrap_or(0)
    }

    pub fn clouds_name(&self) -> Option<&str> {
        self.clouds.name.as_deref()
    }

    pub fn clouds_unit(&self) -> Option<&str> {
        self.clouds.unit.as_deref()
    }

    pub fn visibility(&self) -> f32 {
        parse_float(&self.visibility)
    }

    pub fn precipitation_value(&self) -> f32 {
        parse_float(&self.precipitation.value)
    }

    /// `None` when the payload reports no precipitation ("no") or omits it.
    pub fn precipitation_type(&self) -> Option<&str> {
        match self.precipitation.kind.as_deref() {
            None | Some("") | Some("no") => None,
            Some(kind) => Some(kind),
        }
    }

    pub fn condition_id(&self) -> i32 {
        parse_int(&self.condition.id)
    }

    pub fn condition_name(&self) -> Option<&str> {
        self.condition.name.as_deref()
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.day.as_deref()
    }

    /// Date part of the timestamp. A timestamp without a `T` is all date.
    pub fn date(&self) -> Option<&str> {
        let day = self.day.as_deref()?;
        Some(day.split_once('T').map_or(day, |(date, _)| date))
    }

    /// Time-of-day part of the timestamp. Daily records carry none.
    pub fn time(&self) -> Option<&str> {
        if self.kind == Some(ForecastKind::Daily) {
            return None;
        }
        self.day.as_deref()?.split_once('T').map(|(_, time)| time)
    }

    /// The timestamp as a date-time; daily dates resolve to midnight.
    pub fn observed_at(&self) -> Option<NaiveDateTime> {
        let day = self.day.as_deref()?;
        NaiveDateTime::parse_from_str(day, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .or_else(|| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0))
    }
}

fn parse_float(raw: &Option<String>) -> f32 {
    raw.as_deref().and_then(|s| s.trim().parse().ok()).unwrap_or(0.0)
}

// Leading integer, so "77.5" reads as 77.
fn parse_int(raw: &Option<String>) -> i32 {
    let Some(s) = raw.as_deref().map(str::trim) else {
        return 0;
    };
    let end = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().unwrap_or(0)
}

impl fmt::Display for ForecastRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show(v: &Option<String>) -> &str {
            v.as_deref().unwrap_or("-")
        }

        let rule = "=".repeat(53);
        writeln!(f, "{rule}")?;
        writeln!(f, "kind: {}", self.kind.map_or("-", |k| k.as_str()))?;
        writeln!(f, "day: {}", show(&self.day))?;
        writeln!(f, "condition: {} ({})", show(&self.condition.name), show(&self.condition.id))?;
        writeln!(
            f,
            "temperature: {} {} (min {}, max {})",
            show(&self.temperature.value),
            show(&self.temperature.unit),
            show(&self.temperature.min),
            show(&self.temperature.max),
        )?;
        if self.kind != Some(ForecastKind::Current) {
            writeln!(
                f,
                "temperature morn/eve/night: {} / {} / {}",
                show(&self.temperature.morning),
                show(&self.temperature.evening),
                show(&self.temperature.night),
            )?;
        }
        writeln!(f, "humidity: {} {}", show(&self.humidity.value), show(&self.humidity.unit))?;
        writeln!(f, "pressure: {} {}", show(&self.pressure.value), show(&self.pressure.unit))?;
        writeln!(
            f,
            "wind: {} ({}), {} deg {} ({})",
            show(&self.wind.speed_value),
            show(&self.wind.speed_name),
            show(&self.wind.direction_deg),
            show(&self.wind.direction_code),
            show(&self.wind.direction_name),
        )?;
        writeln!(
            f,
            "clouds: {} {} ({})",
            show(&self.clouds.all),
            show(&self.clouds.unit),
            show(&self.clouds.name),
        )?;
        writeln!(
            f,
            "precipitation: {} ({})",
            show(&self.precipitation.value),
            show(&self.precipitation.kind),
        )?;
        writeln!(f, "visibility: {}", show(&self.visibility))?;
        write!(f, "{rule}")
    }
}
