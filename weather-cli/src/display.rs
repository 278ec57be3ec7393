//! Human-friendly output formatting.

use weather_core::{StoredRecord, WeatherRecord, model::UNKNOWN};

const SCREEN_WIDTH: usize = 60;
const TABLE_WIDTH: usize = 90;
const DISPLAY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Error,
    Warning,
}

impl MessageKind {
    fn symbol(self) -> &'static str {
        match self {
            MessageKind::Info => "[i]",
            MessageKind::Success => "[✓]",
            MessageKind::Error => "[✗]",
            MessageKind::Warning => "[!]",
        }
    }
}

pub fn message(kind: MessageKind, text: impl AsRef<str>) {
    println!("\n{} {}", kind.symbol(), text.as_ref());
}

pub fn header(title: &str) -> String {
    let rule = "=".repeat(SCREEN_WIDTH);
    format!("\n{rule}\n{title:^SCREEN_WIDTH$}\n{rule}")
}

pub fn weather_report(record: &WeatherRecord) -> String {
    let rule = "=".repeat(SCREEN_WIDTH);
    let humidity = record.humidity_percent.map_or("N/A".to_string(), |h| format!("{h}%"));
    let pressure = record.pressure_hpa.map_or("N/A".to_string(), |p| format!("{p} hPa"));

    format!(
        "\n{rule}\nCURRENT WEATHER REPORT\n{rule}\n\
         Location:        {}, {}\n\
         Temperature:     {:.1}°C\n\
         Humidity:        {humidity}\n\
         Pressure:        {pressure}\n\
         Weather:         {}\n\
         Wind Speed:      {} m/s\n\
         Observed:        {}",
        record.city,
        record.country,
        record.temperature_celsius,
        title_case(&record.condition_description),
        record.wind_speed_mps,
        record.timestamp(),
    )
}

pub fn history_table(records: &[StoredRecord], title: &str) -> String {
    if records.is_empty() {
        return "\nNo logs available.".to_string();
    }

    let rule = "=".repeat(TABLE_WIDTH);
    let mut out = format!("\n{rule}\n{title:^TABLE_WIDTH$}\n{rule}\n");
    out.push_str(&format!(
        "{:<4} {:<20} {:<20} {:<10} {:<12} {:<20}\n",
        "No.", "Date/Time", "City", "Temp(°C)", "Humidity(%)", "Condition"
    ));
    out.push_str(&"-".repeat(TABLE_WIDTH));
    out.push('\n');

    for (i, stored) in records.iter().enumerate() {
        let record = &stored.record;
        let humidity = record.humidity_percent.map_or("N/A".to_string(), |h| h.to_string());
        out.push_str(&format!(
            "{:<4} {:<20} {:<20} {:<10.1} {:<12} {:<20}\n",
            i + 1,
            record.observed_at.format(DISPLAY_DATE_FORMAT).to_string(),
            truncate(&location(record), 19),
            record.temperature_celsius,
            humidity,
            truncate(&record.condition_description, 20),
        ));
    }

    out.push_str(&format!("{rule}\nTotal Records: {}", records.len()));
    out
}

pub fn city_list(cities: &[String]) -> String {
    if cities.is_empty() {
        return "\nNo cities recorded yet.".to_string();
    }

    let mut out = header("RECORDED CITIES");
    for city in cities {
        out.push_str(&format!("\n  - {city}"));
    }
    out.push_str(&format!("\n\nTotal Cities: {}", cities.len()));
    out
}

/// `City, CC`, or just the city when the country is unknown.
fn location(record: &WeatherRecord) -> String {
    if record.country.is_empty() || record.country == UNKNOWN {
        record.city.clone()
    } else {
        format!("{}, {}", record.city, record.country)
    }
}

/// Shorten to at most `max` characters, ending in "..." when cut.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 { format!("{bytes} B") } else { format!("{size:.1} {}", UNITS[unit]) }
}
