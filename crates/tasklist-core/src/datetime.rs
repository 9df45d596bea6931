use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::anyhow;
use chrono::{
  DateTime,
  Datelike,
  Local,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;
use serde::{
  Deserialize,
  Deserializer,
  Serialize,
  Serializer
};

const TIMEZONE_CONFIG_FILE: &str =
  "tasklist-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "TASKLIST_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "TASKLIST_TIME_CONFIG";

const DISPLAY_DATE_PATTERN: &str =
  r"^([0-9]{2})\.([0-9]{2})\.([0-9]{4})$";
const CANONICAL_DATE_PATTERN: &str =
  r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

/// A real calendar date kept in
/// canonical `YYYY-MM-DD` form.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
pub struct CanonicalDate(NaiveDate);

impl CanonicalDate {
  pub fn from_ymd(
    year: i32,
    month: u32,
    day: u32
  ) -> Option<Self> {
    NaiveDate::from_ymd_opt(
      year, month, day
    )
    .map(Self)
  }

  pub fn from_naive(
    date: NaiveDate
  ) -> Self {
    Self(date)
  }

  #[must_use]
  pub fn as_naive(&self) -> NaiveDate {
    self.0
  }

  /// Renders the date as `DD.MM.YYYY`.
  #[must_use]
  pub fn to_display(&self) -> String {
    format!(
      "{:02}.{:02}.{:04}",
      self.0.day(),
      self.0.month(),
      self.0.year()
    )
  }
}

impl fmt::Display for CanonicalDate {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{:04}-{:02}-{:02}",
      self.0.year(),
      self.0.month(),
      self.0.day()
    )
  }
}

impl FromStr for CanonicalDate {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    parse_canonical_date(s).ok_or_else(
      || {
        anyhow!(
          "not a canonical \
           YYYY-MM-DD calendar date: \
           {s}"
        )
      }
    )
  }
}

impl Serialize for CanonicalDate {
  fn serialize<S>(
    &self,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer
      .serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de>
  for CanonicalDate
{
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    raw
      .parse()
      .map_err(serde::de::Error::custom)
  }
}

fn display_date_regex()
-> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> =
    OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(DISPLAY_DATE_PATTERN)
      .ok()
  })
  .as_ref()
}

fn canonical_date_regex()
-> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> =
    OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(CANONICAL_DATE_PATTERN)
      .ok()
  })
  .as_ref()
}

fn capture_triple(
  re: &Regex,
  input: &str
) -> Option<(String, String, String)> {
  let caps = re.captures(input)?;
  Some((
    caps.get(1)?.as_str().to_string(),
    caps.get(2)?.as_str().to_string(),
    caps.get(3)?.as_str().to_string()
  ))
}

/// Parses a user-entered `DD.MM.YYYY`
/// date. Anything that is not exactly
/// that shape, or that names a day the
/// calendar does not have, yields
/// `None`.
#[tracing::instrument(level = "trace")]
pub fn parse_display_date(
  text: &str
) -> Option<CanonicalDate> {
  let (dd, mm, yyyy) = capture_triple(
    display_date_regex()?,
    text.trim()
  )?;

  let day: u32 = dd.parse().ok()?;
  let month: u32 = mm.parse().ok()?;
  let year: i32 = yyyy.parse().ok()?;

  if !(1..=12).contains(&month) {
    return None;
  }
  if !(1..=31).contains(&day) {
    return None;
  }

  let date = NaiveDate::from_ymd_opt(
    year, month, day
  )?;
  if date.year() != year
    || date.month() != month
    || date.day() != day
  {
    return None;
  }

  Some(CanonicalDate(date))
}

/// Turns `YYYY-MM-DD` into `DD.MM.YYYY`.
/// Only the shape is checked; input of
/// any other shape gives an empty
/// string.
pub fn format_canonical_date(
  text: &str
) -> String {
  let Some(re) = canonical_date_regex()
  else {
    return String::new();
  };
  match capture_triple(re, text.trim())
  {
    | Some((yyyy, mm, dd)) => {
      format!("{dd}.{mm}.{yyyy}")
    }
    | None => String::new()
  }
}

/// Strict `YYYY-MM-DD` parse that also
/// rejects impossible calendar days.
pub fn parse_canonical_date(
  text: &str
) -> Option<CanonicalDate> {
  let (yyyy, mm, dd) = capture_triple(
    canonical_date_regex()?,
    text.trim()
  )?;
  CanonicalDate::from_ymd(
    yyyy.parse().ok()?,
    mm.parse().ok()?,
    dd.parse().ok()?
  )
}

/// True only when `text` is a valid
/// canonical date strictly before
/// `today`.
pub fn is_overdue(
  text: &str,
  today: NaiveDate
) -> bool {
  parse_canonical_date(text)
    .map(|due| due.as_naive() < today)
    .unwrap_or(false)
}

pub fn project_timezone()
-> Option<&'static Tz> {
  static PROJECT_TZ: OnceLock<
    Option<Tz>
  > = OnceLock::new();
  PROJECT_TZ
    .get_or_init(
      resolve_project_timezone
    )
    .as_ref()
}

/// Calendar date of `now` in the
/// project timezone, or in the machine's
/// local zone when none is configured.
#[must_use]
pub fn today_at(
  now: DateTime<Utc>
) -> NaiveDate {
  match project_timezone() {
    | Some(tz) => {
      now.with_timezone(tz).date_naive()
    }
    | None => {
      now
        .with_timezone(&Local)
        .date_naive()
    }
  }
}

#[must_use]
pub fn today() -> NaiveDate {
  today_at(Utc::now())
}

fn resolve_project_timezone()
-> Option<Tz> {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(&raw, TIMEZONE_ENV_VAR)
  {
    return Some(tz);
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return Some(tz);
  }

  tracing::debug!(
    "no project timezone configured; \
     using local time"
  );
  None
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &PathBuf
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  timezone_from_toml(
    &raw,
    &format!("file:{}", path.display())
  )
}

fn timezone_from_toml(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let parsed = match toml::from_str::<
    TimezoneConfig
  >(raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        source,
        error = %err,
        "failed parsing timezone config"
      );
      return None;
    }
  };

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    });
  let Some(timezone) = timezone else {
    tracing::warn!(
      source,
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(&timezone, source)
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured project timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::{
    CanonicalDate,
    format_canonical_date,
    is_overdue,
    parse_canonical_date,
    parse_display_date,
    timezone_from_toml
  };

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn parses_strict_display_date() {
    let parsed =
      parse_display_date("18.02.2025")
        .expect("parse display date");
    assert_eq!(
      parsed.to_string(),
      "2025-02-18"
    );
  }

  #[test]
  fn rejects_other_shapes() {
    for input in [
      "1.2.2025",
      "2025-02-18",
      "",
      "18.02.25",
      "18/02/2025",
      "18.02.2025x",
      "١٨.٠٢.٢٠٢٥"
    ] {
      assert!(
        parse_display_date(input)
          .is_none(),
        "{input:?} should not parse"
      );
    }
  }

  #[test]
  fn surrounding_whitespace_is_ignored()
  {
    assert_eq!(
      parse_display_date(" 01.03.2026 ")
        .map(|d| d.to_string()),
      Some("2026-03-01".to_string())
    );
  }

  #[test]
  fn rejects_impossible_days() {
    assert!(
      parse_display_date("31.02.2025")
        .is_none()
    );
    assert!(
      parse_display_date("00.01.2025")
        .is_none()
    );
    assert!(
      parse_display_date("10.13.2025")
        .is_none()
    );
    assert!(
      parse_display_date("31.04.2025")
        .is_none()
    );
  }

  #[test]
  fn leap_years() {
    assert_eq!(
      parse_display_date("29.02.2024")
        .map(|d| d.to_string()),
      Some("2024-02-29".to_string())
    );
    assert!(
      parse_display_date("29.02.2025")
        .is_none()
    );
    assert!(
      parse_display_date("29.02.1900")
        .is_none()
    );
  }

  #[test]
  fn formats_canonical_shape_only() {
    assert_eq!(
      format_canonical_date(
        "2025-02-18"
      ),
      "18.02.2025"
    );
    assert_eq!(
      format_canonical_date("18.02.2025"),
      ""
    );
    assert_eq!(
      format_canonical_date("2025-2-18"),
      ""
    );
    assert_eq!(format_canonical_date(""), "");
  }

  #[test]
  fn display_and_canonical_agree() {
    let mut day = date(2023, 12, 25);
    let end = date(2024, 3, 5);
    while day <= end {
      let canonical =
        CanonicalDate::from_naive(day)
          .to_string();
      let display =
        format_canonical_date(&canonical);
      assert_eq!(
        parse_display_date(&display)
          .map(|d| d.to_string()),
        Some(canonical)
      );
      day = day
        .succ_opt()
        .expect("next day");
    }
  }

  #[test]
  fn overdue_is_strictly_before_today()
  {
    let today = date(2025, 6, 1);
    assert!(is_overdue(
      "2020-01-01",
      today
    ));
    assert!(!is_overdue(
      "2025-06-01",
      today
    ));
    assert!(!is_overdue(
      "2025-06-02",
      today
    ));
    assert!(!is_overdue(
      "not a date",
      today
    ));
    assert!(!is_overdue(
      "2025-02-30",
      today
    ));
  }

  #[test]
  fn canonical_parse_checks_calendar() {
    assert!(
      parse_canonical_date("2025-02-28")
        .is_some()
    );
    assert!(
      parse_canonical_date("2025-02-29")
        .is_none()
    );
    assert!(
      "2025-02-29"
        .parse::<CanonicalDate>()
        .is_err()
    );
  }

  #[test]
  fn timezone_toml_accepts_both_layouts()
  {
    assert_eq!(
      timezone_from_toml(
        "timezone = \"Europe/Moscow\"",
        "test"
      ),
      Some(chrono_tz::Europe::Moscow)
    );
    assert_eq!(
      timezone_from_toml(
        "[time]\ntimezone = \"UTC\"",
        "test"
      ),
      Some(chrono_tz::UTC)
    );
    assert_eq!(
      timezone_from_toml(
        "timezone = \"Mars/Olympus\"",
        "test"
      ),
      None
    );
  }
}
