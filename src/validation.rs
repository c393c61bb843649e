use std::{collections::BTreeMap, fmt, future::Future};

use jiff::{Span, civil::Date};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{AppError, AppResult},
    models::{Genre, MovieInput, NewMovie},
};

pub const TITLE_PREFIX: &str = "Movie - ";
pub const TITLE_MIN_CHARS: usize = 10;
pub const TITLE_MAX_CHARS: usize = 108;
pub const DURATION_MIN: i64 = 1;
pub const DURATION_MAX: i64 = 600;
pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 10.0;
pub const MAX_AGE_YEARS: i64 = 30;

pub const TITLE_REQUIRED: &str = "Title field is required.";
pub const TITLE_NOT_STRING: &str = "Not a valid string.";
pub const TITLE_PREFIX_MISSING: &str = "Title must start with 'Movie - '";
pub const TITLE_NOT_UNIQUE: &str = "Title must be unique.";
pub const TITLE_TOO_SHORT: &str =
    "Title should have a minimum length of 2 characters after the prefix 'Movie - '.";
pub const TITLE_TOO_LONG: &str =
    "Title should have a maximum length of 100 characters after the prefix 'Movie - '.";
pub const RELEASE_DATE_REQUIRED: &str = "Release date field is required.";
pub const RELEASE_DATE_INVALID: &str = "Invalid release date format.";
pub const RELEASE_DATE_FUTURE: &str = "Release date cannot be in the future.";
pub const RELEASE_DATE_TOO_OLD: &str = "Release date cannot be more than 30 years ago.";
pub const GENRE_REQUIRED: &str = "Genre is required.";
pub const GENRE_INVALID: &str =
    "Invalid genre. Choose from Action, Drama, Comedy, Thriller, or Sci-Fi.";
pub const DURATION_REQUIRED: &str = "Duration is required.";
pub const DURATION_NOT_INTEGER: &str = "A valid integer is required.";
pub const DURATION_TOO_SHORT: &str = "Duration must be at least 1 minute.";
pub const DURATION_TOO_LONG: &str = "Duration must be at most 600 minutes.";
pub const RATING_NOT_NUMBER: &str = "A valid number is required.";
pub const RATING_OUT_OF_RANGE: &str = "Rating must be between 0.0 and 10.0.";

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, &'static str>);

impl FieldErrors {
    pub fn single(field: &'static str, message: &'static str) -> Self {
        let mut errors = Self::default();
        errors.insert(field, message);
        errors
    }

    // First message per field wins.
    pub fn insert(&mut self, field: &'static str, message: &'static str) {
        self.0.entry(field).or_insert(message);
    }

    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().copied().collect();
        f.write_str(&fields.join(", "))
    }
}

pub trait TitleLookup {
    fn exists_with_title(
        &self,
        title: &str,
        excluding: Option<i32>,
    ) -> impl Future<Output = AppResult<bool>> + Send;
}

pub async fn validate<L>(
    input: &MovieInput,
    today: Date,
    lookup: &L,
    excluding: Option<i32>,
) -> AppResult<NewMovie>
where
    L: TitleLookup + Sync,
{
    let mut errors = FieldErrors::default();

    let mut title = check_title(input.title.as_ref());
    if let Ok(candidate) = &title {
        if lookup.exists_with_title(candidate, excluding).await? {
            title = Err(TITLE_NOT_UNIQUE);
        }
    }
    let title =
        keep(&mut errors, "title", title.and_then(|t| check_title_length(&t).map(|()| t)));
    let release_date =
        keep(&mut errors, "release_date", check_release_date(input.release_date.as_ref(), today));
    let genre = keep(&mut errors, "genre", check_genre(input.genre.as_ref()));
    let duration_minutes =
        keep(&mut errors, "duration_minutes", check_duration(input.duration_minutes.as_ref()));
    let rating = keep(&mut errors, "rating", check_rating(input.rating.as_ref()));

    match (title, release_date, genre, duration_minutes, rating) {
        (Some(title), Some(release_date), Some(genre), Some(duration_minutes), Some(rating)) => {
            Ok(NewMovie { title, release_date, genre, duration_minutes, rating })
        },
        _ => {
            debug!(fields = %errors, "candidate rejected");
            Err(AppError::Validation(errors))
        },
    }
}

fn keep<T>(
    errors: &mut FieldErrors,
    field: &'static str,
    result: Result<T, &'static str>,
) -> Option<T> {
    result.map_err(|message| errors.insert(field, message)).ok()
}

pub fn check_title(raw: Option<&Value>) -> Result<String, &'static str> {
    let text = match raw {
        None | Some(Value::Null) => return Err(TITLE_REQUIRED),
        Some(Value::String(s)) => s.clone(),
        // Numbers are taken in their text form, like any other title.
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => return Err(TITLE_NOT_STRING),
    };
    let title = text.trim();
    if title.is_empty() {
        return Err(TITLE_REQUIRED);
    }
    if !title.starts_with(TITLE_PREFIX) {
        return Err(TITLE_PREFIX_MISSING);
    }
    Ok(title.to_string())
}

pub fn check_title_length(title: &str) -> Result<(), &'static str> {
    let len = title.chars().count();
    if len < TITLE_MIN_CHARS {
        return Err(TITLE_TOO_SHORT);
    }
    if len > TITLE_MAX_CHARS {
        return Err(TITLE_TOO_LONG);
    }
    Ok(())
}

pub fn check_release_date(raw: Option<&Value>, today: Date) -> Result<Date, &'static str> {
    let text = match raw {
        None | Some(Value::Null) => return Err(RELEASE_DATE_REQUIRED),
        Some(Value::String(s)) => s.trim(),
        Some(_) => return Err(RELEASE_DATE_INVALID),
    };
    if text.is_empty() {
        return Err(RELEASE_DATE_REQUIRED);
    }

    let date = Date::strptime("%Y-%m-%d", text).map_err(|_| RELEASE_DATE_INVALID)?;
    if date > today {
        return Err(RELEASE_DATE_FUTURE);
    }
    if date < oldest_release_date(today) {
        return Err(RELEASE_DATE_TOO_OLD);
    }
    Ok(date)
}

// 29 February lands on 28 February.
pub fn oldest_release_date(today: Date) -> Date {
    today.saturating_sub(Span::new().years(MAX_AGE_YEARS))
}

pub fn check_genre(raw: Option<&Value>) -> Result<Genre, &'static str> {
    match raw {
        None | Some(Value::Null) => Err(GENRE_REQUIRED),
        Some(Value::String(s)) if s.is_empty() => Err(GENRE_REQUIRED),
        Some(Value::String(s)) => Genre::parse(s).ok_or(GENRE_INVALID),
        Some(_) => Err(GENRE_INVALID),
    }
}

pub fn check_duration(raw: Option<&Value>) -> Result<i32, &'static str> {
    let minutes = match raw {
        None | Some(Value::Null) => return Err(DURATION_REQUIRED),
        Some(Value::String(s)) if s.trim().is_empty() => return Err(DURATION_REQUIRED),
        Some(value) => as_integer(value).ok_or(DURATION_NOT_INTEGER)?,
    };
    if minutes < DURATION_MIN {
        return Err(DURATION_TOO_SHORT);
    }
    if minutes > DURATION_MAX {
        return Err(DURATION_TOO_LONG);
    }
    i32::try_from(minutes).map_err(|_| DURATION_NOT_INTEGER)
}

fn as_integer(value: &Value) -> Option<i64> {
    let integral = |f: f64| (f.is_finite() && f.fract() == 0.0).then_some(f as i64);
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().and_then(integral))
        },
        _ => None,
    }
}

pub fn check_rating(raw: Option<&Value>) -> Result<Option<f64>, &'static str> {
    let rating = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    let rating = rating.filter(|r| r.is_finite()).ok_or(RATING_NOT_NUMBER)?;
    if !(RATING_MIN..=RATING_MAX).contains(&rating) {
        return Err(RATING_OUT_OF_RANGE);
    }
    Ok(Some(rating))
}
