use anyhow::Context;
use jiff::civil::Date;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::entities::movie;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Genre {
    Action,
    Drama,
    Comedy,
    Thriller,
    #[serde(rename = "Sci-Fi")]
    SciFi,
}

impl Genre {
    pub const ALL: [Genre; 5] =
        [Genre::Action, Genre::Drama, Genre::Comedy, Genre::Thriller, Genre::SciFi];

    pub fn as_str(self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Drama => "Drama",
            Genre::Comedy => "Comedy",
            Genre::Thriller => "Thriller",
            Genre::SciFi => "Sci-Fi",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == s)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub release_date: Date,
    pub genre: Genre,
    pub duration_minutes: i32,
    pub rating: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub release_date: Date,
    pub genre: Genre,
    pub duration_minutes: i32,
    pub rating: Option<f64>,
}

impl Movie {
    pub fn from_new(id: i32, new: NewMovie) -> Self {
        Self {
            id,
            title: new.title,
            release_date: new.release_date,
            genre: new.genre,
            duration_minutes: new.duration_minutes,
            rating: new.rating,
        }
    }
}

impl TryFrom<movie::Model> for Movie {
    type Error = anyhow::Error;

    fn try_from(row: movie::Model) -> anyhow::Result<Self> {
        let release_date = row.release_date.parse::<Date>().with_context(|| {
            format!("movie {} has malformed release_date {:?}", row.id, row.release_date)
        })?;
        let genre = Genre::parse(&row.genre)
            .with_context(|| format!("movie {} has unknown genre {:?}", row.id, row.genre))?;

        Ok(Self {
            id: row.id,
            title: row.title,
            release_date,
            genre,
            duration_minutes: row.duration_minutes,
            rating: row.rating,
        })
    }
}

// Untyped so that a wrong type becomes a field error. `None` is a key the
// client left out; an explicit `null` is kept as `Some(Value::Null)`.
#[derive(Clone, Debug, Default)]
pub struct MovieInput {
    pub title: Option<Value>,
    pub release_date: Option<Value>,
    pub genre: Option<Value>,
    pub duration_minutes: Option<Value>,
    pub rating: Option<Value>,
}

impl From<Map<String, Value>> for MovieInput {
    fn from(mut body: Map<String, Value>) -> Self {
        Self {
            title: body.remove("title"),
            release_date: body.remove("release_date"),
            genre: body.remove("genre"),
            duration_minutes: body.remove("duration_minutes"),
            rating: body.remove("rating"),
        }
    }
}

impl MovieInput {
    pub fn overlay(self, base: &Movie) -> Self {
        Self {
            title: self.title.or_else(|| Some(Value::from(base.title.clone()))),
            release_date: self
                .release_date
                .or_else(|| Some(Value::from(base.release_date.to_string()))),
            genre: self.genre.or_else(|| Some(Value::from(base.genre.as_str()))),
            duration_minutes: self
                .duration_minutes
                .or_else(|| Some(Value::from(base.duration_minutes))),
            rating: self.rating.or_else(|| base.rating.map(Value::from)),
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use serde_json::json;

    use super::*;

    fn arrival() -> Movie {
        Movie {
            id: 7,
            title: "Movie - Arrival".to_string(),
            release_date: date(2016, 11, 11),
            genre: Genre::SciFi,
            duration_minutes: 116,
            rating: Some(8.0),
        }
    }

    #[test]
    fn genre_parse_is_case_sensitive() {
        assert_eq!(Genre::parse("Sci-Fi"), Some(Genre::SciFi));
        assert_eq!(Genre::parse("Drama"), Some(Genre::Drama));
        assert_eq!(Genre::parse("sci-fi"), None);
        assert_eq!(Genre::parse("Horror"), None);
    }

    #[test]
    fn movie_serializes_with_wire_names() {
        let value = serde_json::to_value(arrival()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "title": "Movie - Arrival",
                "release_date": "2016-11-11",
                "genre": "Sci-Fi",
                "duration_minutes": 116,
                "rating": 8.0,
            })
        );
    }

    #[test]
    fn missing_rating_serializes_as_null() {
        let movie = Movie { rating: None, ..arrival() };
        let value = serde_json::to_value(movie).unwrap();
        assert_eq!(value["rating"], Value::Null);
    }

    fn input(body: Value) -> MovieInput {
        MovieInput::from(body.as_object().cloned().unwrap())
    }

    #[test]
    fn overlay_keeps_provided_fields() {
        let merged = input(json!({ "duration_minutes": 120 })).overlay(&arrival());

        assert_eq!(merged.duration_minutes, Some(json!(120)));
        assert_eq!(merged.title, Some(json!("Movie - Arrival")));
        assert_eq!(merged.release_date, Some(json!("2016-11-11")));
        assert_eq!(merged.genre, Some(json!("Sci-Fi")));
        assert_eq!(merged.rating, Some(json!(8.0)));
    }

    #[test]
    fn overlay_keeps_explicit_null() {
        let merged = input(json!({ "rating": null })).overlay(&arrival());
        assert_eq!(merged.rating, Some(Value::Null));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let body = input(json!({ "id": 3, "title": "Movie - Heat", "studio": "Warner" }));
        assert_eq!(body.title, Some(json!("Movie - Heat")));
        assert_eq!(body.genre, None);
    }

    #[test]
    fn row_with_unknown_genre_is_rejected() {
        let row = movie::Model {
            id: 1,
            title: "Movie - Heat".to_string(),
            release_date: "2000-01-01".to_string(),
            genre: "Western".to_string(),
            duration_minutes: 170,
            rating: None,
        };
        assert!(Movie::try_from(row).is_err());
    }
}
