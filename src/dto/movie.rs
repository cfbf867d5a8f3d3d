//! Boundary validation of movie payloads coming from clients.
//!
//! Clients forward items straight from the metadata provider, so both its
//! snake_case field names and camelCase ones are accepted. Required fields
//! reject the whole payload; optional fields are dropped when invalid.

use serde::Deserialize;
use serde_json::Value;
use time::{Date, macros::format_description};
use utoipa::ToSchema;

use crate::{
    dto::validation::{contains_markup, normalize_text, strip_tags},
    state::{
        errors::RoomError,
        room::{MediaType, Movie},
    },
};

/// Longest accepted movie id.
pub const MOVIE_ID_MAX_CHARS: usize = 64;
/// Longest accepted title.
pub const TITLE_MAX_CHARS: usize = 200;
const IMAGE_PATH_MAX_CHARS: usize = 200;
const MAX_RATING: f64 = 10.0;

/// Raw movie object as sent by a client.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovieInput {
    /// Provider id, string or integer.
    pub id: Option<Value>,
    /// Movie title.
    pub title: Option<Value>,
    /// Title field used by providers for shows.
    pub name: Option<Value>,
    /// Synopsis; markup is stripped.
    pub overview: Option<Value>,
    /// Relative poster path.
    #[serde(alias = "poster_path")]
    pub poster_path: Option<Value>,
    /// Relative backdrop path.
    #[serde(alias = "backdrop_path")]
    pub backdrop_path: Option<Value>,
    /// Release date as `YYYY-MM-DD`.
    #[serde(alias = "release_date")]
    pub release_date: Option<Value>,
    /// Release date field used by providers for shows.
    #[serde(alias = "first_air_date")]
    pub first_air_date: Option<Value>,
    /// Rating between 0 and 10.
    #[serde(alias = "vote_average")]
    pub vote_average: Option<Value>,
    /// `movie` or `tv`.
    #[serde(alias = "media_type")]
    pub media_type: Option<Value>,
}

impl MovieInput {
    /// Validate and normalise into a [`Movie`], truncating the overview to `overview_max_chars`.
    pub fn into_movie(self, overview_max_chars: usize) -> Result<Movie, RoomError> {
        let id = match &self.id {
            Some(value) => normalize_movie_id(value)?,
            None => return Err(RoomError::InvalidMovie("id is required".into())),
        };
        let title = parse_title(self.title.as_ref().or(self.name.as_ref()))?;

        Ok(Movie {
            id,
            title,
            overview: self
                .overview
                .as_ref()
                .and_then(|value| parse_overview(value, overview_max_chars)),
            poster_path: self.poster_path.as_ref().and_then(parse_image_path),
            backdrop_path: self.backdrop_path.as_ref().and_then(parse_image_path),
            release_date: self
                .release_date
                .as_ref()
                .and_then(parse_release_date)
                .or_else(|| self.first_air_date.as_ref().and_then(parse_release_date)),
            vote_average: self.vote_average.as_ref().and_then(parse_rating),
            media_type: self.media_type.as_ref().and_then(parse_media_type),
        })
    }
}

/// Accept a string or integer id and return its canonical string form.
pub fn normalize_movie_id(value: &Value) -> Result<String, RoomError> {
    let id = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) if number.is_i64() || number.is_u64() => number.to_string(),
        _ => {
            return Err(RoomError::InvalidMovie(
                "id must be a string or an integer".into(),
            ));
        }
    };

    if id.is_empty() {
        return Err(RoomError::InvalidMovie("id must not be empty".into()));
    }
    if id.chars().count() > MOVIE_ID_MAX_CHARS {
        return Err(RoomError::InvalidMovie(format!(
            "id must be at most {MOVIE_ID_MAX_CHARS} characters"
        )));
    }
    if contains_markup(&id) || id.chars().any(char::is_control) {
        return Err(RoomError::InvalidMovie("id contains invalid characters".into()));
    }
    Ok(id)
}

fn parse_title(value: Option<&Value>) -> Result<String, RoomError> {
    let Some(Value::String(raw)) = value else {
        return Err(RoomError::InvalidMovie("title is required".into()));
    };
    if contains_markup(raw) {
        return Err(RoomError::InvalidMovie("title must not contain markup".into()));
    }

    let title = normalize_text(raw);
    match title.chars().count() {
        0 => Err(RoomError::InvalidMovie("title must not be empty".into())),
        n if n > TITLE_MAX_CHARS => Err(RoomError::InvalidMovie(format!(
            "title must be at most {TITLE_MAX_CHARS} characters"
        ))),
        _ => Ok(title),
    }
}

fn parse_overview(value: &Value, max_chars: usize) -> Option<String> {
    let raw = value.as_str()?;
    let text = normalize_text(&strip_tags(raw));
    if text.is_empty() || contains_markup(&text) {
        return None;
    }
    Some(text.chars().take(max_chars).collect())
}

fn parse_image_path(value: &Value) -> Option<String> {
    let path = value.as_str()?.trim();
    let rest = path.strip_prefix('/')?;
    let valid = path.len() <= IMAGE_PATH_MAX_CHARS
        && !rest.is_empty()
        && rest
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    valid.then(|| path.to_string())
}

fn parse_release_date(value: &Value) -> Option<String> {
    let raw = value.as_str()?.trim();
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(raw, &format).ok().map(|_| raw.to_string())
}

fn parse_rating(value: &Value) -> Option<f64> {
    let rating = value.as_f64()?;
    (rating.is_finite() && (0.0..=MAX_RATING).contains(&rating)).then_some(rating)
}

fn parse_media_type(value: &Value) -> Option<MediaType> {
    match value.as_str()?.trim() {
        "movie" => Some(MediaType::Movie),
        "tv" => Some(MediaType::Tv),
        _ => None,
    }
}
