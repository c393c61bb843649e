use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use jiff::civil::Date;
use serde_json::{Map, Value};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{Movie, MovieInput},
};

pub fn router(state: Arc<AppState>) -> Router {
    let collection = get(list_movies).post(create_movie);
    let member = get(get_movie).put(update_movie).patch(patch_movie).delete(delete_movie);

    Router::new()
        .route("/movies", collection.clone())
        .route("/movies/", collection)
        .route("/movies/{id}", member.clone())
        .route("/movies/{id}/", member)
        .with_state(state)
}

pub async fn list_movies(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Movie>>> {
    Ok(Json(state.movies.list().await?))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    payload: MovieBody,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let input = movie_input(payload)?;
    let movie = state.movies.create(&input, today()).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Movie>> {
    Ok(Json(state.movies.get(parse_id(&id)?).await?))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: MovieBody,
) -> AppResult<Json<Movie>> {
    let id = parse_id(&id)?;
    let input = movie_input(payload)?;
    Ok(Json(state.movies.update(id, &input, today()).await?))
}

pub async fn patch_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: MovieBody,
) -> AppResult<Json<Movie>> {
    let id = parse_id(&id)?;
    let input = movie_input(payload)?;
    Ok(Json(state.movies.patch(id, input, today()).await?))
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.movies.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Ids that are not integers name no record.
fn parse_id(raw: &str) -> AppResult<i32> {
    raw.parse().map_err(|_| AppError::NotFound)
}

// Only a JSON object is a movie body; arrays and scalars are rejected here.
pub type MovieBody = Result<Json<Map<String, Value>>, JsonRejection>;

fn movie_input(payload: MovieBody) -> AppResult<MovieInput> {
    let Json(body) = payload?;
    Ok(MovieInput::from(body))
}

fn today() -> Date {
    jiff::Zoned::now().date()
}
