use jiff::civil::Date;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use tracing::info;

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    models::{Movie, MovieInput, NewMovie},
    validation::{self, FieldErrors, TITLE_NOT_UNIQUE, TitleLookup},
};

#[derive(Clone)]
pub struct MovieRepository {
    db: DatabaseConnection,
}

impl MovieRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<Movie>> {
        let rows = movie::Entity::find().order_by_asc(movie::Column::Id).all(&self.db).await?;
        rows.into_iter().map(|row| Movie::try_from(row).map_err(AppError::from)).collect()
    }

    pub async fn get(&self, id: i32) -> AppResult<Movie> {
        Ok(Movie::try_from(self.find_row(id).await?)?)
    }

    pub async fn create(&self, input: &MovieInput, today: Date) -> AppResult<Movie> {
        let new = validation::validate(input, today, self, None).await?;

        let row = movie::ActiveModel {
            id: Default::default(),
            title: Set(new.title.clone()),
            release_date: Set(new.release_date.to_string()),
            genre: Set(new.genre.as_str().to_string()),
            duration_minutes: Set(new.duration_minutes),
            rating: Set(new.rating),
        }
        .insert(&self.db)
        .await
        .map_err(title_conflict)?;

        info!(id = row.id, title = %row.title, "movie created");
        Ok(Movie::from_new(row.id, new))
    }

    pub async fn update(&self, id: i32, input: &MovieInput, today: Date) -> AppResult<Movie> {
        let row = self.find_row(id).await?;
        self.replace(row, input, today).await
    }

    pub async fn patch(&self, id: i32, input: MovieInput, today: Date) -> AppResult<Movie> {
        let row = self.find_row(id).await?;
        let current = Movie::try_from(row.clone())?;
        let merged = input.overlay(&current);
        self.replace(row, &merged, today).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let res = movie::Entity::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        info!(id, "movie deleted");
        Ok(())
    }

    async fn find_row(&self, id: i32) -> AppResult<movie::Model> {
        movie::Entity::find_by_id(id).one(&self.db).await?.ok_or(AppError::NotFound)
    }

    async fn replace(
        &self,
        row: movie::Model,
        input: &MovieInput,
        today: Date,
    ) -> AppResult<Movie> {
        let id = row.id;
        let new: NewMovie = validation::validate(input, today, self, Some(id)).await?;

        let mut active: movie::ActiveModel = row.into();
        active.title = Set(new.title.clone());
        active.release_date = Set(new.release_date.to_string());
        active.genre = Set(new.genre.as_str().to_string());
        active.duration_minutes = Set(new.duration_minutes);
        active.rating = Set(new.rating);

        match active.update(&self.db).await {
            Ok(_) => {},
            // Deleted between the lookup and the write.
            Err(DbErr::RecordNotUpdated) => return Err(AppError::NotFound),
            Err(err) => return Err(title_conflict(err)),
        }

        info!(id, "movie updated");
        Ok(Movie::from_new(id, new))
    }
}

impl TitleLookup for MovieRepository {
    async fn exists_with_title(&self, title: &str, excluding: Option<i32>) -> AppResult<bool> {
        let mut query = movie::Entity::find().filter(movie::Column::Title.eq(title));
        if let Some(id) = excluding {
            query = query.filter(movie::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }
}

// The unique index catches writers that raced past the read-side check.
fn title_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Validation(FieldErrors::single("title", TITLE_NOT_UNIQUE))
        },
        _ => err.into(),
    }
}
