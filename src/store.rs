use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    models::NewMovie,
    ranking::assign_rankings,
};

#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns every movie, best first, after bringing the stored rankings in
    /// line with the current ratings.
    pub async fn list_all(&self) -> AppResult<Vec<movie::Model>> {
        let txn = self.db.begin().await?;

        let mut movies = movie::Entity::find().order_by_asc(movie::Column::Id).all(&txn).await?;
        let stored: HashMap<i32, Option<i32>> = movies.iter().map(|m| (m.id, m.ranking)).collect();

        assign_rankings(&mut movies);

        let mut rewritten = 0usize;
        for m in &movies {
            if stored.get(&m.id) == Some(&m.ranking) {
                continue;
            }
            movie::Entity::update_many()
                .col_expr(movie::Column::Ranking, Expr::value(m.ranking))
                .filter(movie::Column::Id.eq(m.id))
                .exec(&txn)
                .await?;
            rewritten += 1;
        }

        txn.commit().await?;

        tracing::debug!(count = movies.len(), rewritten, "listed movies");
        Ok(movies)
    }

    pub async fn create(&self, new: NewMovie) -> AppResult<movie::Model> {
        if new.title.trim().is_empty() {
            return Err(AppError::validation("movie title is required"));
        }

        let model = movie::ActiveModel {
            id: Default::default(),
            title: Set(new.title),
            year: Set(new.year),
            description: Set(new.description),
            rating: Set(None),
            ranking: Set(None),
            review: Set(None),
            img_url: Set(new.img_url),
        };
        let created = model.insert(&self.db).await?;

        tracing::debug!(id = created.id, title = %created.title, "created movie");
        Ok(created)
    }

    pub async fn get(&self, id: i32) -> AppResult<movie::Model> {
        movie::Entity::find_by_id(id).one(&self.db).await?.ok_or(AppError::NotFound { id })
    }

    /// Overwrites rating and review. Nothing else about the movie changes.
    pub async fn update_rating_review(
        &self,
        id: i32,
        rating: f64,
        review: String,
    ) -> AppResult<movie::Model> {
        let mut active: movie::ActiveModel = self.get(id).await?.into();
        active.rating = Set(Some(rating));
        active.review = Set(Some(review));
        let updated = active.update(&self.db).await?;

        tracing::debug!(id, rating, "rated movie");
        Ok(updated)
    }

    /// Deleting an id that is not stored is not an error.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let res = movie::Entity::delete_by_id(id).exec(&self.db).await?;
        tracing::debug!(id, removed = res.rows_affected, "deleted movie");
        Ok(())
    }

    /// Exact, case-sensitive title match.
    #[allow(dead_code)]
    pub async fn exists_by_title(&self, title: &str) -> AppResult<bool> {
        let count = movie::Entity::find()
            .filter(movie::Column::Title.eq(title))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }
}
