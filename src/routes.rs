use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{AddForm, RateForm},
    templates,
};

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    id: i32,
}

#[derive(Debug, Deserialize)]
pub struct FindQuery {
    id: i64,
}

pub async fn index(State(state): State<Arc<AppState>>) -> AppResult<Html<String>> {
    let movies = state.store.list_all().await?;
    Ok(Html(templates::index_page(&movies)))
}

pub async fn add_form() -> Html<String> {
    Html(templates::add_page(None))
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AddForm>,
) -> AppResult<Html<String>> {
    let title = match form.validate() {
        Ok(title) => title,
        Err(err) => return Ok(Html(templates::add_page(Some(&err.to_string())))),
    };

    match state.tmdb.search_movies(&title).await {
        Ok(candidates) => Ok(Html(templates::select_page(&title, &candidates))),
        Err(err @ AppError::Gateway(_)) => {
            tracing::warn!(title = %title, error = %err, "search failed");
            Ok(Html(templates::add_page(Some(&err.to_string()))))
        },
        Err(err) => Err(err),
    }
}

pub async fn find(
    State(state): State<Arc<AppState>>,
    Query(q): Query<FindQuery>,
) -> AppResult<Redirect> {
    let details = state.tmdb.movie_details(q.id).await?;
    let new_movie = details.into_new_movie(state.tmdb.image_base_url())?;
    let movie = state.store.create(new_movie).await?;

    tracing::info!(id = movie.id, tmdb_id = q.id, title = %movie.title, "added movie");
    Ok(Redirect::to(&format!("/update?id={}", movie.id)))
}

pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    Query(q): Query<IdQuery>,
) -> AppResult<Html<String>> {
    let movie = state.store.get(q.id).await?;
    Ok(Html(templates::edit_page(&movie, None)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Query(q): Query<IdQuery>,
    Form(form): Form<RateForm>,
) -> AppResult<Response> {
    let movie = state.store.get(q.id).await?;

    let rating = match form.validate() {
        Ok(rating) => rating,
        Err(err) => {
            return Ok(Html(templates::edit_page(&movie, Some(&err.to_string()))).into_response());
        },
    };

    state.store.update_rating_review(movie.id, rating.rating, rating.review).await?;
    Ok(Redirect::to("/").into_response())
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Query(q): Query<IdQuery>,
) -> AppResult<Redirect> {
    state.store.delete(q.id).await?;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{db::test_db, models::NewMovie, store::MovieStore, tmdb::TmdbClient};

    async fn app_with_tmdb(token: &str, base_url: &str) -> (Router, MovieStore) {
        let store = MovieStore::new(test_db().await);
        let tmdb = TmdbClient::new(
            wreq::Client::builder().build().unwrap(),
            token.to_string(),
            base_url.to_string(),
            "https://image.tmdb.org/t/p/w500".to_string(),
            "en-US".to_string(),
            100,
        );
        let state = Arc::new(AppState { store: store.clone(), tmdb: Arc::new(tmdb) });
        (crate::router(state), store)
    }

    /// App backed by the offline mock movie database.
    async fn app() -> (Router, MovieStore) {
        app_with_tmdb("", "http://127.0.0.1:1").await
    }

    /// App whose movie database is unreachable.
    async fn app_with_dead_tmdb() -> (Router, MovieStore) {
        app_with_tmdb("token", "http://127.0.0.1:1").await
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(resp: &Response) -> &str {
        resp.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()).unwrap_or_default()
    }

    async fn seed(store: &MovieStore, title: &str, rating: f64) -> i32 {
        let movie = store
            .create(NewMovie {
                title: title.to_string(),
                year: 2010,
                description: String::new(),
                img_url: String::new(),
            })
            .await
            .unwrap();
        store.update_rating_review(movie.id, rating, String::new()).await.unwrap();
        movie.id
    }

    #[tokio::test]
    async fn index_recomputes_rankings() {
        let (app, store) = app().await;
        let a = seed(&store, "A", 9.1).await;
        let b = seed(&store, "B", 7.0).await;
        let c = seed(&store, "C", 8.8).await;

        let resp = app.oneshot(get("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        let pos_a = html.find(">A<").unwrap();
        let pos_c = html.find(">C<").unwrap();
        let pos_b = html.find(">B<").unwrap();
        assert!(pos_a < pos_c && pos_c < pos_b);

        assert_eq!(store.get(a).await.unwrap().ranking, Some(3));
        assert_eq!(store.get(c).await.unwrap().ranking, Some(2));
        assert_eq!(store.get(b).await.unwrap().ranking, Some(1));
    }

    #[tokio::test]
    async fn add_form_renders() {
        let (app, _) = app().await;
        let resp = app.oneshot(get("/add")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("action=\"/add\""));
    }

    #[tokio::test]
    async fn add_shows_search_results() {
        let (app, _) = app().await;
        let resp = app.oneshot(post_form("/add", "title=Fight+Club")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("/find?id=550"));
        assert!(html.contains("Fight Club"));
    }

    #[tokio::test]
    async fn add_with_blank_title_redisplays_form() {
        let (app, _) = app().await;
        let resp = app.oneshot(post_form("/add", "title=++")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("movie title is required"));
        assert!(html.contains("action=\"/add\""));
    }

    #[tokio::test]
    async fn add_recovers_from_gateway_failure() {
        let (app, _) = app_with_dead_tmdb().await;
        let resp = app.oneshot(post_form("/add", "title=Heat")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("movie database request failed"));
        assert!(html.contains("action=\"/add\""));
    }

    #[tokio::test]
    async fn find_creates_movie_and_redirects_to_update() {
        let (app, store) = app().await;
        let resp = app.oneshot(get("/find?id=550")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let target = location(&resp).to_string();
        let id: i32 = target.strip_prefix("/update?id=").unwrap().parse().unwrap();
        let movie = store.get(id).await.unwrap();
        assert_eq!(movie.title, "Fight Club");
        assert_eq!(movie.year, 1999);
        assert!(movie.img_url.starts_with("https://image.tmdb.org/t/p/w500/"));
        assert_eq!(movie.rating, None);
        assert_eq!(movie.review, None);
    }

    #[tokio::test]
    async fn find_with_dead_gateway_is_bad_gateway() {
        let (app, store) = app_with_dead_tmdb().await;
        let resp = app.oneshot(get("/find?id=550")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_form_for_unknown_movie_is_not_found() {
        let (app, _) = app().await;
        let resp = app.oneshot(get("/update?id=42")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_saves_rating_and_review() {
        let (app, store) = app().await;
        let id = seed(&store, "Heat", 5.0).await;

        let resp = app.clone().oneshot(get(&format!("/update?id={id}"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(post_form(&format!("/update?id={id}"), "rating=8.5&review=Tense+and+long"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/");

        let movie = store.get(id).await.unwrap();
        assert_eq!(movie.rating, Some(8.5));
        assert_eq!(movie.review.as_deref(), Some("Tense and long"));
    }

    #[tokio::test]
    async fn update_with_bad_rating_redisplays_form() {
        let (app, store) = app().await;
        let id = seed(&store, "Heat", 5.0).await;

        let resp = app
            .oneshot(post_form(&format!("/update?id={id}"), "rating=great&review=x"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("is not a number"));
        assert_eq!(store.get(id).await.unwrap().rating, Some(5.0));
    }

    #[tokio::test]
    async fn delete_redirects_home_even_for_unknown_ids() {
        let (app, store) = app().await;
        let id = seed(&store, "Heat", 5.0).await;

        let resp = app.clone().oneshot(get(&format!("/delete?id={id}"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/");
        assert!(matches!(store.get(id).await, Err(AppError::NotFound { .. })));

        let resp = app.oneshot(get("/delete?id=9999")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }
}
