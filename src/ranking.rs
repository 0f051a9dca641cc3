use std::cmp::Ordering;

use crate::entities::movie;

/// Sorts `movies` by rating, best first, and numbers them so the best movie
/// gets `movies.len()` and the worst gets 1.
///
/// The sort is stable: equal ratings keep their incoming order. Unrated movies
/// go after every rated one.
pub fn assign_rankings(movies: &mut [movie::Model]) {
    movies.sort_by(|a, b| by_rating_desc(a.rating, b.rating));

    let total = movies.len();
    for (position, movie) in movies.iter_mut().enumerate() {
        movie.ranking = Some((total - position) as i32);
    }
}

fn by_rating_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
