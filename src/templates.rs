use maud::{DOCTYPE, Markup, html};

use crate::{entities::movie, models::SearchCandidate};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";
const TMDB_THUMB_BASE: &str = "https://image.tmdb.org/t/p/w92";

pub fn index_page(movies: &[movie::Model]) -> String {
    page(
        "My Top Movies",
        html! {
            div class="min-h-screen bg-gray-50" {
                div class="max-w-4xl mx-auto px-6 py-12" {
                    div class="flex items-start justify-between gap-6" {
                        div {
                            h1 class="text-3xl font-bold text-gray-900" { "My Top Movies" }
                            p class="mt-2 text-gray-600" { "Ranked by your own ratings." }
                        }
                        a class="rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700" href="/add" { "Add Movie" }
                    }

                    @if movies.is_empty() {
                        div class="mt-10 bg-white shadow rounded-lg p-8" {
                            p class="text-gray-600" { "No movies yet." }
                        }
                    } @else {
                        div class="mt-10 space-y-4" {
                            @for movie in movies {
                                (movie_card(movie))
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn add_page(error: Option<&str>) -> String {
    page(
        "Add Movie",
        html! {
            div class="min-h-screen bg-gray-50" {
                div class="max-w-2xl mx-auto px-6 py-12" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-3xl font-bold text-gray-900" { "Add a Movie" }
                        (error_banner(error))

                        form class="mt-8 space-y-6" method="post" action="/add" {
                            div {
                                label class="block text-sm font-medium text-gray-700" for="title" { "Movie Title" }
                                input class="mt-2 w-full rounded-md border border-gray-300 px-3 py-2 focus:border-blue-500 focus:outline-none focus:ring-1 focus:ring-blue-500" name="title" id="title" required;
                            }
                            button class="w-full rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700" type="submit" { "Add Movie" }
                        }
                    }
                }
            }
        },
    )
}

pub fn select_page(query: &str, candidates: &[SearchCandidate]) -> String {
    page(
        "Select Movie",
        html! {
            div class="min-h-screen bg-gray-50" {
                div class="max-w-2xl mx-auto px-6 py-12" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-3xl font-bold text-gray-900" { "Select Movie" }
                        p class="mt-2 text-gray-600" { "Results for \"" (query) "\"" }

                        @if candidates.is_empty() {
                            p class="mt-6 text-gray-600" { "Nothing matched." }
                        } @else {
                            ul class="mt-6 divide-y divide-gray-200" {
                                @for candidate in candidates {
                                    li class="flex items-center gap-4 py-3" {
                                        @if let Some(poster) = &candidate.poster_path {
                                            img class="h-16 w-11 rounded object-cover" src=(format!("{TMDB_THUMB_BASE}{poster}")) alt="";
                                        }
                                        a class="text-blue-600 hover:text-blue-800" href=(format!("/find?id={}", candidate.id)) {
                                            (candidate.title)
                                            @if let Some(year) = candidate.year_label() {
                                                span class="ml-2 text-gray-500" { "(" (year) ")" }
                                            }
                                        }
                                    }
                                }
                            }
                        }

                        a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/add" { "Search again" }
                    }
                }
            }
        },
    )
}

pub fn edit_page(movie: &movie::Model, error: Option<&str>) -> String {
    let rating = movie.rating.map(|r| r.to_string()).unwrap_or_default();
    let review = movie.review.clone().unwrap_or_default();

    page(
        "Rate Movie",
        html! {
            div class="min-h-screen bg-gray-50" {
                div class="max-w-2xl mx-auto px-6 py-12" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-3xl font-bold text-gray-900" { (movie.title) }
                        p class="mt-2 text-gray-600" { "Edit Movie Rating" }
                        (error_banner(error))

                        form class="mt-8 space-y-6" method="post" action=(format!("/update?id={}", movie.id)) {
                            div {
                                label class="block text-sm font-medium text-gray-700" for="rating" { "Your Rating Out of 10" }
                                input class="mt-2 w-full rounded-md border border-gray-300 px-3 py-2" name="rating" id="rating" value=(rating) required;
                            }
                            div {
                                label class="block text-sm font-medium text-gray-700" for="review" { "Your Review" }
                                input class="mt-2 w-full rounded-md border border-gray-300 px-3 py-2" name="review" id="review" value=(review);
                            }
                            button class="w-full rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700" type="submit" { "Done" }
                        }
                    }
                }
            }
        },
    )
}

pub fn error_page(message: String) -> String {
    page(
        "Error",
        html! {
            div class="min-h-screen bg-gray-50 flex items-center justify-center" {
                div class="max-w-xl w-full px-6" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-2xl font-bold text-gray-900" { "Error" }
                        p class="mt-4 text-gray-700" { (message) }
                        a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Back" }
                    }
                }
            }
        },
    )
}

fn page(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
            }
            body { (body) }
        }
    }
    .into_string()
}

fn error_banner(error: Option<&str>) -> Markup {
    html! {
        @if let Some(error) = error {
            p class="mt-4 rounded-md bg-red-50 px-3 py-2 text-sm text-red-700" { (error) }
        }
    }
}

fn movie_card(movie: &movie::Model) -> Markup {
    html! {
        div class="bg-white shadow rounded-lg p-6 flex gap-6" {
            @if !movie.img_url.is_empty() {
                img class="h-36 w-24 rounded object-cover" src=(movie.img_url) alt=(movie.title);
            }
            div class="flex-1" {
                div class="flex items-start justify-between gap-4" {
                    h2 class="text-xl font-semibold text-gray-900" {
                        @if let Some(ranking) = movie.ranking {
                            span class="mr-2 text-gray-400" { "#" (ranking) }
                        }
                        (movie.title)
                        span class="ml-2 font-normal text-gray-500" { "(" (movie.year) ")" }
                    }
                    span class="text-lg font-semibold text-amber-600" {
                        @match movie.rating {
                            Some(rating) => { (format!("{rating:.1}")) },
                            None => { "unrated" },
                        }
                    }
                }
                p class="mt-2 text-sm text-gray-700" { (movie.description) }
                @if let Some(review) = &movie.review {
                    p class="mt-2 text-sm italic text-gray-600" { (review) }
                }
                div class="mt-4 flex gap-4 text-sm" {
                    a class="text-blue-600 hover:text-blue-800" href=(format!("/update?id={}", movie.id)) { "Update" }
                    a class="text-red-600 hover:text-red-800" href=(format!("/delete?id={}", movie.id)) { "Delete" }
                }
            }
        }
    }
}
