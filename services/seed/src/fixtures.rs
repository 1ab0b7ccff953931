//! Demo catalog data

use api::models::movie::{Movie, NewMovie};
use api::models::user::{UserMovie, WatchStatus};
use rand::Rng;
use uuid::Uuid;

pub const DEMO_EMAIL: &str = "demo@cinematicverse.com";
pub const DEMO_PASSWORD: &str = "DemoPassword123!";
pub const DEMO_USERNAME: &str = "DemoUser";

/// A catalog entry inserted by the seed
#[derive(Debug, Clone, Copy)]
pub struct SampleMovie {
    pub title: &'static str,
    pub genre: &'static str,
    pub year: i32,
    pub director: &'static str,
    pub poster_url: &'static str,
    pub rating: f64,
    pub tmdb_id: i64,
}

impl SampleMovie {
    pub fn to_new_movie(&self) -> NewMovie {
        NewMovie {
            title: self.title.to_string(),
            genre: Some(self.genre.to_string()),
            year: Some(self.year),
            director: Some(self.director.to_string()),
            poster_url: Some(self.poster_url.to_string()),
            rating: Some(self.rating),
            tmdb_id: Some(self.tmdb_id),
        }
    }
}

pub const SAMPLE_MOVIES: [SampleMovie; 10] = [
    SampleMovie {
        title: "Inception",
        genre: "Sci-Fi",
        year: 2010,
        director: "Christopher Nolan",
        poster_url: "https://image.tmdb.org/t/p/w500/9gk7adHYeDvHkCSEqAvQNLV5Ber.jpg",
        rating: 8.8,
        tmdb_id: 27205,
    },
    SampleMovie {
        title: "The Dark Knight",
        genre: "Action",
        year: 2008,
        director: "Christopher Nolan",
        poster_url: "https://image.tmdb.org/t/p/w500/qJ2tW6WMUDux911r6m7haRef0WH.jpg",
        rating: 9.0,
        tmdb_id: 155,
    },
    SampleMovie {
        title: "Interstellar",
        genre: "Sci-Fi",
        year: 2014,
        director: "Christopher Nolan",
        poster_url: "https://image.tmdb.org/t/p/w500/gEU2QniE6E77NI6lCU6MxlNBvIx.jpg",
        rating: 8.6,
        tmdb_id: 157336,
    },
    SampleMovie {
        title: "Pulp Fiction",
        genre: "Crime",
        year: 1994,
        director: "Quentin Tarantino",
        poster_url: "https://image.tmdb.org/t/p/w500/d5iIlFn5s0ImszYzBPb8JPIfbXD.jpg",
        rating: 8.9,
        tmdb_id: 680,
    },
    SampleMovie {
        title: "The Matrix",
        genre: "Sci-Fi",
        year: 1999,
        director: "Lana Wachowski, Lilly Wachowski",
        poster_url: "https://image.tmdb.org/t/p/w500/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg",
        rating: 8.7,
        tmdb_id: 603,
    },
    SampleMovie {
        title: "Forrest Gump",
        genre: "Drama",
        year: 1994,
        director: "Robert Zemeckis",
        poster_url: "https://image.tmdb.org/t/p/w500/arw2vcBveWOVZr6pxd9XTd1TdQa.jpg",
        rating: 8.8,
        tmdb_id: 13,
    },
    SampleMovie {
        title: "The Shawshank Redemption",
        genre: "Drama",
        year: 1994,
        director: "Frank Darabont",
        poster_url: "https://image.tmdb.org/t/p/w500/q6y0Go1tsGEsmtFryDOJo3dEmqu.jpg",
        rating: 9.3,
        tmdb_id: 278,
    },
    SampleMovie {
        title: "Fight Club",
        genre: "Drama",
        year: 1999,
        director: "David Fincher",
        poster_url: "https://image.tmdb.org/t/p/w500/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg",
        rating: 8.4,
        tmdb_id: 550,
    },
    SampleMovie {
        title: "Gladiator",
        genre: "Action",
        year: 2000,
        director: "Ridley Scott",
        poster_url: "https://image.tmdb.org/t/p/w500/ty8TGRuvJLPUmAR1H1nRIsgwvim.jpg",
        rating: 8.5,
        tmdb_id: 98,
    },
    SampleMovie {
        title: "The Godfather",
        genre: "Crime",
        year: 1972,
        director: "Francis Ford Coppola",
        poster_url: "https://image.tmdb.org/t/p/w500/3bhkrj58Vtu7enYsRolD1fZdja1.jpg",
        rating: 9.2,
        tmdb_id: 238,
    },
];

/// List status of the `index`-th seeded movie: watched, pending, favorite, repeat
pub fn status_for(index: usize) -> WatchStatus {
    WatchStatus::ALL[index % WatchStatus::ALL.len()]
}

/// Personal rating between 7.0 and 10.0 with one decimal
pub fn random_user_rating<R: Rng>(rng: &mut R) -> f64 {
    (rng.gen_range(7.0..=10.0_f64) * 10.0).round() / 10.0
}

/// One list entry per movie, cycling through the statuses
pub fn plan_user_movies<R: Rng>(user_id: Uuid, movies: &[Movie], rng: &mut R) -> Vec<UserMovie> {
    movies
        .iter()
        .enumerate()
        .map(|(index, movie)| {
            UserMovie::new(user_id, movie.id, status_for(index)).with_rating(random_user_rating(rng))
        })
        .collect()
}
