//! Sample data for local development, used by the `seed` binary.

use rand_core::RngCore;
use uuid::Uuid;

use crate::{
    models::{Campground, Image, NewCampground, Point},
    repository::{Repository, RepositoryError},
};

pub const DESCRIPTORS: &[&str] = &[
    "Forest",
    "Ancient",
    "Petrified",
    "Roaring",
    "Cascade",
    "Tumbling",
    "Silent",
    "Redwood",
    "Bullfrog",
    "Maple",
    "Misty",
    "Elk",
    "Grizzly",
    "Ocean",
    "Sea",
    "Sky",
    "Dusty",
    "Diamond",
];

pub const PLACES: &[&str] = &[
    "Flats",
    "Village",
    "Canyon",
    "Pond",
    "Group Camp",
    "Horse Camp",
    "Ghost Town",
    "Camp",
    "Dispersed Camp",
    "Backcountry",
    "River",
    "Creek",
    "Creekside",
    "Bay",
    "Spring",
    "Bayshore",
    "Sands",
    "Mule Camp",
    "Hunting Camp",
    "Cliffs",
    "Hollow",
];

pub struct City {
    pub city: &'static str,
    pub state: &'static str,
    pub longitude: f64,
    pub latitude: f64,
}

pub const CITIES: &[City] = &[
    City {
        city: "New York",
        state: "New York",
        longitude: -74.0059413,
        latitude: 40.7127837,
    },
    City {
        city: "Los Angeles",
        state: "California",
        longitude: -118.2436849,
        latitude: 34.0522342,
    },
    City {
        city: "Chicago",
        state: "Illinois",
        longitude: -87.6297982,
        latitude: 41.8781136,
    },
    City {
        city: "Houston",
        state: "Texas",
        longitude: -95.3698028,
        latitude: 29.7604267,
    },
    City {
        city: "Phoenix",
        state: "Arizona",
        longitude: -112.0740373,
        latitude: 33.4483771,
    },
    City {
        city: "Philadelphia",
        state: "Pennsylvania",
        longitude: -75.1652215,
        latitude: 39.9525839,
    },
    City {
        city: "San Antonio",
        state: "Texas",
        longitude: -98.4936282,
        latitude: 29.4241219,
    },
    City {
        city: "San Diego",
        state: "California",
        longitude: -117.1610838,
        latitude: 32.715738,
    },
    City {
        city: "Dallas",
        state: "Texas",
        longitude: -96.7969879,
        latitude: 32.7766642,
    },
    City {
        city: "San Jose",
        state: "California",
        longitude: -121.8863286,
        latitude: 37.3382082,
    },
    City {
        city: "Austin",
        state: "Texas",
        longitude: -97.7430608,
        latitude: 30.267153,
    },
    City {
        city: "Jacksonville",
        state: "Florida",
        longitude: -81.655651,
        latitude: 30.3321838,
    },
    City {
        city: "Denver",
        state: "Colorado",
        longitude: -104.990251,
        latitude: 39.7392358,
    },
    City {
        city: "Seattle",
        state: "Washington",
        longitude: -122.3320708,
        latitude: 47.6062095,
    },
    City {
        city: "Nashville",
        state: "Tennessee",
        longitude: -86.7816016,
        latitude: 36.1626638,
    },
    City {
        city: "Portland",
        state: "Oregon",
        longitude: -122.6764816,
        latitude: 45.5230622,
    },
    City {
        city: "Boise",
        state: "Idaho",
        longitude: -116.2023137,
        latitude: 43.6150186,
    },
    City {
        city: "Salt Lake City",
        state: "Utah",
        longitude: -111.8910474,
        latitude: 40.7607793,
    },
    City {
        city: "Bozeman",
        state: "Montana",
        longitude: -111.0429339,
        latitude: 45.6769979,
    },
    City {
        city: "Flagstaff",
        state: "Arizona",
        longitude: -111.6512954,
        latitude: 35.1982836,
    },
];

const DESCRIPTION: &str = "Lorem ipsum, dolor sit amet consectetur adipisicing elit. Minima \
    praesentium explicabo eius repellendus voluptatum odio ut quis eos iusto hic, amet ratione \
    exercitationem assumenda ullam, ab dignissimos. Amet, eos ratione.";

fn sample_images() -> Vec<Image> {
    vec![
        Image {
            url: "https://images.unsplash.com/photo-1504280390367-361c6d9f38f4".to_string(),
            filename: "campgrounds/seed-tents-at-dusk".to_string(),
        },
        Image {
            url: "https://images.unsplash.com/photo-1487730116645-74489c95b41b".to_string(),
            filename: "campgrounds/seed-lakeside-camp".to_string(),
        },
    ]
}

fn pick<'a, T>(rng: &mut impl RngCore, items: &'a [T]) -> &'a T {
    &items[rng.next_u32() as usize % items.len()]
}

/// sample_campground
///
/// One random listing: "<descriptor> <place>" in a real city, priced 10..=29.
pub fn sample_campground(rng: &mut impl RngCore, author_id: Uuid) -> NewCampground {
    let city = pick(rng, CITIES);
    let title = format!("{} {}", pick(rng, DESCRIPTORS), pick(rng, PLACES));
    let price = f64::from(rng.next_u32() % 20 + 10);

    NewCampground {
        title,
        price,
        description: DESCRIPTION.to_string(),
        location: format!("{}, {}", city.city, city.state),
        geometry: Point {
            longitude: city.longitude,
            latitude: city.latitude,
        },
        images: sample_images(),
        author_id,
    }
}

/// seed_campgrounds
///
/// Inserts `count` random campgrounds authored by `author_id`.
pub async fn seed_campgrounds(
    repo: &dyn Repository,
    rng: &mut (impl RngCore + Send),
    author_id: Uuid,
    count: usize,
) -> Result<Vec<Campground>, RepositoryError> {
    let mut created = Vec::with_capacity(count);
    for _ in 0..count {
        created.push(repo.create_campground(sample_campground(rng, author_id)).await?);
    }
    Ok(created)
}
