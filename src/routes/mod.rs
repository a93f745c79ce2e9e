/// Router Module Index
///
/// Splits the route table by resource. Access control is declared next to each route as an
/// ordered guard list (see `guards`), so reading a route line tells you exactly what must
/// hold before its handler runs.

/// Listings and their nested reviews.
pub mod campgrounds;

/// Registration, login, logout and the landing page.
pub mod users;
