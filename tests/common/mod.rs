#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use camp_portal::{
    AppConfig, AppState, InMemoryRepository, MockGeocoder, MockStorageService, create_router,
};
use std::sync::Arc;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use uuid::Uuid;

pub const PASSWORD: &str = "correct-horse-battery";
const BOUNDARY: &str = "----camp-portal-test-boundary";

/// TestApp
///
/// The full router over in-memory collaborators. Tests keep handles on the repository and
/// the storage mock to assert on side effects.
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<InMemoryRepository>,
    pub storage: MockStorageService,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_geocoder(MockGeocoder::new())
    }

    pub fn with_geocoder(geocoder: MockGeocoder) -> Self {
        Self::with_services(geocoder, MockStorageService::new())
    }

    pub fn with_storage(storage: MockStorageService) -> Self {
        Self::with_services(MockGeocoder::new(), storage)
    }

    fn with_services(geocoder: MockGeocoder, storage: MockStorageService) -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        let state = AppState {
            repo: repo.clone(),
            storage: Arc::new(storage.clone()),
            geocoder: Arc::new(geocoder),
            config: AppConfig::default(),
        };
        TestApp {
            router: create_router(state, MemoryStore::default()),
            repo,
            storage,
        }
    }

    /// A fresh browser: no cookie yet.
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
        }
    }

    /// A browser already logged in as a newly registered `username`.
    pub async fn logged_in(&self, username: &str) -> TestClient {
        let mut client = self.client();
        let response = client
            .post_form("/register", &format!("username={}&password={}", username, PASSWORD))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/campgrounds");
        client
    }
}

/// TestClient
///
/// Sends requests through the router and carries the session cookie between them, the
/// way a browser would.
pub struct TestClient {
    router: Router,
    pub cookie: Option<String>,
}

impl TestClient {
    pub async fn send(&mut self, mut request: Request<Body>) -> Response<Body> {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie
                .to_str()
                .unwrap()
                .split(';')
                .next()
                .unwrap()
                .to_string();
            self.cookie = Some(pair);
        }
        response
    }

    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// GETs `uri` and returns the status plus the rendered HTML.
    pub async fn page(&mut self, uri: &str) -> (StatusCode, String) {
        let response = self.get(uri).await;
        let status = response.status();
        (status, body_text(response).await)
    }

    pub async fn post_form(&mut self, uri: &str, body: &str) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_multipart(
        &mut self,
        uri: &str,
        fields: &[(&str, &str)],
        files: &[(&str, &str)],
    ) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(fields, files)))
                .unwrap(),
        )
        .await
    }

    /// Creates a campground through the form and returns its id.
    pub async fn create_campground(&mut self, title: &str, price: &str, place: &str) -> Uuid {
        let response = self
            .post_multipart(
                "/campgrounds",
                &campground_fields(title, price, place),
                &[("tent.jpg", "image/jpeg")],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let target = location(&response);
        let id = target
            .strip_prefix("/campgrounds/")
            .unwrap_or_else(|| panic!("unexpected redirect {}", target));
        Uuid::parse_str(id).unwrap()
    }

    pub async fn create_review(&mut self, campground_id: Uuid, body: &str, rating: i32) {
        let response = self
            .post_form(
                &format!("/campgrounds/{}/reviews", campground_id),
                &format!("body={}&rating={}", body, rating),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}

pub fn campground_fields<'a>(
    title: &'a str,
    price: &'a str,
    location: &'a str,
) -> Vec<(&'a str, &'a str)> {
    vec![
        ("title", title),
        ("price", price),
        ("location", location),
        ("description", "Quiet sites by the creek"),
    ]
}

/// Builds a multipart body. Each file is `(file name, content type)` with a few fake bytes.
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (file_name, content_type) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("response is not a redirect")
        .to_str()
        .unwrap()
        .to_string()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
