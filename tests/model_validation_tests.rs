use camp_portal::{
    error::AppError,
    forms::{CampgroundForm, LoginForm, RegisterForm, ReviewForm, violations},
    models::User,
};
use validator::Validate;

// --- Test Utilities ---

fn valid_campground() -> CampgroundForm {
    CampgroundForm {
        title: "Pine Ridge".to_string(),
        price: Some(25.0),
        location: "Denver, CO".to_string(),
        description: "Shady sites under tall pines".to_string(),
        delete_images: vec![],
    }
}

fn messages<T: Validate>(form: &T) -> Vec<String> {
    form.validate()
        .map(|_| Vec::new())
        .unwrap_or_else(|e| violations(&e))
}

// --- Tests ---

#[test]
fn test_campground_form_accepts_valid_input() {
    assert!(valid_campground().validate().is_ok());
    // Zero is an allowed price.
    let free = CampgroundForm {
        price: Some(0.0),
        ..valid_campground()
    };
    assert!(free.validate().is_ok());
}

#[test]
fn test_campground_form_rejects_negative_price() {
    let form = CampgroundForm {
        price: Some(-5.0),
        ..valid_campground()
    };
    assert_eq!(
        messages(&form),
        vec!["price must be greater than or equal to 0"]
    );
}

#[test]
fn test_campground_form_requires_title_and_price() {
    let form = CampgroundForm {
        title: String::new(),
        price: None,
        ..valid_campground()
    };
    assert_eq!(messages(&form), vec!["price is required", "title is required"]);
}

#[test]
fn test_campground_form_rejects_html() {
    let form = CampgroundForm {
        description: "<script>alert('hi')</script>".to_string(),
        ..valid_campground()
    };
    assert_eq!(messages(&form), vec!["description must not include HTML!"]);
}

#[test]
fn test_review_form_rating_bounds() {
    let review = |rating| ReviewForm {
        body: "Lovely".to_string(),
        rating,
    };
    assert!(review(Some(1)).validate().is_ok());
    assert!(review(Some(5)).validate().is_ok());
    assert_eq!(messages(&review(Some(0))), vec!["rating must be between 1 and 5"]);
    assert_eq!(messages(&review(Some(6))), vec!["rating must be between 1 and 5"]);
    assert_eq!(messages(&review(None)), vec!["rating is required"]);
}

#[test]
fn test_register_form_rules() {
    let ok = RegisterForm {
        username: "camper_01".to_string(),
        password: "long-enough".to_string(),
    };
    assert!(ok.validate().is_ok());

    let bad = RegisterForm {
        username: "camper 01".to_string(),
        password: "short".to_string(),
    };
    let found = messages(&bad);
    assert_eq!(found.len(), 2);
    assert!(found[0].starts_with("password "));
    assert!(found[1].starts_with("username "));
}

#[test]
fn test_login_form_requires_both_fields() {
    let form = LoginForm::default();
    assert_eq!(
        messages(&form),
        vec!["password is required", "username is required"]
    );
}

#[test]
fn test_validation_error_joins_with_comma() {
    let err = AppError::Validation(messages(&CampgroundForm {
        title: String::new(),
        price: Some(-1.0),
        ..valid_campground()
    }));
    assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(
        err.public_message(),
        "price must be greater than or equal to 0,title is required"
    );
}

#[test]
fn test_user_password_hash_is_never_serialized() {
    let user = User {
        username: "camper".to_string(),
        password_hash: "$argon2id$v=19$secret".to_string(),
        ..User::default()
    };
    let json = serde_json::to_string(&user).unwrap();
    assert!(json.contains("camper"));
    assert!(!json.contains("argon2id"));
}
