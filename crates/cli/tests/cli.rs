use assert_cmd::Command;

#[test]
fn test_help_lists_subcommands() {
    let output = Command::cargo_bin("shelf")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("config"));
    assert!(stdout.contains("reconcile"));
}

#[test]
fn test_config_redacts_secret() {
    let output = Command::cargo_bin("shelf")
        .unwrap()
        .arg("config")
        .env("SHELF_ENV", "local")
        .env("SHELF_CONFIG_DIR", env!("CARGO_MANIFEST_DIR"))
        .env("SHELF_AUTH__JWT_SECRET", "cli-test-secret")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<redacted>"));
    assert!(!stdout.contains("cli-test-secret"));
}

fn seeded_database(dir: &std::path::Path) -> (String, String) {
    use shelf_app::modules::books::models::{CreateBook, Subcategories};
    use shelf_app::modules::reviews::models::CreateReview;
    use shelf_app::modules::users::models::RegisterUser;
    use shelf_db::Reviewer;
    use shelf_kernel::settings::Settings;

    let url = format!("sqlite://{}", dir.join("shelf.db").display());
    let mut settings = Settings::default();
    settings.database.url = url.clone();

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let book_id = runtime.block_on(async {
        let state = shelf_app::AppState::connect(settings).await.unwrap();
        let user = state
            .identity
            .register(RegisterUser {
                title: Some("Mr".to_string()),
                name: Some("Reader".to_string()),
                phone: Some("9876543210".to_string()),
                email: Some("reader@x.com".to_string()),
                password: Some("password1".to_string()),
                address: None,
            })
            .await
            .unwrap();
        let book = state
            .catalog
            .create(
                user.id,
                CreateBook {
                    title: Some("T1".to_string()),
                    excerpt: Some("excerpt".to_string()),
                    user_id: None,
                    isbn: Some("ISBN1".to_string()),
                    category: Some("Fiction".to_string()),
                    subcategory: Some(Subcategories::One("Drama".to_string())),
                    released_at: Some("2020-01-01".to_string()),
                },
            )
            .await
            .unwrap();
        for rating in [3, 5] {
            state
                .reviews
                .create(
                    Reviewer::Guest,
                    CreateReview {
                        book_id: Some(book.id.to_string()),
                        rating: Some(rating),
                        review: None,
                    },
                )
                .await
                .unwrap();
        }
        state.store.close().await;
        book.id.to_string()
    });

    (url, book_id)
}

#[test]
fn test_reconcile_reports_counter() {
    let dir = tempfile::tempdir().unwrap();
    let (url, book_id) = seeded_database(dir.path());

    let output = Command::cargo_bin("shelf")
        .unwrap()
        .args(["reconcile", &book_id])
        .env("SHELF_ENV", "local")
        .env("SHELF_CONFIG_DIR", env!("CARGO_MANIFEST_DIR"))
        .env("SHELF_DATABASE__URL", &url)
        .env("RUST_LOG", "error")
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&book_id));
    assert!(stdout.contains("\"before\": 2"));
    assert!(stdout.contains("\"after\": 2"));
}

#[test]
fn test_reconcile_rejects_unknown_and_malformed_ids() {
    let dir = tempfile::tempdir().unwrap();
    let (url, _) = seeded_database(dir.path());

    for book_id in ["abc", "0190a1b2-0000-7000-8000-000000000000"] {
        let output = Command::cargo_bin("shelf")
            .unwrap()
            .args(["reconcile", book_id])
            .env("SHELF_ENV", "local")
            .env("SHELF_CONFIG_DIR", env!("CARGO_MANIFEST_DIR"))
            .env("SHELF_DATABASE__URL", &url)
            .env("RUST_LOG", "error")
            .output()
            .unwrap();
        assert!(!output.status.success(), "{book_id} should fail");
    }
}
