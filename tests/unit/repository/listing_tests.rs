use crate::support::{FakeDav, file, folder, init_tracing};
use chrono::{TimeZone, Utc};
use hyper::StatusCode;
use owncloud_dav_rs::{
    AesGcmPasswordCipher, Breadcrumb, CredentialStore, DavEntry, EntryKind, ListingEntry,
    MemoryCredentialStore, RepositoryInstance, Session, SessionError,
};
use std::sync::Arc;

async fn logged_in(dav: FakeDav) -> Session<FakeDav> {
    init_tracing();
    let dav = dav
        .with_account("alice", "s3cret")
        .with_folder("/root/", vec![folder("/root/")]);
    let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
    let mut session = Session::with_connector(
        RepositoryInstance::new(1, "Team cloud", "https://dav.example.com/root/"),
        store,
        Arc::new(AesGcmPasswordCipher::new()),
        dav,
    )
    .expect("valid instance");
    session
        .login(7, Some("alice"), Some("s3cret"))
        .await
        .expect("login");
    session
}

fn titles(entries: &[ListingEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.title.as_str()).collect()
}

#[tokio::test]
async fn nested_folder_listing_with_breadcrumbs() {
    let dav = FakeDav::new().with_folder(
        "/root/a/b/",
        vec![
            folder("/root/a/b/"),
            folder("/root/a/b/c/"),
            file("/root/a/b/d.txt", 10),
        ],
    );
    let mut session = logged_in(dav.clone()).await;

    let listing = session.list_directory("/a/b/").await.expect("listing");
    assert_eq!(
        listing.path,
        vec![Breadcrumb::new("a", "/a/"), Breadcrumb::new("b", "/a/b/")]
    );
    assert_eq!(
        listing.entries,
        vec![
            ListingEntry {
                title: "c".to_string(),
                href: "/a/b/c/".to_string(),
                last_modified: None,
                kind: EntryKind::Folder,
            },
            ListingEntry {
                title: "d.txt".to_string(),
                href: "/a/b/d.txt".to_string(),
                last_modified: None,
                kind: EntryKind::File { size: Some(10) },
            },
        ]
    );
    assert!(listing.entries[0].is_folder());
    assert_eq!(listing.entries[0].size(), None);
    assert_eq!(listing.entries[1].size(), Some(10));
    assert_eq!(dav.listed().last().map(String::as_str), Some("/root/a/b/"));
}

#[tokio::test]
async fn root_listing_has_no_breadcrumbs() {
    let dav = FakeDav::new();
    let mut session = logged_in(dav.clone()).await;

    for path in ["", "/"] {
        let listing = session.list_directory(path).await.expect("root listing");
        assert!(listing.path.is_empty());
        assert!(listing.entries.is_empty(), "the root itself is not an entry");
    }
    assert_eq!(dav.listed(), vec!["/root/", "/root/", "/root/"]);
}

#[tokio::test]
async fn folders_first_then_files_case_insensitively() {
    let dav = FakeDav::new().with_folder(
        "/root/docs/",
        vec![
            file("/root/docs/b.txt", 2),
            folder("/root/docs/zeta/"),
            file("/root/docs/A.txt", 1),
            folder("/root/docs/Alpha/"),
            folder("/root/docs/beta/"),
            file("/root/docs/c.txt", 3),
        ],
    );
    let mut session = logged_in(dav).await;

    let listing = session.list_directory("/docs/").await.expect("listing");
    assert_eq!(
        titles(&listing.entries),
        vec!["Alpha", "beta", "zeta", "A.txt", "b.txt", "c.txt"]
    );
    let kinds: Vec<bool> = listing.entries.iter().map(ListingEntry::is_folder).collect();
    assert_eq!(kinds, vec![true, true, true, false, false, false]);
}

#[tokio::test]
async fn self_entry_is_skipped_with_or_without_trailing_slash() {
    let dav = FakeDav::new().with_folder(
        "/root/docs/",
        vec![folder("/root/docs"), file("/root/docs/notes.md", 5)],
    );
    let mut session = logged_in(dav).await;

    let listing = session.list_directory("/docs/").await.expect("listing");
    assert_eq!(titles(&listing.entries), vec!["notes.md"]);
}

#[tokio::test]
async fn absolute_hrefs_and_percent_encoding_are_normalized() {
    let dav = FakeDav::new().with_folder(
        "/root/My Docs/",
        vec![
            folder("https://dav.example.com/root/My%20Docs/"),
            folder("https://DAV.example.com:443/root/My%20Docs/Sub%20Folder/"),
            file("/root/My%20Docs/caf%C3%A9.txt", 4),
        ],
    );
    let mut session = logged_in(dav.clone()).await;

    let listing = session.list_directory("/My%20Docs/").await.expect("listing");
    assert_eq!(listing.path, vec![Breadcrumb::new("My Docs", "/My%20Docs/")]);
    assert_eq!(titles(&listing.entries), vec!["Sub Folder", "café.txt"]);
    assert_eq!(listing.entries[0].href, "/My Docs/Sub Folder/");
    assert_eq!(listing.entries[1].href, "/My Docs/café.txt");
    assert_eq!(dav.listed().last().map(String::as_str), Some("/root/My Docs/"));
}

#[tokio::test]
async fn last_modified_is_parsed_when_valid() {
    let dav = FakeDav::new().with_folder(
        "/root/logs/",
        vec![
            folder("/root/logs/"),
            DavEntry {
                last_modified: Some("Tue, 01 Oct 2024 12:30:00 GMT".to_string()),
                ..file("/root/logs/dated.txt", 1)
            },
            DavEntry {
                last_modified: Some("yesterday-ish".to_string()),
                ..file("/root/logs/undated.txt", 1)
            },
        ],
    );
    let mut session = logged_in(dav).await;

    let listing = session.list_directory("/logs/").await.expect("listing");
    assert_eq!(
        listing.entries[0].last_modified,
        Some(Utc.with_ymd_and_hms(2024, 10, 1, 12, 30, 0).unwrap())
    );
    assert_eq!(listing.entries[1].last_modified, None);
}

#[tokio::test]
async fn unauthorized_listing_ends_the_session() {
    let dav = FakeDav::new();
    let mut session = logged_in(dav.clone()).await;

    dav.set_status(Some(StatusCode::UNAUTHORIZED));
    let err = session.list_directory("/").await.expect_err("401");
    assert!(matches!(err, SessionError::AuthenticationFailed { ref username } if username == "alice"));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn listing_failures_are_transfer_errors() {
    let dav = FakeDav::new();
    let mut session = logged_in(dav.clone()).await;

    dav.set_status(Some(StatusCode::INTERNAL_SERVER_ERROR));
    let err = session.list_directory("/").await.expect_err("500");
    assert!(matches!(err, SessionError::TransferError { .. }));
    assert!(session.is_authenticated());

    dav.set_status(None);
    dav.set_unreachable(true);
    let err = session.list_directory("/").await.expect_err("unreachable");
    assert!(matches!(err, SessionError::TransferError { .. }));
}

#[tokio::test]
async fn fetch_file_decodes_the_href_and_writes_the_destination() {
    let dav = FakeDav::new().with_file("/root/My Docs/report.pdf", b"%PDF-1.7");
    let session = logged_in(dav).await;
    let dir = tempfile::tempdir().expect("temp dir");

    let saved = session
        .fetch_file("/My%20Docs/report.pdf", dir.path().join("report.pdf"))
        .await
        .expect("fetch");
    assert_eq!(saved, dir.path().join("report.pdf"));
    assert_eq!(std::fs::read(&saved).expect("read"), b"%PDF-1.7");
}

#[tokio::test]
async fn fetch_missing_file_is_a_transfer_error() {
    let session = logged_in(FakeDav::new()).await;
    let dir = tempfile::tempdir().expect("temp dir");

    let err = session
        .fetch_file("/nope.txt", dir.path().join("nope.txt"))
        .await
        .expect_err("404");
    assert!(matches!(err, SessionError::TransferError { .. }));
    assert!(err.to_string().contains("/root/nope.txt"));
}

#[tokio::test]
async fn path_without_trailing_slash_lists_like_the_slashed_one() {
    let dav = FakeDav::new().with_folder(
        "/root/a/b/",
        vec![
            folder("/root/a/b/"),
            folder("/root/a/b/c/"),
            file("/root/a/b/d.txt", 10),
        ],
    );
    let mut session = logged_in(dav.clone()).await;

    let bare = session.list_directory("/a/b").await.expect("listing");
    assert_eq!(dav.listed().last().map(String::as_str), Some("/root/a/b/"));
    let slashed = session.list_directory("/a/b/").await.expect("listing");
    assert_eq!(titles(&bare.entries), vec!["c", "d.txt"]);
    assert_eq!(bare, slashed);

    let relative = session.list_directory("a/b").await.expect("listing");
    assert_eq!(relative, slashed);
}

#[tokio::test]
async fn folder_order_compares_titles_with_their_trailing_slash() {
    let dav = FakeDav::new().with_folder(
        "/root/p/",
        vec![
            folder("/root/p/A/"),
            folder("/root/p/A-x/"),
            folder("/root/p/B/"),
        ],
    );
    let mut session = logged_in(dav).await;

    let listing = session.list_directory("/p/").await.expect("listing");
    assert_eq!(titles(&listing.entries), vec!["A-x", "A", "B"]);
}
