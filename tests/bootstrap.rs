use comic_back_db::{Catalog, CatalogCall, CatalogError, MemoryCatalog, Role, RoleGrant};
use comic_back_init::plan::{ADMIN_USER, APP_USER, COMICS_COLLECTION, DATABASE};
use comic_back_init::{verify, Outcome, Plan};
use comic_back_kernel::StepError;

async fn bootstrapped() -> MemoryCatalog {
    let catalog = MemoryCatalog::new();
    Plan::comic_back()
        .bootstrap()
        .run(&catalog)
        .await
        .expect("first run succeeds on an empty store");
    catalog
}

#[tokio::test]
async fn fresh_store_gets_database() {
    let catalog = bootstrapped().await;
    assert!(catalog.database_exists(DATABASE).await.unwrap());
}

#[tokio::test]
async fn app_user_has_single_read_write_grant() {
    let catalog = bootstrapped().await;
    let user = catalog
        .find_principal(DATABASE, APP_USER)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.roles, vec![RoleGrant::new(Role::ReadWrite, "comic-back")]);
}

#[tokio::test]
async fn admin_has_schema_admin_and_read_write() {
    let catalog = bootstrapped().await;
    let admin = catalog
        .find_principal(DATABASE, ADMIN_USER)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.roles.len(), 2);
    assert!(admin
        .roles
        .contains(&RoleGrant::new(Role::DbAdmin, "comic-back")));
    assert!(admin
        .roles
        .contains(&RoleGrant::new(Role::ReadWrite, "comic-back")));
}

#[tokio::test]
async fn comics_collection_is_empty_and_unindexed() {
    let catalog = bootstrapped().await;
    let comics = catalog
        .find_collection(DATABASE, COMICS_COLLECTION)
        .await
        .unwrap()
        .unwrap();
    assert!(comics.is_empty());
    assert!(comics.has_only_default_indexes());
}

#[tokio::test]
async fn verification_passes_after_run() {
    let catalog = bootstrapped().await;
    let report = verify(&catalog, &Plan::comic_back()).await.unwrap();
    assert!(report.is_ok(), "{report:?}");
    assert_eq!(report.checks.len(), 4);
}

#[tokio::test]
async fn second_run_fails_on_first_principal_and_keeps_state() {
    let catalog = bootstrapped().await;
    let before = catalog.journal().await.len();

    let err = Plan::comic_back()
        .bootstrap()
        .run(&catalog)
        .await
        .unwrap_err();

    assert_eq!(err.index, 1);
    assert_eq!(err.completed, vec!["select database 'comic-back'"]);
    match &err.source {
        StepError::Catalog(CatalogError::DuplicatePrincipal { username, database }) => {
            assert_eq!(username, APP_USER);
            assert_eq!(database, DATABASE);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Only the select and the rejected createUser reached the catalog.
    let journal = catalog.journal().await;
    assert_eq!(journal.len(), before + 2);
    assert!(!journal[before + 1].accepted);

    let report = verify(&catalog, &Plan::comic_back()).await.unwrap();
    assert!(report.is_ok());
}

#[tokio::test]
async fn run_issues_exactly_the_four_operations() {
    let catalog = bootstrapped().await;
    let calls: Vec<CatalogCall> = catalog
        .journal()
        .await
        .into_iter()
        .map(|entry| entry.call)
        .collect();

    assert_eq!(
        calls,
        vec![
            CatalogCall::SelectDatabase {
                name: "comic-back".to_string()
            },
            CatalogCall::CreateUser {
                db: "comic-back".to_string(),
                username: "mongousr".to_string()
            },
            CatalogCall::CreateUser {
                db: "comic-back".to_string(),
                username: "admin".to_string()
            },
            CatalogCall::CreateCollection {
                db: "comic-back".to_string(),
                name: "comics".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn preexisting_collection_aborts_after_users() {
    let catalog = MemoryCatalog::new();
    catalog
        .create_collection(DATABASE, COMICS_COLLECTION)
        .await
        .unwrap();

    let err = Plan::comic_back()
        .bootstrap()
        .run(&catalog)
        .await
        .unwrap_err();
    assert_eq!(err.index, 3);
    assert!(matches!(
        err.source,
        StepError::Catalog(CatalogError::DuplicateCollection { .. })
    ));
    assert!(catalog
        .find_principal(DATABASE, ADMIN_USER)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn documents_in_comics_fail_verification() {
    let catalog = bootstrapped().await;
    assert!(
        catalog
            .set_document_count(DATABASE, COMICS_COLLECTION, 3)
            .await
    );

    let report = verify(&catalog, &Plan::comic_back()).await.unwrap();
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].subject, "collection 'comics'");
    assert_eq!(
        failures[0].outcome,
        Outcome::Mismatch {
            detail: "holds 3 documents".to_string()
        }
    );
}
