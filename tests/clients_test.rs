//! Client administration tests: explicit CRUD, the delete guard tied to
//! invoices, and the pets read path.

mod common;

use common::{count_rows, custom_item, draft, pet_group, test_db};
use vetms_api::error::AppError;

#[tokio::test]
async fn create_client_rejects_duplicates() {
    let db = test_db().await;

    let jane = db
        .create_client("Jane Doe", Some("555-1234"))
        .await
        .expect("create client");
    assert_eq!(jane.contact_info.as_deref(), Some("555-1234"));

    let err = db
        .create_client("Jane Doe", None)
        .await
        .expect_err("duplicate name");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn create_client_rejects_blank_name() {
    let db = test_db().await;
    let err = db.create_client("   ", None).await.expect_err("blank name");
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn update_client_reports_missing_row() {
    let db = test_db().await;
    assert!(db
        .update_client(42, "Jane Doe", None)
        .await
        .expect("update")
        .is_none());

    let jane = db.create_client("Jane Doe", None).await.expect("create");
    let renamed = db
        .update_client(jane.id, "Jane Smith", Some("555-0000"))
        .await
        .expect("update")
        .expect("client exists");
    assert_eq!(renamed.name, "Jane Smith");
    assert_eq!(renamed.contact_info.as_deref(), Some("555-0000"));
}

#[tokio::test]
async fn delete_is_refused_while_invoices_reference_the_client() {
    let db = test_db().await;

    let result = db
        .create_invoice(&draft(
            "Jane Doe",
            vec![pet_group("Rex", None, vec![custom_item("Visit", 1.0, 10.0)])],
        ))
        .await
        .expect("create invoice");

    let client_id: i64 = sqlx::query_scalar("SELECT id FROM clients WHERE name = 'Jane Doe'")
        .fetch_one(db.pool())
        .await
        .expect("client row");

    let err = db.delete_client(client_id).await.expect_err("guarded");
    assert!(matches!(err, AppError::BadRequest(_)));

    // once the invoice is gone the client can be removed, pets included
    assert!(db.delete_invoice(result.invoice_id).await.expect("delete invoice"));
    assert!(db.delete_client(client_id).await.expect("delete client"));
    assert!(!db.delete_client(client_id).await.expect("second delete"));
    assert_eq!(count_rows(&db, "pets").await, 0);
}

#[tokio::test]
async fn list_clients_filters_by_substring() {
    let db = test_db().await;
    db.create_client("Jane Doe", None).await.expect("jane");
    db.create_client("John Smith", None).await.expect("john");

    let all = db.list_clients(None).await.expect("list");
    assert_eq!(all.len(), 2);

    let filtered = db.list_clients(Some("doe")).await.expect("filter");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].name, "Jane Doe");
}

#[tokio::test]
async fn list_pets_is_scoped_and_sorted() {
    let db = test_db().await;

    db.create_invoice(&draft(
        "Jane Doe",
        vec![
            pet_group("Rex", Some("Dog"), vec![custom_item("Visit", 1.0, 10.0)]),
            pet_group("Milo", Some("Cat"), vec![custom_item("Visit", 1.0, 10.0)]),
        ],
    ))
    .await
    .expect("jane's invoice");

    db.create_invoice(&draft(
        "John Smith",
        vec![pet_group("Buddy", None, vec![custom_item("Visit", 1.0, 10.0)])],
    ))
    .await
    .expect("john's invoice");

    let jane_id: i64 = sqlx::query_scalar("SELECT id FROM clients WHERE name = 'Jane Doe'")
        .fetch_one(db.pool())
        .await
        .expect("client row");

    let pets = db.list_pets(jane_id).await.expect("list pets");
    let names: Vec<&str> = pets.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Milo", "Rex"]);
    assert_eq!(pets[1].species.as_deref(), Some("Dog"));
}
