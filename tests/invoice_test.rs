//! Invoice engine integration tests: totals, reconciliation, friendly ids,
//! edit semantics and failure atomicity.

mod common;

use common::{catalog_item, count_rows, custom_item, draft, pet_group, seed_product, test_db};
use chrono::Utc;
use validator::Validate;
use vetms_api::error::AppError;
use vetms_api::models::InvoiceStatus;

#[tokio::test]
async fn create_computes_total_and_assigns_first_friendly_id() {
    let db = test_db().await;
    let checkup = seed_product(&db, "Checkup", 100.0).await;

    let result = db
        .create_invoice(&draft(
            "Jane Doe",
            vec![pet_group(
                "Rex",
                Some("Dog"),
                vec![
                    catalog_item(checkup, 1.0, 100.0),
                    custom_item("Bandage", 2.0, 15.0),
                ],
            )],
        ))
        .await
        .expect("create invoice");

    assert_eq!(result.total, 130.0);
    assert_eq!(result.friendly_id, "MBV-0001");
    assert!(result.warnings.is_empty());

    let detail = db
        .get_invoice(result.invoice_id)
        .await
        .expect("get invoice")
        .expect("invoice exists");
    assert_eq!(detail.invoice.friendly_id, "MBV-0001");
    assert_eq!(detail.invoice.total_amount, 130.0);
    assert_eq!(detail.invoice.client_name, "Jane Doe");
    assert_eq!(detail.items.len(), 2);
    for item in &detail.items {
        assert_eq!(item.pet_name.as_deref(), Some("Rex"));
        assert_eq!(item.pet_species.as_deref(), Some("Dog"));
    }
    assert_eq!(detail.items[0].product_name_snapshot, "Checkup");
    assert_eq!(detail.items[0].product_id, Some(checkup));
    assert_eq!(detail.items[1].product_name_snapshot, "Bandage");
    assert_eq!(detail.items[1].product_id, None);
}

#[tokio::test]
async fn second_invoice_reuses_client_and_increments_friendly_id() {
    let db = test_db().await;

    db.create_invoice(&draft(
        "Jane Doe",
        vec![pet_group("Rex", Some("Dog"), vec![custom_item("Nail trim", 1.0, 20.0)])],
    ))
    .await
    .expect("first invoice");

    let second = db
        .create_invoice(&draft(
            "Jane Doe",
            vec![pet_group("Milo", None, vec![custom_item("Vaccine", 1.0, 45.0)])],
        ))
        .await
        .expect("second invoice");

    assert_eq!(second.friendly_id, "MBV-0002");
    assert_eq!(count_rows(&db, "clients").await, 1);
    assert_eq!(count_rows(&db, "pets").await, 2);

    let client_id: i64 = sqlx::query_scalar("SELECT id FROM clients WHERE name = 'Jane Doe'")
        .fetch_one(db.pool())
        .await
        .expect("client row");
    let pets = db.list_pets(client_id).await.expect("list pets");
    let names: Vec<&str> = pets.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Milo", "Rex"]);
}

#[tokio::test]
async fn friendly_ids_are_gapless_under_sequential_submission() {
    let db = test_db().await;
    for expected in ["MBV-0001", "MBV-0002", "MBV-0003"] {
        let result = db
            .create_invoice(&draft(
                "Jane Doe",
                vec![pet_group("Rex", None, vec![custom_item("Visit", 1.0, 10.0)])],
            ))
            .await
            .expect("create invoice");
        assert_eq!(result.friendly_id, expected);
    }
}

#[tokio::test]
async fn contact_info_is_preserved_unless_resupplied() {
    let db = test_db().await;

    let mut first = draft(
        "Jane Doe",
        vec![pet_group("Rex", None, vec![custom_item("Visit", 1.0, 10.0)])],
    );
    first.contact_info = Some("555-1234".to_string());
    db.create_invoice(&first).await.expect("first invoice");

    // omitted contact info never erases the stored value
    db.create_invoice(&draft(
        "Jane Doe",
        vec![pet_group("Rex", None, vec![custom_item("Visit", 1.0, 10.0)])],
    ))
    .await
    .expect("second invoice");

    let contact: Option<String> =
        sqlx::query_scalar("SELECT contact_info FROM clients WHERE name = 'Jane Doe'")
            .fetch_one(db.pool())
            .await
            .expect("contact info");
    assert_eq!(contact.as_deref(), Some("555-1234"));

    // a supplied value overwrites
    let mut third = draft(
        "Jane Doe",
        vec![pet_group("Rex", None, vec![custom_item("Visit", 1.0, 10.0)])],
    );
    third.contact_info = Some("555-9999".to_string());
    db.create_invoice(&third).await.expect("third invoice");

    let contact: Option<String> =
        sqlx::query_scalar("SELECT contact_info FROM clients WHERE name = 'Jane Doe'")
            .fetch_one(db.pool())
            .await
            .expect("contact info");
    assert_eq!(contact.as_deref(), Some("555-9999"));
}

#[tokio::test]
async fn pet_species_is_preserved_unless_resupplied() {
    let db = test_db().await;

    db.create_invoice(&draft(
        "Jane Doe",
        vec![pet_group("Rex", Some("Dog"), vec![custom_item("Visit", 1.0, 10.0)])],
    ))
    .await
    .expect("first invoice");

    db.create_invoice(&draft(
        "Jane Doe",
        vec![pet_group("Rex", None, vec![custom_item("Visit", 1.0, 10.0)])],
    ))
    .await
    .expect("second invoice");

    let species: Option<String> = sqlx::query_scalar("SELECT species FROM pets WHERE name = 'Rex'")
        .fetch_one(db.pool())
        .await
        .expect("species");
    assert_eq!(species.as_deref(), Some("Dog"));
    assert_eq!(count_rows(&db, "pets").await, 1);
}

#[tokio::test]
async fn pet_names_are_scoped_per_client() {
    let db = test_db().await;

    db.create_invoice(&draft(
        "Jane Doe",
        vec![pet_group("Rex", Some("Dog"), vec![custom_item("Visit", 1.0, 10.0)])],
    ))
    .await
    .expect("jane's rex");

    db.create_invoice(&draft(
        "John Smith",
        vec![pet_group("Rex", Some("Cat"), vec![custom_item("Visit", 1.0, 10.0)])],
    ))
    .await
    .expect("john's rex");

    assert_eq!(count_rows(&db, "clients").await, 2);
    assert_eq!(count_rows(&db, "pets").await, 2);
}

#[tokio::test]
async fn update_replaces_items_and_keeps_friendly_id() {
    let db = test_db().await;
    let checkup = seed_product(&db, "Checkup", 100.0).await;

    let created = db
        .create_invoice(&draft(
            "Jane Doe",
            vec![pet_group(
                "Rex",
                Some("Dog"),
                vec![
                    catalog_item(checkup, 1.0, 100.0),
                    custom_item("Bandage", 2.0, 15.0),
                ],
            )],
        ))
        .await
        .expect("create invoice");

    let updated = db
        .update_invoice(
            created.invoice_id,
            &draft(
                "Jane Doe",
                vec![pet_group("Rex", Some("Dog"), vec![catalog_item(checkup, 1.0, 100.0)])],
            ),
        )
        .await
        .expect("update invoice");

    assert_eq!(updated.total, 100.0);
    assert_eq!(updated.friendly_id, created.friendly_id);

    let detail = db
        .get_invoice(created.invoice_id)
        .await
        .expect("get invoice")
        .expect("invoice exists");
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].product_name_snapshot, "Checkup");
    assert_eq!(detail.invoice.total_amount, 100.0);
}

#[tokio::test]
async fn update_of_missing_invoice_is_not_found() {
    let db = test_db().await;
    let err = db
        .update_invoice(
            999,
            &draft(
                "Jane Doe",
                vec![pet_group("Rex", None, vec![custom_item("Visit", 1.0, 10.0)])],
            ),
        )
        .await
        .expect_err("missing invoice");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn missing_product_rolls_back_the_whole_transaction() {
    let db = test_db().await;

    let clients_before = count_rows(&db, "clients").await;
    let pets_before = count_rows(&db, "pets").await;
    let invoices_before = count_rows(&db, "invoices").await;
    let items_before = count_rows(&db, "invoice_items").await;

    let err = db
        .create_invoice(&draft(
            "Jane Doe",
            vec![pet_group(
                "Rex",
                None,
                vec![
                    custom_item("Bandage", 1.0, 15.0),
                    catalog_item(12345, 1.0, 10.0),
                ],
            )],
        ))
        .await
        .expect_err("unknown product");
    assert!(matches!(err, AppError::NotFound(_)));

    assert_eq!(count_rows(&db, "clients").await, clients_before);
    assert_eq!(count_rows(&db, "pets").await, pets_before);
    assert_eq!(count_rows(&db, "invoices").await, invoices_before);
    assert_eq!(count_rows(&db, "invoice_items").await, items_before);
}

#[tokio::test]
async fn blank_custom_name_rolls_back_the_whole_transaction() {
    let db = test_db().await;

    let err = db
        .create_invoice(&draft(
            "Jane Doe",
            vec![pet_group("Rex", None, vec![custom_item("   ", 1.0, 15.0)])],
        ))
        .await
        .expect_err("blank custom name");
    assert!(matches!(err, AppError::BadRequest(_)));

    assert_eq!(count_rows(&db, "clients").await, 0);
    assert_eq!(count_rows(&db, "invoices").await, 0);
}

#[tokio::test]
async fn defaults_apply_for_date_and_status() {
    let db = test_db().await;

    let result = db
        .create_invoice(&draft(
            "Jane Doe",
            vec![pet_group("Rex", None, vec![custom_item("Visit", 1.0, 10.0)])],
        ))
        .await
        .expect("create invoice");

    let detail = db
        .get_invoice(result.invoice_id)
        .await
        .expect("get invoice")
        .expect("invoice exists");
    assert_eq!(detail.invoice.status, "Draft");
    assert_eq!(detail.invoice.date, Utc::now().date_naive());
}

#[tokio::test]
async fn paid_status_and_fractional_quantities_round_trip() {
    let db = test_db().await;

    let mut submitted = draft(
        "Jane Doe",
        vec![pet_group("Rex", None, vec![custom_item("Half dose", 0.5, 15.0)])],
    );
    submitted.status = InvoiceStatus::Paid;

    let result = db.create_invoice(&submitted).await.expect("create invoice");
    assert_eq!(result.total, 7.5);

    let detail = db
        .get_invoice(result.invoice_id)
        .await
        .expect("get invoice")
        .expect("invoice exists");
    assert_eq!(detail.invoice.status, "Paid");
    assert_eq!(detail.items[0].quantity, 0.5);
    assert_eq!(detail.items[0].price_snapshot, 15.0);
}

#[tokio::test]
async fn snapshot_keeps_operator_price_but_refreshes_product_name() {
    let db = test_db().await;
    let checkup = seed_product(&db, "Checkup", 100.0).await;

    // operator bills 80 against a 100 catalog price; the override wins
    let result = db
        .create_invoice(&draft(
            "Jane Doe",
            vec![pet_group("Rex", None, vec![catalog_item(checkup, 1.0, 80.0)])],
        ))
        .await
        .expect("create invoice");
    assert_eq!(result.total, 80.0);

    let detail = db
        .get_invoice(result.invoice_id)
        .await
        .expect("get invoice")
        .expect("invoice exists");
    assert_eq!(detail.items[0].price_snapshot, 80.0);
    assert_eq!(detail.items[0].product_name_snapshot, "Checkup");
}

#[tokio::test]
async fn delete_removes_header_and_items() {
    let db = test_db().await;

    let result = db
        .create_invoice(&draft(
            "Jane Doe",
            vec![pet_group("Rex", None, vec![custom_item("Visit", 1.0, 10.0)])],
        ))
        .await
        .expect("create invoice");

    assert!(db.delete_invoice(result.invoice_id).await.expect("delete"));
    assert!(db
        .get_invoice(result.invoice_id)
        .await
        .expect("get invoice")
        .is_none());
    assert_eq!(count_rows(&db, "invoice_items").await, 0);

    // second delete is a no-op
    assert!(!db.delete_invoice(result.invoice_id).await.expect("delete"));
}

#[tokio::test]
async fn listings_join_client_and_pet_names() {
    let db = test_db().await;

    db.create_invoice(&draft(
        "Jane Doe",
        vec![
            pet_group("Rex", None, vec![custom_item("Visit", 1.0, 10.0)]),
            pet_group("Milo", None, vec![custom_item("Visit", 1.0, 20.0)]),
        ],
    ))
    .await
    .expect("create invoice");

    let all = db.list_invoices().await.expect("list");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].client_name, "Jane Doe");
    let pet_names = all[0].pet_names.as_deref().expect("pet names");
    assert!(pet_names.contains("Rex") && pet_names.contains("Milo"));

    let recent = db.recent_invoices().await.expect("recent");
    assert_eq!(recent.len(), 1);
}

#[tokio::test]
async fn recent_listing_caps_at_ten_rows() {
    let db = test_db().await;

    for _ in 0..11 {
        db.create_invoice(&draft(
            "Jane Doe",
            vec![pet_group("Rex", None, vec![custom_item("Visit", 1.0, 10.0)])],
        ))
        .await
        .expect("create invoice");
    }

    assert_eq!(db.list_invoices().await.expect("list").len(), 11);

    let recent = db.recent_invoices().await.expect("recent");
    assert_eq!(recent.len(), 10);
    // newest first
    assert_eq!(recent[0].friendly_id, "MBV-0011");
}

#[tokio::test]
async fn draft_validation_rejects_malformed_input() {
    // empty pet list; the error body must render as JSON for the 400
    let empty_pets = draft("Jane Doe", vec![]);
    let err = empty_pets.validate().expect_err("empty pets rejected");
    let rendered = serde_json::to_string(&err).expect("serializable validation errors");
    assert!(rendered.contains("pets"));

    // blank client name
    let blank_client = draft(
        "",
        vec![pet_group("Rex", None, vec![custom_item("Visit", 1.0, 10.0)])],
    );
    assert!(blank_client.validate().is_err());

    // zero quantity
    let zero_qty = draft(
        "Jane Doe",
        vec![pet_group("Rex", None, vec![custom_item("Visit", 0.0, 10.0)])],
    );
    assert!(zero_qty.validate().is_err());

    // negative price
    let negative_price = draft(
        "Jane Doe",
        vec![pet_group("Rex", None, vec![custom_item("Visit", 1.0, -1.0)])],
    );
    assert!(negative_price.validate().is_err());

    // pet group without items
    let no_items = draft("Jane Doe", vec![pet_group("Rex", None, vec![])]);
    assert!(no_items.validate().is_err());
}
