mod common;

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::NaiveDate;
use db::models::{
    activity_log::ActivityLogFilter,
    company_profile::{CompanyProfileFilter, CreateCompanyProfile, UpdateCompanyProfile},
    crop_production::{CreateCropProduction, CropProductionFilter},
    farmer_profile::{CreateFarmerProfile, FarmerProfileFilter, UpdateFarmerProfile},
    livestock_price::{CreateLivestockRetailPrice, LivestockRetailPriceFilter},
    pagination::Pagination,
};
use serde_json::json;
use services::services::{
    activity_log::ActivityLogService,
    company_profile::{CompanyProfileError, CompanyProfileService},
    crop_production::{CropProductionError, CropProductionService},
    farmer_profile::{FarmerProfileError, FarmerProfileService},
    livestock_price::{ImportLivestockRetailPrices, LivestockPriceError, LivestockPriceService},
    privilege::PrivilegeError,
    request::{DeleteRequest, ListRequest, UpdateRequest},
};
use utils::tokenize::Tokenizer;
use uuid::Uuid;

use common::{officer_with, setup_db, super_admin};

fn farmer(registration_number: &str) -> CreateFarmerProfile {
    CreateFarmerProfile {
        registration_number: registration_number.to_string(),
        name: "Maria Soares".to_string(),
        identity_number: None,
        address: None,
        district: "Baucau".to_string(),
        phone: None,
    }
}

fn company(registration_number: &str) -> CreateCompanyProfile {
    CreateCompanyProfile {
        registration_number: registration_number.to_string(),
        company_name: "Cooperativa Cafe".to_string(),
        address: Some("Rua de Ermera".to_string()),
        district: "Ermera".to_string(),
        contact_person: Some("Joao".to_string()),
        phone: Some("+670 7723 0000".to_string()),
    }
}

fn price(livestock: &str, day: u32) -> CreateLivestockRetailPrice {
    CreateLivestockRetailPrice {
        livestock: livestock.to_string(),
        unit: "kg".to_string(),
        price: 4.5,
        market: Some("Mercado Lama".to_string()),
        district: "Dili".to_string(),
        price_date: NaiveDate::from_ymd_opt(2024, 7, day).unwrap(),
    }
}

#[tokio::test]
async fn test_duplicate_registration_number() {
    let db = setup_db().await;
    let admin = super_admin(&db).await;

    FarmerProfileService::create(&db.pool, &admin, &farmer("FR-100"))
        .await
        .unwrap();
    let err = FarmerProfileService::create(&db.pool, &admin, &farmer(" FR-100 "))
        .await
        .unwrap_err();
    assert!(matches!(err, FarmerProfileError::Duplicate(ref n) if n == "FR-100"));
    assert_eq!(
        err.to_string(),
        "Farmer with registration number FR-100 already exists"
    );
}

#[tokio::test]
async fn test_update_to_taken_registration_number() {
    let db = setup_db().await;
    let admin = super_admin(&db).await;
    FarmerProfileService::create(&db.pool, &admin, &farmer("FR-1"))
        .await
        .unwrap();
    let second = FarmerProfileService::create(&db.pool, &admin, &farmer("FR-2"))
        .await
        .unwrap();

    let err = FarmerProfileService::update(
        &db.pool,
        &admin,
        &UpdateRequest {
            id: second.id,
            changes: UpdateFarmerProfile {
                registration_number: Some("FR-1".to_string()),
                ..Default::default()
            },
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, FarmerProfileError::Duplicate(_)));

    // Keeping its own number is not a conflict
    let updated = FarmerProfileService::update(
        &db.pool,
        &admin,
        &UpdateRequest {
            id: second.id,
            changes: UpdateFarmerProfile {
                registration_number: Some("FR-2".to_string()),
                name: Some("Ana Belo".to_string()),
                ..Default::default()
            },
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "Ana Belo");
}

#[tokio::test]
async fn test_privileges_gate_each_access_level() {
    let db = setup_db().await;
    let reader = officer_with(&db, "reader", &["farmer_profile:read"]).await;

    let listed = FarmerProfileService::list(&db.pool, &reader, &ListRequest::default()).await;
    assert!(listed.unwrap().is_empty());

    let err = FarmerProfileService::create(&db.pool, &reader, &farmer("FR-9"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Forbidden: missing privilege farmer_profile:write"
    );

    let err = FarmerProfileService::export(&db.pool, &reader, &FarmerProfileFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FarmerProfileError::Privilege(PrivilegeError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_delete_counts_only_existing_rows() {
    let db = setup_db().await;
    let admin = super_admin(&db).await;
    let a = FarmerProfileService::create(&db.pool, &admin, &farmer("FR-A"))
        .await
        .unwrap();
    let b = FarmerProfileService::create(&db.pool, &admin, &farmer("FR-B"))
        .await
        .unwrap();

    let result = FarmerProfileService::delete(
        &db.pool,
        &admin,
        &DeleteRequest {
            ids: vec![a.id, Uuid::new_v4(), b.id],
        },
    )
    .await
    .unwrap();
    assert_eq!(result.deleted, 2);

    let empty = FarmerProfileService::delete(&db.pool, &admin, &DeleteRequest { ids: vec![] })
        .await
        .unwrap_err();
    assert!(matches!(empty, FarmerProfileError::Validation(_)));
}

#[tokio::test]
async fn test_tokenized_delete_round_trip() {
    let db = setup_db().await;
    let admin = super_admin(&db).await;
    let tokenizer = Tokenizer::new("test-secret");
    let profile = FarmerProfileService::create(&db.pool, &admin, &farmer("FR-T"))
        .await
        .unwrap();

    let envelope = tokenizer.sign(&json!({ "ids": [profile.id] })).unwrap();
    let request: DeleteRequest = tokenizer.verify_as(&envelope).unwrap();
    let result = FarmerProfileService::delete(&db.pool, &admin, &request)
        .await
        .unwrap();
    assert_eq!(result.deleted, 1);
}

#[tokio::test]
async fn test_crop_production_requires_existing_farmer() {
    let db = setup_db().await;
    let admin = super_admin(&db).await;
    let missing = Uuid::new_v4();

    let err = CropProductionService::create(
        &db.pool,
        &admin,
        &CreateCropProduction {
            farmer_profile_id: missing,
            crop_name: "Rice".to_string(),
            year: 2024,
            month: 2,
            planted_area: 2.0,
            production: 12345.67,
            district: "Baucau".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CropProductionError::InvalidReference(id) if id == missing));

    let farmer = FarmerProfileService::create(&db.pool, &admin, &farmer("FR-C"))
        .await
        .unwrap();
    let record = CropProductionService::create(
        &db.pool,
        &admin,
        &CreateCropProduction {
            farmer_profile_id: farmer.id,
            crop_name: "Rice".to_string(),
            year: 2024,
            month: 2,
            planted_area: 2.0,
            production: 12345.67,
            district: "Baucau".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(record.production, 12345.67);

    let rows = CropProductionService::list(
        &db.pool,
        &admin,
        &ListRequest {
            filter: CropProductionFilter {
                farmer_profile_id: Some(farmer.id),
                ..Default::default()
            },
            page: Pagination::default(),
        },
    )
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].farmer_registration_number, "FR-C");
}

#[tokio::test]
async fn test_livestock_import_and_export() {
    let db = setup_db().await;
    let admin = super_admin(&db).await;

    let err = LivestockPriceService::import(
        &db.pool,
        &admin,
        &ImportLivestockRetailPrices { details: vec![] },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LivestockPriceError::Validation(_)));

    let bad_row = CreateLivestockRetailPrice {
        unit: " ".to_string(),
        ..price("Goat", 2)
    };
    let err = LivestockPriceService::import(
        &db.pool,
        &admin,
        &ImportLivestockRetailPrices {
            details: vec![price("Cattle", 1), bad_row],
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Row 2: Unit is required");
    assert_eq!(
        LivestockPriceService::count(&db.pool, &admin, &LivestockRetailPriceFilter::default())
            .await
            .unwrap(),
        0
    );

    let result = LivestockPriceService::import(
        &db.pool,
        &admin,
        &ImportLivestockRetailPrices {
            details: vec![price("Cattle", 1), price("Goat", 2), price("Pig", 3)],
        },
    )
    .await
    .unwrap();
    assert_eq!(result.imported, 3);

    let file = LivestockPriceService::export(
        &db.pool,
        &admin,
        &LivestockRetailPriceFilter {
            livestock: Some("Goat".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(file.filename.starts_with("livestock_retail_prices_"));
    let bytes = STANDARD.decode(&file.content_base64).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[tokio::test]
async fn test_farmer_update_clears_optional_fields() {
    let db = setup_db().await;
    let admin = super_admin(&db).await;
    let profile = FarmerProfileService::create(
        &db.pool,
        &admin,
        &CreateFarmerProfile {
            identity_number: Some("ID-9".to_string()),
            phone: Some("7700".to_string()),
            ..farmer("FR-50")
        },
    )
    .await
    .unwrap();

    let updated = FarmerProfileService::update(
        &db.pool,
        &admin,
        &UpdateRequest {
            id: profile.id,
            changes: UpdateFarmerProfile {
                identity_number: Some(Some("".to_string())),
                phone: Some(None),
                ..Default::default()
            },
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.identity_number, None);
    assert_eq!(updated.phone, None);
    assert_eq!(updated.name, "Maria Soares");
}

#[tokio::test]
async fn test_company_duplicate_registration_number() {
    let db = setup_db().await;
    let admin = super_admin(&db).await;

    CompanyProfileService::create(&db.pool, &admin, &company("CO-1"))
        .await
        .unwrap();
    let err = CompanyProfileService::create(&db.pool, &admin, &company(" CO-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, CompanyProfileError::Duplicate(ref n) if n == "CO-1"));
    assert_eq!(
        err.to_string(),
        "Company with registration number CO-1 already exists"
    );
}

#[tokio::test]
async fn test_company_update_and_clear() {
    let db = setup_db().await;
    let admin = super_admin(&db).await;
    CompanyProfileService::create(&db.pool, &admin, &company("CO-1"))
        .await
        .unwrap();
    let second = CompanyProfileService::create(&db.pool, &admin, &company("CO-2"))
        .await
        .unwrap();

    let err = CompanyProfileService::update(
        &db.pool,
        &admin,
        &UpdateRequest {
            id: second.id,
            changes: UpdateCompanyProfile {
                registration_number: Some("CO-1".to_string()),
                ..Default::default()
            },
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CompanyProfileError::Duplicate(_)));

    let updated = CompanyProfileService::update(
        &db.pool,
        &admin,
        &UpdateRequest {
            id: second.id,
            changes: UpdateCompanyProfile {
                company_name: Some("Cooperativa Baucau".to_string()),
                contact_person: Some(None),
                ..Default::default()
            },
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.company_name, "Cooperativa Baucau");
    assert_eq!(updated.contact_person, None);
    assert_eq!(updated.address.as_deref(), Some("Rua de Ermera"));

    let err = CompanyProfileService::update(
        &db.pool,
        &admin,
        &UpdateRequest {
            id: Uuid::new_v4(),
            changes: UpdateCompanyProfile::default(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CompanyProfileError::NotFound));
}

#[tokio::test]
async fn test_company_delete_export_and_audit() {
    let db = setup_db().await;
    let admin = super_admin(&db).await;
    let exporter = officer_with(&db, "exporter", &["company_profile:read"]).await;
    let first = CompanyProfileService::create(&db.pool, &admin, &company("CO-1"))
        .await
        .unwrap();
    CompanyProfileService::create(&db.pool, &admin, &company("CO-2"))
        .await
        .unwrap();

    let err = CompanyProfileService::export(&db.pool, &exporter, &CompanyProfileFilter::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Forbidden: missing privilege company_profile:export"
    );

    let result = CompanyProfileService::delete(
        &db.pool,
        &admin,
        &DeleteRequest {
            ids: vec![first.id, Uuid::new_v4()],
        },
    )
    .await
    .unwrap();
    assert_eq!(result.deleted, 1);
    assert_eq!(
        CompanyProfileService::count(&db.pool, &exporter, &CompanyProfileFilter::default())
            .await
            .unwrap(),
        1
    );

    let file = CompanyProfileService::export(&db.pool, &admin, &CompanyProfileFilter::default())
        .await
        .unwrap();
    assert!(file.filename.starts_with("company_profiles_"));
    let bytes = STANDARD.decode(&file.content_base64).unwrap();
    assert_eq!(&bytes[..2], b"PK");

    let audit = ActivityLogService::count(
        &db.pool,
        &admin,
        &ActivityLogFilter {
            search: Some("company profile".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    // two creates, one delete, one export
    assert_eq!(audit, 4);
}
