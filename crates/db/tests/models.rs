use chrono::NaiveDate;
use db::{
    DBService,
    models::{
        activity_log::{ActivityLog, ActivityLogFilter},
        crop_production::{CreateCropProduction, CropProduction, CropProductionFilter},
        farmer_profile::{CreateFarmerProfile, FarmerProfile, FarmerProfileFilter, UpdateFarmerProfile},
        livestock_price::{
            CreateLivestockRetailPrice, LivestockRetailPrice, LivestockRetailPriceFilter,
        },
        pagination::NO_LIMIT,
        user::{NewUser, RegisterType, User, UserStatus, UpdateUser},
        user_role::{CreateUserRole, UserRole},
        user_session::UserSession,
    },
};
use uuid::Uuid;

fn farmer(registration_number: &str, name: &str, district: &str) -> CreateFarmerProfile {
    CreateFarmerProfile {
        registration_number: registration_number.to_string(),
        name: name.to_string(),
        identity_number: None,
        address: None,
        district: district.to_string(),
        phone: Some("+670 7700 0000".to_string()),
    }
}

#[tokio::test]
async fn test_farmer_profile_filter_and_count() {
    let db = DBService::new_in_memory().await.unwrap();
    FarmerProfile::create(&db.pool, &farmer("FR-001", "Maria Soares", "Baucau"), Uuid::new_v4())
        .await
        .unwrap();
    FarmerProfile::create(&db.pool, &farmer("FR-002", "Joao Pereira", "Baucau"), Uuid::new_v4())
        .await
        .unwrap();
    FarmerProfile::create(&db.pool, &farmer("FR-003", "Ana Belo", "Ermera"), Uuid::new_v4())
        .await
        .unwrap();

    let baucau = FarmerProfileFilter {
        district: Some("Baucau".to_string()),
        ..Default::default()
    };
    assert_eq!(FarmerProfile::count_filtered(&db.pool, &baucau).await.unwrap(), 2);

    let search = FarmerProfileFilter {
        search: Some("FR-003".to_string()),
        ..Default::default()
    };
    let found = FarmerProfile::find_filtered(&db.pool, &search, NO_LIMIT, 0)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Ana Belo");

    let page = FarmerProfile::find_filtered(&db.pool, &FarmerProfileFilter::default(), 2, 2)
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn test_registration_number_is_unique() {
    let db = DBService::new_in_memory().await.unwrap();
    FarmerProfile::create(&db.pool, &farmer("FR-001", "Maria", "Baucau"), Uuid::new_v4())
        .await
        .unwrap();
    let duplicate =
        FarmerProfile::create(&db.pool, &farmer("FR-001", "Other", "Dili"), Uuid::new_v4()).await;
    assert!(duplicate.is_err());
}

#[tokio::test]
async fn test_farmer_profile_partial_update_keeps_other_fields() {
    let db = DBService::new_in_memory().await.unwrap();
    let created = FarmerProfile::create(&db.pool, &farmer("FR-001", "Maria", "Baucau"), Uuid::new_v4())
        .await
        .unwrap();

    let updated = FarmerProfile::update(
        &db.pool,
        created.id,
        &UpdateFarmerProfile {
            district: Some("Lautem".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(updated.district, "Lautem");
    assert_eq!(updated.name, "Maria");
    assert_eq!(updated.phone, created.phone);

    let cleared = FarmerProfile::update(
        &db.pool,
        created.id,
        &UpdateFarmerProfile {
            phone: Some(None),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(cleared.phone, None);
    assert_eq!(cleared.district, "Lautem");

    let missing = FarmerProfile::update(&db.pool, Uuid::new_v4(), &UpdateFarmerProfile::default())
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_crop_production_joins_farmer() {
    let db = DBService::new_in_memory().await.unwrap();
    let owner = FarmerProfile::create(&db.pool, &farmer("FR-010", "Maria", "Baucau"), Uuid::new_v4())
        .await
        .unwrap();

    for (crop, month, production) in [("Rice", 3, 12345.67), ("Maize", 4, 210.5)] {
        CropProduction::create(
            &db.pool,
            &CreateCropProduction {
                farmer_profile_id: owner.id,
                crop_name: crop.to_string(),
                year: 2024,
                month,
                planted_area: 1.5,
                production,
                district: "Baucau".to_string(),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
    }

    let rice = CropProductionFilter {
        crop_name: Some("Rice".to_string()),
        year: Some(2024),
        ..Default::default()
    };
    let rows = CropProduction::find_filtered(&db.pool, &rice, NO_LIMIT, 0)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].farmer_name, "Maria");
    assert_eq!(rows[0].farmer_registration_number, "FR-010");
    assert_eq!(rows[0].production, 12345.67);

    let all = CropProductionFilter {
        farmer_profile_id: Some(owner.id),
        ..Default::default()
    };
    assert_eq!(CropProduction::count_filtered(&db.pool, &all).await.unwrap(), 2);

    // Deleting the farmer cascades to its production records
    FarmerProfile::delete(&db.pool, owner.id).await.unwrap();
    assert_eq!(CropProduction::count_filtered(&db.pool, &all).await.unwrap(), 0);
}

#[tokio::test]
async fn test_livestock_price_date_range() {
    let db = DBService::new_in_memory().await.unwrap();
    for day in [1, 15, 28] {
        LivestockRetailPrice::create(
            &db.pool,
            &CreateLivestockRetailPrice {
                livestock: "Cattle".to_string(),
                unit: "kg".to_string(),
                price: 4.25,
                market: Some("Mercado Taibessi".to_string()),
                district: "Dili".to_string(),
                price_date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
    }

    let filter = LivestockRetailPriceFilter {
        from_date: NaiveDate::from_ymd_opt(2024, 2, 10),
        to_date: NaiveDate::from_ymd_opt(2024, 2, 28),
        ..Default::default()
    };
    let rows = LivestockRetailPrice::find_filtered(&db.pool, &filter, NO_LIMIT, 0)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].price_date, NaiveDate::from_ymd_opt(2024, 2, 28).unwrap());
}

#[tokio::test]
async fn test_paging_is_stable_for_rows_created_together() {
    let db = DBService::new_in_memory().await.unwrap();
    let mut tx = db.pool.begin().await.unwrap();
    let mut inserted = Vec::new();
    for price in [1.0, 2.0, 3.0, 4.0, 5.0] {
        let row = LivestockRetailPrice::create(
            &mut *tx,
            &CreateLivestockRetailPrice {
                livestock: "Pig".to_string(),
                unit: "head".to_string(),
                price,
                market: None,
                district: "Aileu".to_string(),
                price_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        inserted.push(row.id);
    }
    tx.commit().await.unwrap();

    let filter = LivestockRetailPriceFilter::default();
    let mut paged = Vec::new();
    for offset in [0, 2, 4] {
        let page = LivestockRetailPrice::find_filtered(&db.pool, &filter, 2, offset)
            .await
            .unwrap();
        paged.extend(page.into_iter().map(|row| row.id));
    }

    inserted.reverse();
    assert_eq!(paged, inserted);
}

#[tokio::test]
async fn test_user_role_and_session_lifecycle() {
    let db = DBService::new_in_memory().await.unwrap();
    let role = UserRole::create(
        &db.pool,
        &CreateUserRole {
            name: "data-entry".to_string(),
            privileges: vec!["farmer_profile:read".to_string(), "farmer_profile:write".to_string()],
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap();
    assert!(role.has_privilege("farmer_profile:write"));
    assert!(!role.has_privilege("user:write"));

    let user = User::create(
        &db.pool,
        &NewUser {
            user_id: "officer1".to_string(),
            employee_id: Some("EMP-9".to_string()),
            register_type: RegisterType::Officer,
            role_id: Some(role.id),
            password_hash: "hash".to_string(),
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap();
    assert!(user.is_active());

    let deactivated = User::update(
        &db.pool,
        user.id,
        &UpdateUser {
            status: Some(UserStatus::Inactive),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(deactivated.status, UserStatus::Inactive);
    assert_eq!(deactivated.role_id, Some(role.id));

    let session = UserSession::create(&db.pool, user.id, "token-1").await.unwrap();
    assert!(!session.is_logged_out());
    UserSession::mark_logged_out(&db.pool, session.id).await.unwrap();
    let reloaded = UserSession::find_by_token(&db.pool, "token-1")
        .await
        .unwrap()
        .unwrap();
    assert!(reloaded.is_logged_out());
}

#[tokio::test]
async fn test_activity_log_filter_by_user() {
    let db = DBService::new_in_memory().await.unwrap();
    let user = User::create(
        &db.pool,
        &NewUser {
            user_id: "admin".to_string(),
            employee_id: None,
            register_type: RegisterType::SuperAdmin,
            role_id: None,
            password_hash: "hash".to_string(),
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap();

    ActivityLog::create(&db.pool, Some(user.id), "Created farmer profile FR-001")
        .await
        .unwrap();
    ActivityLog::create(&db.pool, None, "Bootstrap").await.unwrap();

    let filter = ActivityLogFilter {
        user_uuid: Some(user.id),
        ..Default::default()
    };
    let logs = ActivityLog::find_filtered(&db.pool, &filter, 10, 0).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].activity, "Created farmer profile FR-001");
    assert_eq!(
        ActivityLog::count_filtered(&db.pool, &ActivityLogFilter::default())
            .await
            .unwrap(),
        2
    );
}
