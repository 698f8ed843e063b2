#![allow(dead_code)]

use db::{
    DBService,
    models::{
        user::{NewUser, RegisterType},
        user_role::{CreateUserRole, UserRole},
    },
};
use services::services::{
    password::hash_password,
    session::{LoginRequest, SessionService, SessionUser},
};
use uuid::Uuid;

pub const PASSWORD: &str = "correct horse battery";

pub async fn setup_db() -> DBService {
    DBService::new_in_memory()
        .await
        .expect("in-memory database")
}

pub async fn create_user(
    db: &DBService,
    user_id: &str,
    register_type: RegisterType,
    role_id: Option<Uuid>,
) -> SessionUser {
    let new_user = NewUser {
        user_id: user_id.to_string(),
        employee_id: None,
        register_type,
        role_id,
        password_hash: hash_password(PASSWORD).unwrap(),
    };
    let user = db::models::user::User::create(&db.pool, &new_user, Uuid::new_v4())
        .await
        .unwrap();
    SessionUser::from(&user)
}

pub async fn super_admin(db: &DBService) -> SessionUser {
    create_user(db, "admin", RegisterType::SuperAdmin, None).await
}

/// Officer whose role carries exactly `privileges`
pub async fn officer_with(db: &DBService, user_id: &str, privileges: &[&str]) -> SessionUser {
    let role = UserRole::create(
        &db.pool,
        &CreateUserRole {
            name: format!("{user_id}-role"),
            privileges: privileges.iter().map(|p| p.to_string()).collect(),
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap();
    create_user(db, user_id, RegisterType::Officer, Some(role.id)).await
}

pub async fn login(db: &DBService, user_id: &str) -> String {
    SessionService::login(
        &db.pool,
        &LoginRequest {
            user_id: user_id.to_string(),
            password: PASSWORD.to_string(),
        },
    )
    .await
    .unwrap()
    .token
}
