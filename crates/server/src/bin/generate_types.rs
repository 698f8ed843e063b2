use std::{env, fs, path::Path};

use ts_rs::TS;

fn generate_types_content() -> String {
    let decls = [
        utils::response::ApiResponse::<()>::decl(),
        db::models::pagination::Pagination::decl(),
        db::models::user::RegisterType::decl(),
        db::models::user::UserStatus::decl(),
        db::models::user::User::decl(),
        db::models::user::UserFilter::decl(),
        db::models::user::UpdateUser::decl(),
        db::models::user_role::UserRoleView::decl(),
        db::models::user_role::CreateUserRole::decl(),
        db::models::user_role::UpdateUserRole::decl(),
        db::models::activity_log::ActivityLog::decl(),
        db::models::activity_log::ActivityLogFilter::decl(),
        db::models::farmer_profile::FarmerProfile::decl(),
        db::models::farmer_profile::FarmerProfileFilter::decl(),
        db::models::farmer_profile::CreateFarmerProfile::decl(),
        db::models::farmer_profile::UpdateFarmerProfile::decl(),
        db::models::company_profile::CompanyProfile::decl(),
        db::models::company_profile::CompanyProfileFilter::decl(),
        db::models::company_profile::CreateCompanyProfile::decl(),
        db::models::company_profile::UpdateCompanyProfile::decl(),
        db::models::crop_production::CropProduction::decl(),
        db::models::crop_production::CropProductionWithFarmer::decl(),
        db::models::crop_production::CropProductionFilter::decl(),
        db::models::crop_production::CreateCropProduction::decl(),
        db::models::crop_production::UpdateCropProduction::decl(),
        db::models::livestock_price::LivestockRetailPrice::decl(),
        db::models::livestock_price::LivestockRetailPriceFilter::decl(),
        db::models::livestock_price::CreateLivestockRetailPrice::decl(),
        db::models::livestock_price::UpdateLivestockRetailPrice::decl(),
        services::services::session::SessionUser::decl(),
        services::services::session::LoginRequest::decl(),
        services::services::session::LoginResponse::decl(),
        services::services::request::DeleteRequest::decl(),
        services::services::request::DeleteResult::decl(),
        services::services::request::CountResult::decl(),
        services::services::export::ExportFile::decl(),
        services::services::livestock_price::ImportLivestockRetailPrices::decl(),
        services::services::livestock_price::ImportResult::decl(),
        services::services::user_management::CreateUserRequest::decl(),
        services::services::user_management::ResetPasswordRequest::decl(),
        services::services::user_management::ResetPasswordResult::decl(),
        services::services::database_validator::SchemaReport::decl(),
        server::routes::TokenizedRequest::decl(),
        server::routes::health::HealthStatus::decl(),
        server::routes::users::NewPassword::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|d| {
            let trimmed = d.trim_start();
            if trimmed.starts_with("export") {
                d
            } else {
                format!("export {trimmed}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "// This file was generated by `generate_types`. Do not edit it by hand.\n\n{body}\n"
    )
}

fn main() {
    let check_mode = env::args().any(|arg| arg == "--check");
    let shared_path = Path::new("shared");
    let types_path = shared_path.join("types.ts");
    let generated = generate_types_content();

    if check_mode {
        let current = fs::read_to_string(&types_path).unwrap_or_default();
        if current == generated {
            println!("✅ shared/types.ts is up to date.");
            std::process::exit(0);
        }
        eprintln!("❌ shared/types.ts is not up to date. Run `cargo run --bin generate_types`.");
        std::process::exit(1);
    }

    fs::create_dir_all(shared_path).expect("cannot create shared");
    fs::write(&types_path, generated).expect("unable to write types.ts");
    println!("✅ TypeScript types written to {}", types_path.display());
}
