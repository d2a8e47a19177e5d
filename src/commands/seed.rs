//! Seed command - Bootstrap the initial MASTER account.
//!
//! Creating a MASTER is deliberately impossible through the HTTP API;
//! this command is the only path. It refuses to run if the email or
//! username is already taken, and leaves a system entry in the trail.

use crate::cli::args::SeedArgs;
use crate::config::Config;
use crate::domain::audit::actions;
use crate::domain::{AuditEvent, Password, RequestContext};
use crate::errors::{AppError, AppResult};
use crate::infra::{AuditLogRepository, AuditLogStore, Database, UserRepository, UserStore};

/// Execute the seed command
pub async fn execute(args: SeedArgs, config: Config) -> AppResult<()> {
    tracing::info!("Seeding MASTER account...");

    let db = Database::connect_without_migrations(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;

    let users = UserStore::new(db.get_connection());

    if users.find_by_email(&args.email).await?.is_some() {
        return Err(AppError::conflict("email"));
    }
    if users.find_by_username(&args.username).await?.is_some() {
        return Err(AppError::conflict("username"));
    }

    let password = Password::new(&args.password)?;
    let master = users
        .create_master(
            args.email.clone(),
            args.username.clone(),
            password.into_string(),
            args.name.clone(),
        )
        .await?;

    let trail = AuditLogStore::new(db.get_connection());
    let event = AuditEvent::system_action(
        actions::SEED_MASTER,
        "cli::seed".to_string(),
        None,
        format!("Seeded MASTER account {}", master.email),
        Some(serde_json::json!({
            "user_id": master.id,
            "email": master.email,
            "username": master.username,
        })),
    );
    trail.insert(event, RequestContext::system()).await?;

    println!("MASTER account created: {} ({})", master.email, master.id);
    Ok(())
}
