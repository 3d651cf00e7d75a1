use anyhow::{Context, Result, anyhow};
use backoffice::{
    config::ConfigLoader,
    db,
    models::user::{self, UserRole},
    repositories::UserRepository,
    session::SessionContext,
    telemetry,
};
use clap::Parser;
use sea_orm::Set;

/// Creates the first, already validated, admin user.
#[derive(Debug, Parser)]
#[command(name = "seed-admin")]
struct Args {
    #[arg(long, env = "BACKOFFICE_ADMIN_EMAIL")]
    email: String,
    #[arg(long, env = "BACKOFFICE_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long, default_value = "Admin")]
    name: String,
    #[arg(long, default_value = "Backoffice")]
    surname: String,
    /// National document number
    #[arg(long)]
    identifier: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new().load().context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing tracing")?;

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;
    db::run_migrations(&db).await?;

    let users = UserRepository::new(&db);
    let email = args.email.trim().to_lowercase();
    if let Some(existing) = users.find_by_email(&email).await? {
        tracing::info!(user_id = %existing.external_id, "admin already present, nothing to do");
        return Ok(());
    }

    let cost = config.password_hash_cost;
    let password = args.password;
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("password hashing task")?
        .context("hashing password")?;

    let candidate = user::ActiveModel {
        name: Set(args.name.trim().to_string()),
        surname: Set(args.surname.trim().to_string()),
        full_name: Set(format!("{} {}", args.name.trim(), args.surname.trim())),
        phone: Set(None),
        identifier: Set(args.identifier.trim().to_string()),
        role: Set(UserRole::Admin),
        email: Set(email),
        password: Set(hash),
        is_active: Set(true),
        verification_code: Set(None),
        code_created_at: Set(None),
        company_id: Set(None),
        ..Default::default()
    };

    let admin = users
        .create_new_user(&SessionContext::anonymous(), candidate)
        .await
        .map_err(|e| anyhow!("creating admin: {e}"))?;

    tracing::info!(user_id = %admin.external_id, "admin created");
    Ok(())
}
