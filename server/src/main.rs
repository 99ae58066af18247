use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use entity::empleados::Sex;
use migration::{Migrator, MigratorTrait};
use platform_db::{
    DatabaseSettings, DbPool, connect,
    empleados::{self, NewEmpleado},
};
use platform_obs::{ObsConfig, init_tracing};
use tracing::info;

use nominas_server::{
    config::AppConfig,
    http::{self, AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "nominas-server", version, about = "Employee payroll REST service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server.
    Serve(ServeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Insert fixture employees (skips records that already exist).
    Seed,
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Allow starting even when migrations are pending")]
    allow_dirty: bool,
}

impl From<&ServeCommand> for ServeConfig {
    fn from(value: &ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(ObsConfig::default())?;
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(cmd) => run_server(cmd).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up().await,
            MigrateCommand::Down => migrate_down().await,
        },
        Command::Seed => run_seed().await,
    }
}

async fn setup_pool() -> Result<DbPool> {
    let settings = DatabaseSettings::from_env();
    connect(&settings).await.map_err(Into::into)
}

async fn run_server(cmd: ServeCommand) -> Result<()> {
    let config = Arc::new(AppConfig::load()?);
    let pool = setup_pool().await?;
    ensure_migrations(&pool, cmd.allow_dirty).await?;
    let state = AppState { pool, config };
    http::serve((&cmd).into(), state).await
}

async fn ensure_migrations(pool: &DbPool, allow_dirty: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(pool).await?;
    if !pending.is_empty() && !allow_dirty {
        anyhow::bail!(
            "pending migrations detected; run `nominas-server migrate up` or pass --allow-dirty"
        );
    }
    Ok(())
}

async fn migrate_up() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::up(&pool, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::down(&pool, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}

async fn run_seed() -> Result<()> {
    let pool = setup_pool().await?;
    for nuevo in fixture_empleados() {
        if empleados::find_by_national_id(&pool, &nuevo.national_id)
            .await?
            .is_some()
        {
            info!(national_id = %nuevo.national_id, "fixture already present");
            continue;
        }
        let creado = empleados::create(&pool, nuevo).await?;
        info!(national_id = %creado.national_id, name = %creado.name, "fixture employee created");
    }
    Ok(())
}

fn fixture_empleados() -> Vec<NewEmpleado> {
    vec![
        NewEmpleado {
            national_id: "11111111A".into(),
            name: "Ana García".into(),
            sex: Sex::Female,
            category: 2,
            years_of_service: 5,
            salary: 30_000,
        },
        NewEmpleado {
            national_id: "22222222B".into(),
            name: "Luis Pérez".into(),
            sex: Sex::Male,
            category: 1,
            years_of_service: 1,
            salary: 22_000,
        },
        NewEmpleado {
            national_id: "33333333C".into(),
            name: "Marta Ruiz".into(),
            sex: Sex::Female,
            category: 3,
            years_of_service: 12,
            salary: 41_000,
        },
    ]
}
