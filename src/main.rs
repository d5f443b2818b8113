use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod dashboard;
mod db;
mod flags;
mod models;
mod report;
mod rollup;

use crate::flags::FlagThresholds;
use crate::models::{ApplicationStatus, Role};
use crate::rollup::{DateWindow, Period};

#[derive(Parser)]
#[command(name = "agency-activity-tracker")]
#[command(about = "Sales activity tracker for insurance agencies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Create a manager profile
    ProvisionManager {
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        agency: Option<String>,
    },
    /// Create an agent profile, optionally attached to a manager
    #[command(group(
        ArgGroup::new("attach")
            .args(["manager_email", "code"])
            .multiple(false)
    ))]
    SignupAgent {
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        manager_email: Option<String>,
        #[arg(long)]
        code: Option<String>,
    },
    /// Print a manager's shareable signup link
    SignupLink {
        #[arg(long)]
        manager_email: String,
        #[arg(long, default_value = "https://tracker.example.com")]
        base_url: String,
    },
    /// Attach an existing agent to a manager via a signup code
    LinkAgent {
        #[arg(long)]
        agent_email: String,
        #[arg(long)]
        code: String,
    },
    /// Detach an agent from their manager
    UnlinkAgent {
        #[arg(long)]
        agent_email: String,
    },
    /// Record or replace an agent's activity for a day
    LogActivity {
        #[arg(long)]
        agent_email: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(i32).range(0..))]
        dials: i32,
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(i32).range(0..))]
        pickups: i32,
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(i32).range(0..))]
        quotes: i32,
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(i32).range(0..))]
        talk_hours: i32,
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(i32).range(0..))]
        talk_minutes: i32,
    },
    /// Record a sale and roll it into the day's activity
    RecordSale {
        #[arg(long)]
        agent_email: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        carrier: String,
        #[arg(long)]
        premium: Decimal,
        #[arg(long, default_value = "pending")]
        status: ApplicationStatus,
    },
    /// Edit a recorded sale
    EditSale {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        carrier: Option<String>,
        #[arg(long)]
        premium: Option<Decimal>,
        #[arg(long)]
        status: Option<ApplicationStatus>,
    },
    /// Delete a recorded sale
    DeleteSale {
        #[arg(long)]
        id: Uuid,
    },
    /// List an agent's recent sales
    ListSales {
        #[arg(long)]
        agent_email: String,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Update a profile's name or agency
    UpdateProfile {
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        agency: Option<String>,
    },
    /// Show an agent's own dashboard
    AgentDashboard {
        #[arg(long)]
        email: String,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Show a manager's team dashboard
    TeamDashboard {
        #[arg(long)]
        manager_email: String,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long, default_value_t = 50)]
        low_dials: i64,
        #[arg(long, default_value_t = 3)]
        inactive_days: i64,
        #[arg(long)]
        json: bool,
    },
    /// Show one agent's month-over-month detail
    AgentDetail {
        #[arg(long)]
        email: String,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Show the platform-wide roster
    AdminOverview {
        #[arg(long)]
        json: bool,
    },
    /// Import activity logs from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Generate a markdown report for a manager's team
    Report {
        #[arg(long)]
        manager_email: String,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long, default_value_t = 50)]
        low_dials: i64,
        #[arg(long, default_value_t = 3)]
        inactive_days: i64,
        #[arg(long, default_value = "team-report.md")]
        out: PathBuf,
    },
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let max_connections = std::env::var("PGPOOL_MAX_CONNECTIONS")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .unwrap_or(5);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    if let Err(err) = run(cli.command, &pool).await {
        if let Some(store_err) = err.downcast_ref::<db::StoreError>() {
            eprintln!("error: {store_err}");
            std::process::exit(1);
        }
        return Err(err);
    }

    Ok(())
}

async fn run(command: Commands, pool: &PgPool) -> anyhow::Result<()> {
    match command {
        Commands::InitDb => {
            db::init_db(pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(pool).await?;
            println!("Seed data inserted.");
        }
        Commands::ProvisionManager {
            email,
            full_name,
            agency,
        } => {
            let manager = db::create_manager(pool, &email, &full_name, agency.as_deref()).await?;
            println!(
                "Provisioned manager {} <{}>.",
                manager.full_name, manager.email
            );
        }
        Commands::SignupAgent {
            email,
            full_name,
            manager_email,
            code,
        } => {
            let (manager_id, used_code) = match (manager_email.as_deref(), code.as_deref()) {
                (Some(manager_email), _) => {
                    let manager = db::fetch_profile_by_email(pool, manager_email).await?;
                    db::expect_role(&manager, Role::Manager)?;
                    (Some(manager.id), None)
                }
                (None, Some(code)) => {
                    let resolved = db::resolve_code(pool, code).await?;
                    (Some(resolved.manager_id), Some(resolved.code))
                }
                (None, None) => (None, None),
            };

            let agent =
                db::create_agent(pool, &email, &full_name, manager_id, used_code.as_deref())
                    .await?;
            match manager_id {
                Some(id) => {
                    let manager = db::fetch_profile_by_id(pool, id).await?;
                    println!(
                        "Signed up agent {} <{}> under {}.",
                        agent.full_name, agent.email, manager.full_name
                    );
                }
                None => println!(
                    "Signed up independent agent {} <{}>.",
                    agent.full_name, agent.email
                ),
            }
        }
        Commands::SignupLink {
            manager_email,
            base_url,
        } => {
            let manager = db::fetch_profile_by_email(pool, &manager_email).await?;
            db::expect_role(&manager, Role::Manager)?;
            let code = db::ensure_signup_code(pool, manager.id).await?;
            println!("{}", db::signup_url(&base_url, &code.code));
        }
        Commands::LinkAgent { agent_email, code } => {
            let agent = db::fetch_profile_by_email(pool, &agent_email).await?;
            db::expect_role(&agent, Role::Agent)?;
            let resolved = db::resolve_code(pool, &code).await?;
            let manager = db::fetch_profile_by_id(pool, resolved.manager_id).await?;
            db::link_agent(pool, agent.id, resolved.manager_id, &resolved.code).await?;
            println!("Linked {} to {}.", agent.full_name, manager.full_name);
        }
        Commands::UnlinkAgent { agent_email } => {
            let agent = db::fetch_profile_by_email(pool, &agent_email).await?;
            db::expect_role(&agent, Role::Agent)?;
            db::unlink_agent(pool, agent.id).await?;
            println!("Unlinked {}. The agent is now independent.", agent.full_name);
        }
        Commands::LogActivity {
            agent_email,
            date,
            dials,
            pickups,
            quotes,
            talk_hours,
            talk_minutes,
        } => {
            let agent = db::fetch_profile_by_email(pool, &agent_email).await?;
            db::expect_role(&agent, Role::Agent)?;
            let log_date = date.unwrap_or_else(today);
            let talk_time = talk_hours * 60 + talk_minutes;

            let log =
                db::upsert_activity(pool, agent.id, log_date, dials, pickups, quotes, talk_time)
                    .await?;
            println!(
                "Logged {} for {}: {} dials, {} pickups, {} quotes, {} min talk time.",
                log.log_date, agent.full_name, log.dials, log.pickups, log.quotes,
                log.talk_time_minutes
            );
        }
        Commands::RecordSale {
            agent_email,
            date,
            client,
            carrier,
            premium,
            status,
        } => {
            let agent = db::fetch_profile_by_email(pool, &agent_email).await?;
            db::expect_role(&agent, Role::Agent)?;
            let app_date = date.unwrap_or_else(today);

            let id = db::record_sale(
                pool,
                agent.id,
                app_date,
                client.as_deref(),
                &carrier,
                premium,
                status,
            )
            .await?;
            println!("Recorded sale {id} for {} on {app_date}.", agent.full_name);
        }
        Commands::EditSale {
            id,
            date,
            client,
            carrier,
            premium,
            status,
        } => {
            let app = db::edit_sale(
                pool,
                id,
                date,
                client.as_deref(),
                carrier.as_deref(),
                premium,
                status,
            )
            .await?;
            println!(
                "Updated sale {}: {} ${:.2} ({}).",
                app.id,
                app.carrier.as_deref().unwrap_or("(no carrier)"),
                app.annualized_premium,
                app.status
            );
        }
        Commands::DeleteSale { id } => {
            db::delete_sale(pool, id).await?;
            println!("Deleted sale {id}.");
        }
        Commands::ListSales { agent_email, limit } => {
            let agent = db::fetch_profile_by_email(pool, &agent_email).await?;
            db::expect_role(&agent, Role::Agent)?;
            let apps = db::fetch_applications(pool, agent.id, limit).await?;

            if apps.is_empty() {
                println!("No applications recorded for {}.", agent.full_name);
                return Ok(());
            }
            for app in apps.iter() {
                println!(
                    "{} | {} | {} | {} | ${:.2} | {}",
                    app.id,
                    app.app_date,
                    app.client_name.as_deref().unwrap_or("(no client name)"),
                    app.carrier.as_deref().unwrap_or("(no carrier)"),
                    app.annualized_premium,
                    app.status
                );
            }
        }
        Commands::UpdateProfile {
            email,
            full_name,
            agency,
        } => {
            let profile =
                db::update_profile(pool, &email, full_name.as_deref(), agency.as_deref()).await?;
            println!("Updated profile for {} <{}>.", profile.full_name, profile.email);
        }
        Commands::AgentDashboard { email, as_of, json } => {
            let agent = db::fetch_profile_by_email(pool, &email).await?;
            db::expect_role(&agent, Role::Agent)?;
            let as_of = as_of.unwrap_or_else(today);

            // The week can hang over a month edge, so fetch the union of both.
            let week = Period::ThisWeek.window(as_of);
            let month = Period::ThisMonth.window(as_of);
            let span = DateWindow {
                start: week.start.min(month.start),
                end: week.end.max(month.end),
            };
            let logs = db::fetch_logs_between(pool, agent.id, &span).await?;
            let dashboard = dashboard::build_agent_dashboard(&agent, &logs, as_of);

            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            } else {
                print!("{}", report::render_agent_dashboard(&dashboard));
            }
        }
        Commands::TeamDashboard {
            manager_email,
            as_of,
            low_dials,
            inactive_days,
            json,
        } => {
            let manager = db::fetch_profile_by_email(pool, &manager_email).await?;
            db::expect_role(&manager, Role::Manager)?;
            let as_of = as_of.unwrap_or_else(today);
            let thresholds = FlagThresholds {
                low_dials,
                inactive_days,
            };

            let agents = db::fetch_agents_of_manager(pool, manager.id).await?;
            let agent_ids: Vec<Uuid> = agents.iter().map(|agent| agent.id).collect();
            let window = Period::ThisMonth.window(as_of);
            let logs = db::fetch_team_logs(pool, &agent_ids, &window).await?;
            let last_activity = db::fetch_last_activity_map(pool, &agent_ids).await?;

            let dashboard = dashboard::build_team_dashboard(
                &manager,
                &agents,
                &logs,
                &last_activity,
                as_of,
                &thresholds,
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            } else {
                print!("{}", report::render_team_dashboard(&dashboard));
            }
        }
        Commands::AgentDetail { email, as_of, json } => {
            let agent = db::fetch_profile_by_email(pool, &email).await?;
            db::expect_role(&agent, Role::Agent)?;
            let as_of = as_of.unwrap_or_else(today);

            let span = DateWindow {
                start: Period::LastMonth.window(as_of).start,
                end: Period::ThisMonth.window(as_of).end,
            };
            let logs = db::fetch_logs_between(pool, agent.id, &span).await?;
            let apps = db::fetch_applications(pool, agent.id, 10).await?;
            let detail = dashboard::build_agent_detail(&agent, &logs, apps, as_of);

            if json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                print!("{}", report::render_agent_detail(&detail));
            }
        }
        Commands::AdminOverview { json } => {
            let managers = db::fetch_profiles_by_role(pool, Role::Manager).await?;
            let agents = db::fetch_profiles_by_role(pool, Role::Agent).await?;
            let overview = dashboard::build_admin_overview(&managers, &agents);

            if json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            } else {
                print!("{}", report::render_admin_overview(&overview));
            }
        }
        Commands::Import { csv } => {
            let imported = db::import_activity_csv(pool, &csv).await?;
            println!("Imported {imported} activity rows from {}.", csv.display());
        }
        Commands::Report {
            manager_email,
            as_of,
            low_dials,
            inactive_days,
            out,
        } => {
            let manager = db::fetch_profile_by_email(pool, &manager_email).await?;
            db::expect_role(&manager, Role::Manager)?;
            let as_of = as_of.unwrap_or_else(today);
            let thresholds = FlagThresholds {
                low_dials,
                inactive_days,
            };

            let agents = db::fetch_agents_of_manager(pool, manager.id).await?;
            let agent_ids: Vec<Uuid> = agents.iter().map(|agent| agent.id).collect();
            let window = Period::ThisMonth.window(as_of);
            let logs = db::fetch_team_logs(pool, &agent_ids, &window).await?;
            let last_activity = db::fetch_last_activity_map(pool, &agent_ids).await?;

            let dashboard = dashboard::build_team_dashboard(
                &manager,
                &agents,
                &logs,
                &last_activity,
                as_of,
                &thresholds,
            );
            let report = report::build_team_report(&dashboard);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
