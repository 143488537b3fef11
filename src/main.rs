use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use dermatriage_lib::config::{self, AppConfig};
use dermatriage_lib::consultation::{ConsultationAssembler, ConsultationRequest};
use dermatriage_lib::db::repository::{
    collect_statistics, delete_consultation, get_condition, get_consultation,
    list_active_symptoms, list_conditions, list_consultations, resolve_symptom_names,
    seed_catalog, SqliteStore,
};
use dermatriage_lib::db::DatabaseError;
use dermatriage_lib::models::enums::{BodyZone, Severity};
use dermatriage_lib::models::{ConditionFilter, ConsultationQuery, ImageUpload, Requester};
use dermatriage_lib::narrative::NarrativeProvider;

#[derive(Parser)]
#[command(name = "dermatriage")]
#[command(about = "Dermatological symptom triage", version)]
struct Cli {
    /// Database file (overrides DERMATRIAGE_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate the reference catalog if the database is empty
    Seed,
    /// List active symptoms
    Symptoms {
        #[arg(long)]
        zone: Option<String>,
    },
    /// List active conditions
    Conditions {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        zone: Option<String>,
        #[arg(long)]
        severity: Option<String>,
    },
    /// Create a consultation from reported symptoms
    Consult {
        #[arg(long)]
        patient: String,
        #[arg(long)]
        zone: String,
        /// Symptom id; repeat for each reported symptom
        #[arg(long = "symptom")]
        symptoms: Vec<Uuid>,
        /// Photo of the affected area
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List your consultations, newest first
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one consultation
    Show { id: Uuid },
    /// Delete one consultation
    Delete { id: Uuid },
    /// Catalog and consultation figures
    Stats,
    /// AI description and treatment suggestion for a condition
    Advise { condition_id: Uuid },
}

#[derive(Serialize)]
struct Advice {
    condition: String,
    description: Option<String>,
    treatment: Option<String>,
}

fn parse_zone(raw: Option<String>) -> Result<Option<BodyZone>, DatabaseError> {
    raw.map(|z| BodyZone::from_str(&z.trim().to_lowercase())).transpose()
}

fn parse_severity(raw: Option<String>) -> Result<Option<Severity>, DatabaseError> {
    raw.map(|s| Severity::from_str(&s.trim().to_lowercase())).transpose()
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    dermatriage_lib::init_tracing();
    let app_config = AppConfig::from_env();
    tracing::debug!("{} v{}", config::APP_NAME, config::APP_VERSION);

    let db_path = cli.db.unwrap_or_else(|| app_config.database_path.clone());
    let store = SqliteStore::open(&db_path)?;
    let conn = store.connection();
    let requester = Requester::clinician(app_config.clinician_id);

    match cli.command {
        Commands::Seed => {
            let seeded = seed_catalog(conn)?;
            print_json(&serde_json::json!({ "seeded": seeded }))?;
        }
        Commands::Symptoms { zone } => {
            print_json(&list_active_symptoms(conn, parse_zone(zone)?)?)?;
        }
        Commands::Conditions {
            search,
            zone,
            severity,
        } => {
            let filter = ConditionFilter {
                search,
                zone: parse_zone(zone)?,
                severity: parse_severity(severity)?,
            };
            print_json(&list_conditions(conn, &filter)?)?;
        }
        Commands::Consult {
            patient,
            zone,
            symptoms,
            image,
            notes,
        } => {
            let image = image.map(|path| ImageUpload::from_path(&path)).transpose()?;
            let narrator = NarrativeProvider::from_config(&app_config.remote);
            let assembler = ConsultationAssembler::new(&store, &store, &store, &narrator);
            let consultation = assembler.assemble(
                ConsultationRequest {
                    patient_name: patient,
                    zone,
                    symptoms,
                    image,
                    notes,
                },
                requester.user_id,
            )?;
            print_json(&consultation)?;
        }
        Commands::List {
            page,
            limit,
            search,
        } => {
            let query = ConsultationQuery {
                page,
                limit,
                search,
            };
            print_json(&list_consultations(conn, &requester.user_id, &query)?)?;
        }
        Commands::Show { id } => {
            print_json(&get_consultation(conn, &id, &requester)?)?;
        }
        Commands::Delete { id } => {
            delete_consultation(conn, &id, &requester)?;
            print_json(&serde_json::json!({ "deleted": id }))?;
        }
        Commands::Stats => {
            print_json(&collect_statistics(conn, &requester.user_id)?)?;
        }
        Commands::Advise { condition_id } => {
            let condition = get_condition(conn, &condition_id)?.ok_or_else(|| {
                DatabaseError::NotFound {
                    entity_type: "condition".into(),
                    id: condition_id.to_string(),
                }
            })?;
            let names = resolve_symptom_names(conn, &condition.symptom_ids)?;
            let mut symptom_names: Vec<String> = names.into_values().collect();
            symptom_names.sort();

            let narrator = NarrativeProvider::from_config(&app_config.remote);
            print_json(&Advice {
                description: narrator.describe_condition(&condition.name, &symptom_names),
                treatment: narrator.suggest_treatment(&condition.name, condition.severity),
                condition: condition.name,
            })?;
        }
    }

    Ok(())
}
