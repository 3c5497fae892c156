use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ivf_clinic_core::models::Appointment;
use ivf_clinic_core::workflow::infer_step_match;
use ivf_clinic_core::{
    Action, Clinic, ClinicError, PageQuery, SampleScreen, TreatmentCycle, WorkflowStep,
};
use ivf_clinic_http::{connect, ClientConfig, HttpTransport};

#[derive(Parser)]
#[command(name = "ivf-clinic")]
#[command(about = "Operator CLI for the IVF clinic backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a patient profile
    Patient {
        patient_id: String,
    },
    /// Show an appointment with patient and doctor resolved
    Appointment {
        appointment_id: String,
    },
    /// List appointments
    Appointments {
        /// Only this patient's appointments
        #[arg(long)]
        patient: Option<String>,
        /// Only this doctor's appointments
        #[arg(long)]
        doctor: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show a treatment cycle with samples and progress
    Cycle {
        cycle_id: String,
    },
    /// Check whether a cycle is ready for a step (e.g. embryo-transfer)
    Ready {
        cycle_id: String,
        step: String,
    },
    /// List samples eligible for a lab screen (quality-check, fertilization, transfer, freezing)
    Eligible {
        cycle_id: String,
        screen: String,
    },
    /// Check a patient in
    CheckIn {
        appointment_id: String,
    },
    /// Check a patient out
    CheckOut {
        appointment_id: String,
    },
    /// Cancel an appointment
    Cancel {
        appointment_id: String,
        #[arg(long)]
        reason: String,
    },
    /// Assign a doctor to an appointment
    AssignDoctor {
        appointment_id: String,
        doctor_id: String,
    },
    /// Mark embryos as transferred and complete the cycle's transfer step
    ConfirmTransfer {
        cycle_id: String,
        #[arg(required = true)]
        embryo_ids: Vec<String>,
    },
    /// Complete a treatment cycle
    CompleteCycle {
        cycle_id: String,
        #[arg(long)]
        outcome: Option<String>,
    },
}

/// Entry point.
///
/// # Environment Variables
/// - `CLINIC_API_BASE_URL`: backend base URL (required)
/// - `CLINIC_API_TOKEN`: bearer token forwarded on every request
/// - `CLINIC_API_TIMEOUT_SECS`: request timeout (default: 30)
/// - `CLINIC_CACHE_STALE_SECS`: query cache lifetime (default: 60)
/// - `CLINIC_PAGE_SIZE`: list page size (default: 20)
/// - `RUST_LOG`: log filter (default adds `ivf_clinic=info`)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ivf_clinic=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("invalid configuration")?;
    tracing::debug!(base_url = %config.base_url, "configuration loaded");
    let clinic = connect(&config)?;

    run(&clinic, &config, cli.command).await
}

async fn run(
    clinic: &Clinic<HttpTransport>,
    config: &ClientConfig,
    command: Commands,
) -> anyhow::Result<()> {
    match command {
        Commands::Patient { patient_id } => {
            let profile = clinic.patient_profile(&patient_id).await.map_err(report)?;
            print_or_empty(profile, "patient")?;
        }
        Commands::Appointment { appointment_id } => {
            let view = clinic.appointment_view(&appointment_id).await.map_err(report)?;
            print_or_empty(view, "appointment")?;
        }
        Commands::Appointments {
            patient,
            doctor,
            page,
        } => {
            let mut query = PageQuery::new(page, config.page_size);
            if let Some(patient_id) = patient {
                query = query.filter("patientId", patient_id);
            }
            if let Some(doctor_id) = doctor {
                query = query.filter("doctorId", doctor_id);
            }
            let result = clinic.list_appointments(&query).await.map_err(report)?;
            if result.is_empty() {
                println!("No appointments found.");
            }
            for appointment in &result.data {
                println!("{}", appointment_line(appointment));
            }
            println!(
                "Page {} of {} ({} total)",
                result.page,
                result.total_pages.max(1),
                result.total
            );
        }
        Commands::Cycle { cycle_id } => {
            let overview = clinic.cycle_overview(&cycle_id).await.map_err(report)?;
            print_or_empty(overview, "treatment cycle")?;
        }
        Commands::Ready { cycle_id, step } => {
            let step = WorkflowStep::parse(&step)
                .with_context(|| format!("unknown workflow step {:?}", step))?;
            let cycle = clinic
                .get::<TreatmentCycle>(&cycle_id)
                .await
                .map_err(report)?;
            match infer_step_match(&cycle, step) {
                Some(signal) => println!("{}: ready for {} ({:?})", cycle_id, step, signal),
                None => println!("{}: not ready for {}", cycle_id, step),
            }
        }
        Commands::Eligible { cycle_id, screen } => {
            let screen = SampleScreen::parse(&screen)
                .with_context(|| format!("unknown screen {:?}", screen))?;
            let Some(samples) = clinic
                .screen_samples(&cycle_id, screen)
                .await
                .map_err(report)?
            else {
                println!("No treatment cycle found.");
                return Ok(());
            };
            for sample in &samples.eligible {
                println!("  {} ({:?}, {:?})", sample.label(), sample.sample_type, sample.status);
            }
            for (sample, reason) in &samples.excluded {
                println!("- {} excluded: {}", sample.label(), reason);
            }
            println!("{} eligible, {} excluded", samples.eligible.len(), samples.excluded.len());
        }
        Commands::CheckIn { appointment_id } => {
            perform(clinic, Action::CheckIn { appointment_id }).await?
        }
        Commands::CheckOut { appointment_id } => {
            perform(clinic, Action::CheckOut { appointment_id }).await?
        }
        Commands::Cancel {
            appointment_id,
            reason,
        } => {
            perform(
                clinic,
                Action::CancelAppointment {
                    appointment_id,
                    reason,
                },
            )
            .await?
        }
        Commands::AssignDoctor {
            appointment_id,
            doctor_id,
        } => {
            perform(
                clinic,
                Action::AssignDoctor {
                    appointment_id,
                    doctor_id,
                },
            )
            .await?
        }
        Commands::ConfirmTransfer {
            cycle_id,
            embryo_ids,
        } => {
            let treatment_type = clinic
                .get::<TreatmentCycle>(&cycle_id)
                .await
                .map_err(report)?
                .resolved_treatment_type();
            perform(
                clinic,
                Action::ConfirmTransfer {
                    cycle_id,
                    treatment_type,
                    embryo_ids,
                },
            )
            .await?
        }
        Commands::CompleteCycle { cycle_id, outcome } => {
            perform(clinic, Action::CompleteCycle { cycle_id, outcome }).await?
        }
    }
    Ok(())
}

async fn perform(clinic: &Clinic<HttpTransport>, action: Action) -> anyhow::Result<()> {
    let report = clinic.perform(&action).await.map_err(report)?;
    println!("{}", report.message);
    Ok(())
}

/// Surface the notification text, not the error chain.
fn report(e: ClinicError) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}

fn print_or_empty<T: serde::Serialize>(value: Option<T>, what: &str) -> anyhow::Result<()> {
    match value {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => println!("No {} found.", what),
    }
    Ok(())
}

fn appointment_line(appointment: &Appointment) -> String {
    format!(
        "{}  {}  {}  {:?}",
        appointment.id,
        appointment.appointment_date.as_deref().unwrap_or("-"),
        appointment
            .slot
            .as_ref()
            .and_then(|s| s.label())
            .unwrap_or_else(|| "-".to_string()),
        appointment.status
    )
}
