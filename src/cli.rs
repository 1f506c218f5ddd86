//! Command-line front desk.
//!
//! Every command ends in one [`Notice`] line; listings are printed above it.
//! A failing notice maps to exit code 1.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{FixedOffset, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use crate::api::{HttpOpdClient, OpdApi};
use crate::config::{self, ClientConfig};
use crate::desk::{self, admin, doctor, reception, AdminDesk, DoctorDesk, Notice, ReceptionDesk};
use crate::models::{Medicine, NewUser, Patient, PatientRegistration, Role, User, UserUpdate};
use crate::prescription_pdf::PdfExporter;
use crate::roster::Roster;
use crate::session::SessionStore;
use crate::validation::PrescriptionDraft;

#[derive(Parser, Debug)]
#[command(name = "opd-desk", version)]
#[command(about = "Outpatient department front desk for the Tekisky Hospital OPD service")]
pub struct Cli {
    /// Base URL of the OPD backend
    #[arg(long, global = true, env = "OPD_API_BASE_URL")]
    pub api_url: Option<String>,

    /// Directory holding the session file and exported prescriptions
    #[arg(long, global = true, env = "OPD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        role: Role,
        #[arg(long)]
        email: String,
        #[arg(long, env = "OPD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the remembered session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Manage staff accounts (admin)
    Users {
        #[command(subcommand)]
        action: UsersCommand,
    },
    /// List doctors available for registration (receptionist)
    Doctors,
    /// Patients grouped by day and doctor with fee totals (admin)
    Roster {
        /// Calendar offset for grouping, e.g. 330 for IST
        #[arg(long, allow_hyphen_values = true)]
        utc_offset_minutes: Option<i32>,
    },
    /// Register a walk-in patient and issue a token (receptionist)
    Register {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        disease: String,
        /// Doctor id (see `doctors`)
        #[arg(long)]
        doctor: String,
    },
    /// Today's patients (doctor)
    Today,
    /// Save a prescription and export its PDF (doctor)
    Prescribe {
        #[arg(long)]
        patient: String,
        #[arg(long)]
        diagnosis: String,
        /// "name|dosage|duration", repeatable
        #[arg(long = "medicine", value_parser = parse_medicine)]
        medicines: Vec<Medicine>,
        #[arg(long)]
        notes: Option<String>,
        /// Export directory (default: <data dir>/exports)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Date printed on the prescription (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    List,
    Create {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        role: Role,
        #[arg(long)]
        specialization: Option<String>,
        #[arg(long)]
        fees: Option<f64>,
        #[arg(long)]
        mobile: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        specialization: Option<String>,
        #[arg(long)]
        fees: Option<f64>,
        #[arg(long)]
        mobile: Option<String>,
    },
    Delete {
        id: String,
    },
}

fn parse_medicine(raw: &str) -> Result<Medicine, String> {
    let parts: Vec<&str> = raw.split('|').map(str::trim).collect();
    match parts.as_slice() {
        [name, dosage, duration] => Ok(Medicine::new(name, dosage, duration)),
        _ => Err(format!("expected \"name|dosage|duration\", got {raw:?}")),
    }
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub data_dir: PathBuf,
    pub client: ClientConfig,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        let mut client = ClientConfig::from_env();
        if let Some(ref url) = cli.api_url {
            client.api_base_url = url.trim_end_matches('/').to_string();
        }
        Self {
            data_dir: cli.data_dir.clone().unwrap_or_else(config::app_data_dir),
            client,
        }
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.client.utc_offset).date_naive()
    }
}

/// Parse-free entry: run `cli` against the real backend.
pub fn run(cli: Cli) -> ExitCode {
    let ctx = Context::from_cli(&cli);
    tracing::debug!(api = %ctx.client.api_base_url, data_dir = %ctx.data_dir.display(), "Starting");

    let mut stdout = std::io::stdout().lock();
    let notice = match prepare(&ctx) {
        Ok((api, mut store)) => execute(&cli.command, &api, &mut store, &ctx, &mut stdout),
        Err(notice) => notice,
    };
    emit(writeln!(stdout, "{notice}"));

    if notice.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn prepare(ctx: &Context) -> Result<(HttpOpdClient, SessionStore), Notice> {
    let api = HttpOpdClient::new(&ctx.client).map_err(|e| Notice::error(e.to_string()))?;
    let store = SessionStore::open(config::session_file(&ctx.data_dir))
        .map_err(|e| Notice::error(e.to_string()))?;
    Ok((api, store))
}

/// Run one command. Listings go to `out`; the outcome is returned.
pub fn execute<A: OpdApi + ?Sized, W: Write>(
    command: &Command,
    api: &A,
    store: &mut SessionStore,
    ctx: &Context,
    out: &mut W,
) -> Notice {
    match command {
        Command::Login {
            role,
            email,
            password,
        } => match desk::login(api, store, email, password, *role) {
            Ok(session) => Notice::success(format!(
                "{} Welcome, {}",
                desk::LOGIN_OK,
                session.user.full_name
            )),
            Err(e) => Notice::failure(&e, desk::LOGIN_FAILED),
        },

        Command::Logout => {
            let result = desk::logout(api, store);
            Notice::report(&result, desk::LOGOUT_OK, "Logout failed")
        }

        Command::Whoami => match store.get() {
            Some(session) => Notice::success(format!(
                "{} ({}) {}",
                session.user.full_name, session.user.role, session.user.email
            )),
            None => Notice::error("Not logged in"),
        },

        Command::Users { action } => users(action, api, store, out),

        Command::Doctors => {
            let mut desk = match ReceptionDesk::open(api, store) {
                Ok(desk) => desk,
                Err(e) => return Notice::failure(&e, reception::FETCH_DOCTORS_FAILED),
            };
            match desk.refresh_doctors() {
                Ok([]) => Notice::error(reception::NO_DOCTORS),
                Ok(doctors) => {
                    emit(print_doctors(out, doctors));
                    Notice::success(format!("{} doctor(s)", doctors.len()))
                }
                Err(e) => Notice::failure(&e, reception::FETCH_DOCTORS_FAILED),
            }
        }

        Command::Roster { utc_offset_minutes } => {
            let offset = match utc_offset_minutes {
                Some(minutes) => match config::offset_from_minutes(*minutes) {
                    Some(offset) => offset,
                    None => return Notice::error(format!("Invalid UTC offset: {minutes} minutes")),
                },
                None => ctx.client.utc_offset,
            };
            roster(api, store, offset, out)
        }

        Command::Register {
            full_name,
            mobile,
            address,
            age,
            disease,
            doctor,
        } => {
            let form = PatientRegistration {
                full_name: full_name.clone(),
                mobile_number: mobile.clone(),
                address: address.clone(),
                age: *age,
                disease: disease.clone(),
                doctor: doctor.clone(),
                fees: 0.0,
            };
            let result = ReceptionDesk::open(api, store).and_then(|mut desk| {
                desk.refresh_doctors()?;
                desk.register_patient(&form)
            });
            match result {
                Ok(patient) => {
                    emit(writeln!(
                        out,
                        "Token No: {}  {}  ({})",
                        patient.token_number,
                        patient.full_name,
                        format_amount(patient.effective_fee())
                    ));
                    Notice::success(reception::REGISTERED)
                }
                Err(e) => Notice::failure(&e, reception::REGISTRATION_FAILED),
            }
        }

        Command::Today => {
            let exporter = PdfExporter::new(config::exports_dir(&ctx.data_dir));
            let result = DoctorDesk::open(api, &exporter, store).and_then(|mut desk| {
                desk.refresh_today()?;
                Ok(desk.today().to_vec())
            });
            match result {
                Ok(patients) => {
                    emit(print_today(out, &patients));
                    Notice::success(format!("{} patient(s) today", patients.len()))
                }
                Err(e) => Notice::failure(&e, doctor::FETCH_TODAY_FAILED),
            }
        }

        Command::Prescribe {
            patient,
            diagnosis,
            medicines,
            notes,
            out: out_dir,
            date,
        } => {
            let dir = out_dir
                .clone()
                .unwrap_or_else(|| config::exports_dir(&ctx.data_dir));
            let exporter = PdfExporter::new(dir);
            let draft = PrescriptionDraft {
                diagnosis: diagnosis.clone(),
                medicines: medicines.clone(),
                notes: notes.clone().unwrap_or_default(),
            };
            let date = date.unwrap_or_else(|| ctx.today());
            let result = DoctorDesk::open(api, &exporter, store)
                .and_then(|mut desk| desk.prescribe(patient, &draft, date));
            if let Ok(ref outcome) = result {
                emit(writeln!(out, "{}", outcome.pdf_path.display()));
            }
            Notice::report(&result, doctor::PRESCRIBED, doctor::PRESCRIBE_FAILED)
        }
    }
}

fn users<A: OpdApi + ?Sized, W: Write>(
    action: &UsersCommand,
    api: &A,
    store: &SessionStore,
    out: &mut W,
) -> Notice {
    let mut desk = match AdminDesk::open(api, store) {
        Ok(desk) => desk,
        Err(e) => return Notice::failure(&e, admin::OPERATION_FAILED),
    };

    match action {
        UsersCommand::List => match desk.refresh_users() {
            Ok(users) => {
                emit(print_users(out, users));
                Notice::success(format!("{} user(s)", users.len()))
            }
            Err(e) => Notice::failure(&e, admin::FETCH_USERS_FAILED),
        },
        UsersCommand::Create {
            full_name,
            email,
            password,
            role,
            specialization,
            fees,
            mobile,
        } => {
            let user = NewUser {
                full_name: full_name.clone(),
                email: email.clone(),
                password: password.clone(),
                role: *role,
                specialization: specialization.clone(),
                fees: *fees,
                mobile_number: mobile.clone(),
            };
            let result = desk.create_user(&user);
            if result.is_ok() {
                emit(print_users(out, desk.users()));
            }
            Notice::report(&result, admin::USER_CREATED, admin::OPERATION_FAILED)
        }
        UsersCommand::Update {
            id,
            full_name,
            email,
            password,
            specialization,
            fees,
            mobile,
        } => {
            let update = UserUpdate {
                full_name: full_name.clone(),
                email: email.clone(),
                password: password.clone(),
                specialization: specialization.clone(),
                fees: *fees,
                mobile_number: mobile.clone(),
            };
            if update.is_empty() {
                return Notice::error("Nothing to update");
            }
            let result = desk.update_user(id, &update);
            if result.is_ok() {
                emit(print_users(out, desk.users()));
            }
            Notice::report(&result, admin::USER_UPDATED, admin::OPERATION_FAILED)
        }
        UsersCommand::Delete { id } => match desk.delete_user(id) {
            Ok(()) => {
                emit(print_users(out, desk.users()));
                Notice::success(admin::USER_DELETED)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Delete failed");
                Notice::error(admin::DELETE_FAILED)
            }
        },
    }
}

fn roster<A: OpdApi + ?Sized, W: Write>(
    api: &A,
    store: &SessionStore,
    offset: FixedOffset,
    out: &mut W,
) -> Notice {
    let result = AdminDesk::open(api, store).and_then(|mut desk| {
        desk.refresh_patients()?;
        Ok(desk.roster(offset))
    });
    match result {
        Ok(roster) => {
            emit(print_roster(out, &roster));
            Notice::success(format!(
                "Total: {} patients, {} collected",
                roster.patient_count(),
                format_amount(roster.grand_total())
            ))
        }
        Err(e) => Notice::failure(&e, admin::FETCH_PATIENTS_FAILED),
    }
}

// ═══════════════════════════════════════════════════════════
// Listings
// ═══════════════════════════════════════════════════════════

/// Rupee amount without trailing ".00" for whole values.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("₹{amount:.0}")
    } else {
        format!("₹{amount:.2}")
    }
}

fn fee_column(fees: Option<f64>) -> String {
    match fees {
        Some(f) if f != 0.0 => format_amount(f),
        _ => "-".to_string(),
    }
}

/// Report a failed write to the listing stream. The command outcome
/// is already decided, so the failure is logged rather than returned.
fn emit(result: std::io::Result<()>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "Failed to write output");
    }
}

fn print_users<W: Write>(out: &mut W, users: &[User]) -> std::io::Result<()> {
    for u in users {
        let fees = if u.is_doctor() {
            fee_column(u.fees)
        } else {
            "-".to_string()
        };
        writeln!(
            out,
            "{:<26} {:<13} {:<24} {:<28} {}",
            u.id, u.role, u.full_name, u.email, fees
        )?;
    }
    Ok(())
}

fn print_doctors<W: Write>(out: &mut W, doctors: &[User]) -> std::io::Result<()> {
    for d in doctors {
        writeln!(
            out,
            "{:<26} {:<24} {:<20} {}",
            d.id,
            d.full_name,
            d.specialization.as_deref().unwrap_or("-"),
            fee_column(d.fees)
        )?;
    }
    Ok(())
}

fn print_today<W: Write>(out: &mut W, patients: &[Patient]) -> std::io::Result<()> {
    for p in patients {
        writeln!(
            out,
            "#{:<3} {:<26} {:<24} {:<4} {:<12} {}",
            p.token_number, p.id, p.full_name, p.age, p.status, p.disease
        )?;
    }
    Ok(())
}

fn print_roster<W: Write>(out: &mut W, roster: &Roster) -> std::io::Result<()> {
    for day in &roster.days {
        writeln!(out, "{}", day.label())?;
        for bucket in &day.doctors {
            writeln!(
                out,
                "  {} ({} patients) Total Collected: {}",
                bucket.doctor_name,
                bucket.patients.len(),
                format_amount(bucket.total_fees)
            )?;
            for p in &bucket.patients {
                writeln!(
                    out,
                    "    #{:<3} {:<24} {:<4} {:<20} {}",
                    p.token_number,
                    p.full_name,
                    p.age,
                    p.disease,
                    format_amount(p.effective_fee())
                )?;
            }
        }
    }
    Ok(())
}
