//! Command-line adapter: argument parsing and rendering.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::commands::{self, medications::MedicationEntry, vitals::VitalsEntry};
use crate::config;
use crate::core_state::CoreState;
use crate::models::{Medication, NewPatient, NewSymptom, Patient, Symptom, Vitals, WithPatient};

#[derive(Parser, Debug)]
#[command(
    name = "medrec",
    author,
    version,
    about = "Patient medical history records: symptoms, medications and vitals"
)]
pub struct Cli {
    /// Config file (default: <config dir>/medrec/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging (unless RUST_LOG is set)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the record tables if they are missing
    Init,
    /// Register a patient
    AddPatient(AddPatientArgs),
    /// List all patients
    Patients,
    /// Delete a patient with no records on file
    DeletePatient { id: i64 },
    /// Record a symptom for a patient
    AddSymptom(AddSymptomArgs),
    /// List symptoms, newest first
    Symptoms(PatientFilter),
    /// Record a medication for a patient
    AddMedication(AddMedicationArgs),
    /// List medications, latest start date first
    Medications(PatientFilter),
    /// Record vital signs for a patient
    AddVitals(AddVitalsArgs),
    /// List vital signs, newest first
    Vitals(PatientFilter),
    /// Find patients who reported a symptom containing TEXT
    Correlate { text: String },
    /// Run the scripted demo workflow
    Demo,
    /// Check that the database is reachable
    Status,
    /// Print the config file location
    ConfigPath,
}

#[derive(Args, Debug)]
pub struct PatientFilter {
    /// Only records of this patient
    #[arg(long)]
    pub patient: Option<i64>,
}

#[derive(Args, Debug)]
pub struct AddPatientArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, allow_negative_numbers = true)]
    pub age: i32,
    #[arg(long, default_value = "")]
    pub gender: String,
    #[arg(long, default_value = "")]
    pub contact: String,
}

#[derive(Args, Debug)]
pub struct AddSymptomArgs {
    #[arg(long)]
    pub patient: i64,
    #[arg(long)]
    pub description: String,
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub severity: i32,
    #[arg(long, default_value = "")]
    pub duration: String,
}

#[derive(Args, Debug)]
pub struct AddMedicationArgs {
    #[arg(long)]
    pub patient: i64,
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub dosage: String,
    #[arg(long, default_value = "")]
    pub frequency: String,
    /// YYYY-MM-DD (default: today)
    #[arg(long)]
    pub start: Option<String>,
    /// YYYY-MM-DD (omit while ongoing)
    #[arg(long)]
    pub end: Option<String>,
}

#[derive(Args, Debug)]
pub struct AddVitalsArgs {
    #[arg(long)]
    pub patient: i64,
    #[arg(long)]
    pub systolic: Option<String>,
    #[arg(long)]
    pub diastolic: Option<String>,
    #[arg(long)]
    pub heart_rate: Option<String>,
    #[arg(long)]
    pub temperature: Option<String>,
    #[arg(long)]
    pub oxygen: Option<String>,
    #[arg(long)]
    pub respiratory_rate: Option<String>,
    #[arg(long)]
    pub weight: Option<String>,
    #[arg(long)]
    pub glucose: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

impl From<&AddVitalsArgs> for VitalsEntry {
    fn from(args: &AddVitalsArgs) -> Self {
        Self {
            patient_id: args.patient,
            systolic_bp: args.systolic.clone(),
            diastolic_bp: args.diastolic.clone(),
            heart_rate: args.heart_rate.clone(),
            temperature: args.temperature.clone(),
            oxygen_saturation: args.oxygen.clone(),
            respiratory_rate: args.respiratory_rate.clone(),
            weight: args.weight.clone(),
            blood_glucose: args.glucose.clone(),
            notes: args.notes.clone(),
        }
    }
}

impl Cli {
    /// The config file this invocation reads.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config::default_config_path)
    }
}

/// Run one subcommand and return what should be printed on stdout.
pub fn execute(cli: &Cli, state: &CoreState) -> Result<String, String> {
    let json = cli.json;
    match &cli.command {
        Command::Init => {
            state.init_schema().map_err(|e| e.to_string())?;
            let target = state.connections().config().target();
            render(json, &serde_json::json!({ "initialized": target }), |_| {
                format!("Schema ready at {target}")
            })
        }
        Command::AddPatient(args) => {
            let entry = NewPatient::new(&args.name, args.age, &args.gender, &args.contact);
            let id = commands::patients::add_patient(state, &entry)?;
            render(json, &serde_json::json!({ "patient_id": id }), |_| {
                format!("Added patient {id}")
            })
        }
        Command::Patients => {
            let patients = commands::patients::list_patients(state)?;
            render(json, &patients, |p| lines(p, patient_line))
        }
        Command::DeletePatient { id } => {
            commands::patients::delete_patient(state, *id)?;
            render(json, &serde_json::json!({ "deleted": id }), |_| {
                format!("Deleted patient {id}")
            })
        }
        Command::AddSymptom(args) => {
            let entry = NewSymptom::new(args.patient, &args.description, args.severity, &args.duration);
            commands::symptoms::record_symptom(state, &entry)?;
            render(json, &serde_json::json!({ "recorded": true }), |_| {
                "Symptom recorded".to_string()
            })
        }
        Command::Symptoms(PatientFilter { patient: Some(id) }) => {
            let symptoms = commands::symptoms::patient_symptoms(state, *id)?;
            render(json, &symptoms, |s| lines(s, symptom_line))
        }
        Command::Symptoms(PatientFilter { patient: None }) => {
            let symptoms = commands::symptoms::list_symptoms(state)?;
            render(json, &symptoms, |s| lines(s, |w| joined(w, symptom_line)))
        }
        Command::AddMedication(args) => {
            let entry = MedicationEntry {
                patient_id: args.patient,
                name: args.name.clone(),
                dosage: args.dosage.clone(),
                frequency: args.frequency.clone(),
                start_date: args.start.clone(),
                end_date: args.end.clone(),
            };
            commands::medications::add_medication(state, &entry)?;
            render(json, &serde_json::json!({ "recorded": true }), |_| {
                "Medication recorded".to_string()
            })
        }
        Command::Medications(PatientFilter { patient: Some(id) }) => {
            let meds = commands::medications::patient_medications(state, *id)?;
            render(json, &meds, |m| lines(m, medication_line))
        }
        Command::Medications(PatientFilter { patient: None }) => {
            let meds = commands::medications::list_medications(state)?;
            render(json, &meds, |m| lines(m, |w| joined(w, medication_line)))
        }
        Command::AddVitals(args) => {
            commands::vitals::record_vitals(state, &VitalsEntry::from(args))?;
            render(json, &serde_json::json!({ "recorded": true }), |_| {
                "Vitals recorded".to_string()
            })
        }
        Command::Vitals(PatientFilter { patient: Some(id) }) => {
            let vitals = commands::vitals::patient_vitals(state, *id)?;
            render(json, &vitals, |v| lines(v, vitals_line))
        }
        Command::Vitals(PatientFilter { patient: None }) => {
            let vitals = commands::vitals::list_vitals(state)?;
            render(json, &vitals, |v| lines(v, |w| joined(w, vitals_line)))
        }
        Command::Correlate { text } => {
            let matches = commands::correlation::search_symptom(state, text)?;
            render(json, &matches, |m| {
                lines(m, |c| format!("{}: {}", c.patient_name, c.description))
            })
        }
        Command::Demo => {
            let report = commands::demo::run_demo(state)?;
            render(json, &report, |r| {
                let mut out = format!("Demo patient {}\n", r.patient_id);
                out.push_str(&lines(&r.symptoms, symptom_line));
                out
            })
        }
        Command::Status => {
            let generation = commands::health_check(state)?;
            let target = state.connections().config().target();
            render(
                json,
                &serde_json::json!({ "status": "ok", "target": target, "generation": generation }),
                |_| format!("Connected to {target} (connection #{generation})"),
            )
        }
        Command::ConfigPath => {
            let path = cli.config_path();
            render(json, &serde_json::json!({ "config": path }), |_| {
                path.display().to_string()
            })
        }
    }
}

fn render<T, F>(json: bool, value: &T, text: F) -> Result<String, String>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    if json {
        serde_json::to_string_pretty(value).map_err(|e| e.to_string())
    } else {
        Ok(text(value))
    }
}

fn lines<T>(items: &[T], line: impl Fn(&T) -> String) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    let mut out = String::new();
    for item in items {
        let _ = writeln!(out, "{}", line(item));
    }
    out.truncate(out.trim_end().len());
    out
}

fn joined<T>(row: &WithPatient<T>, line: impl Fn(&T) -> String) -> String {
    format!("{:<20} {}", row.patient_name, line(&row.record))
}

fn patient_line(p: &Patient) -> String {
    format!(
        "#{:<4} {:<24} age {:<3} {:<8} {}",
        p.patient_id, p.name, p.age, p.gender, p.contact_info
    )
}

fn symptom_line(s: &Symptom) -> String {
    format!(
        "{}  {} (severity {}, {})",
        s.report_date.format("%Y-%m-%d %H:%M"),
        s.description,
        s.severity,
        s.duration
    )
}

fn medication_line(m: &Medication) -> String {
    let until = m
        .end_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "ongoing".to_string());
    format!(
        "{} {} {}  {} .. {}",
        m.name, m.dosage, m.frequency, m.start_date, until
    )
}

fn vitals_line(v: &Vitals) -> String {
    let mut out = v.recorded_at.format("%Y-%m-%d %H:%M").to_string();
    if let (Some(sys), Some(dia)) = (v.systolic_bp, v.diastolic_bp) {
        let _ = write!(out, "  BP {sys}/{dia}");
    }
    if let Some(hr) = v.heart_rate {
        let _ = write!(out, "  HR {hr}");
    }
    if let Some(t) = v.temperature {
        let _ = write!(out, "  T {t:.1}C");
    }
    if let Some(o2) = v.oxygen_saturation {
        let _ = write!(out, "  SpO2 {o2:.0}%");
    }
    if let Some(rr) = v.respiratory_rate {
        let _ = write!(out, "  RR {rr}");
    }
    if let Some(w) = v.weight {
        let _ = write!(out, "  {w:.1}kg");
    }
    if let Some(g) = v.blood_glucose {
        let _ = write!(out, "  glucose {g:.0}");
    }
    if let Some(notes) = &v.notes {
        let _ = write!(out, "  ({notes})");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("medrec").chain(args.iter().copied())).unwrap()
    }

    fn state() -> CoreState {
        CoreState::new(DatabaseConfig::in_memory())
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["patients", "--json", "--config", "/tmp/x.toml"]);
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.toml")));
        assert!(matches!(cli.command, Command::Patients));
    }

    #[test]
    fn add_patient_then_list() {
        let state = state();
        let add = parse(&["add-patient", "--name", "Bob", "--age", "40", "--gender", "Male"]);
        assert_eq!(execute(&add, &state).unwrap(), "Added patient 1");

        let out = execute(&parse(&["patients"]), &state).unwrap();
        assert!(out.contains("Bob"), "{out}");

        let out = execute(&parse(&["patients", "--json"]), &state).unwrap();
        let rows: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(rows[0]["name"], "Bob");
        assert_eq!(rows[0]["patient_id"], 1);
    }

    #[test]
    fn negative_age_reaches_validation() {
        let cli = parse(&["add-patient", "--name", "Bob", "--age", "-1"]);
        let err = execute(&cli, &state()).unwrap_err();
        assert!(err.starts_with("Age must be"), "{err}");
    }

    #[test]
    fn empty_listing_renders_placeholder() {
        let state = state();
        assert_eq!(execute(&parse(&["patients"]), &state).unwrap(), "(none)");
        assert_eq!(execute(&parse(&["patients", "--json"]), &state).unwrap(), "[]");
    }

    #[test]
    fn demo_then_correlate() {
        let state = state();
        let out = execute(&parse(&["demo"]), &state).unwrap();
        assert!(out.starts_with("Demo patient 1"));
        assert!(out.contains("Sore Throat"));

        let out = execute(&parse(&["correlate", "throat"]), &state).unwrap();
        assert_eq!(out, "Alice Johnson: Sore Throat");
    }

    #[test]
    fn joined_listing_json_is_flat() {
        let state = state();
        execute(&parse(&["demo"]), &state).unwrap();
        let out = execute(&parse(&["medications", "--json"]), &state).unwrap();
        let rows: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(rows[0]["patient_name"], "Alice Johnson");
        assert_eq!(rows[0]["name"], "Lozenges");
        assert!(rows[0]["end_date"].is_null());
    }

    #[test]
    fn vitals_flags_map_to_entry() {
        let state = state();
        execute(&parse(&["demo"]), &state).unwrap();
        let cli = parse(&[
            "add-vitals", "--patient", "1", "--systolic", "120", "--diastolic", "80",
            "--temperature", "37.2", "--notes", "seated",
        ]);
        execute(&cli, &state).unwrap();

        let out = execute(&parse(&["vitals", "--patient", "1"]), &state).unwrap();
        assert!(out.contains("BP 120/80"), "{out}");
        assert!(out.contains("T 37.2C"), "{out}");
        assert!(out.contains("(seated)"), "{out}");
    }

    #[test]
    fn config_path_honours_flag() {
        let cli = parse(&["config-path", "--config", "/etc/medrec.toml"]);
        assert_eq!(execute(&cli, &state()).unwrap(), "/etc/medrec.toml");
        assert_eq!(parse(&["config-path"]).config_path(), config::default_config_path());
    }

    #[test]
    fn unavailable_store_message() {
        let dir = tempfile::tempdir().unwrap();
        let state = CoreState::new(DatabaseConfig::at_path(&dir.path().join("no").join("db.db")));
        assert_eq!(
            execute(&parse(&["status"]), &state).unwrap_err(),
            "Database connection failed"
        );
    }
}
