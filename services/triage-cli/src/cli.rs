//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use triage_client::types::{PrescriptionStatus, Role};

#[derive(Parser)]
#[command(name = "triage")]
#[command(version)]
#[command(about = "Command-line client for the patient triage backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: $CONFIG_PATH, then ./triage.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Backend base URL including the /api prefix
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Print client metrics in Prometheus text format to stderr on exit
    #[arg(long, global = true)]
    pub metrics: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TRIAGE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TRIAGE_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        full_name: String,
        #[arg(long, value_enum)]
        role: Option<RoleArg>,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Print the Google sign-in URL
    OauthUrl,

    /// Finish a Google sign-in from the redirect URL or its fragment
    OauthCallback {
        #[arg(value_name = "REDIRECT")]
        redirect: String,
    },

    /// Update the signed-in user's profile
    Profile {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        specialization: Option<String>,
        #[arg(long)]
        clinic: Option<String>,
    },

    /// Patient intake and queue
    Patients {
        #[command(subcommand)]
        command: PatientCommand,
    },

    /// Prescription digitization and review
    Prescriptions {
        #[command(subcommand)]
        command: PrescriptionCommand,
    },

    /// Dashboard counters
    Stats,
}

#[derive(Subcommand)]
pub enum PatientCommand {
    /// List patients, most urgent first
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one patient
    Get {
        #[arg(value_name = "PATIENT_ID")]
        id: String,
    },
    /// Submit a new intake for scoring
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u32,
        /// Male, Female or Other
        #[arg(long)]
        gender: String,
        #[arg(long)]
        symptoms: String,
        /// Prior condition; repeat for several
        #[arg(long = "history", value_name = "CONDITION")]
        history: Vec<String>,
    },
    /// Delete a patient
    Delete {
        #[arg(value_name = "PATIENT_ID")]
        id: String,
    },
    /// Transcribe a voice recording
    Transcribe {
        #[arg(value_name = "AUDIO_FILE")]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum PrescriptionCommand {
    /// Upload a prescription image for digitization
    Upload {
        #[arg(value_name = "IMAGE_FILE")]
        file: PathBuf,
        #[arg(long)]
        patient_name: String,
        #[arg(long)]
        patient_id: Option<String>,
    },
    /// List prescriptions
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one prescription
    Get {
        #[arg(value_name = "PRESCRIPTION_ID")]
        id: String,
    },
    /// Set the review status (pending, digitized, verified)
    Status {
        #[arg(value_name = "PRESCRIPTION_ID")]
        id: String,
        #[arg(value_name = "STATUS")]
        status: PrescriptionStatus,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct PageArgs {
    #[arg(long, default_value_t = 50)]
    pub limit: u32,
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Doctor,
    Patient,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Doctor => Role::Doctor,
            RoleArg::Patient => Role::Patient,
            RoleArg::Admin => Role::Admin,
        }
    }
}
