//! Subcommand handlers. Each prints its result as pretty JSON on stdout.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use common::Secret;
use serde::Serialize;
use triage_client::types::{LoginRequest, NewPatient, Pagination, ProfileUpdate, RegisterRequest};
use triage_client::{Account, PrescriptionImage, error_message};

use crate::cli::{Command, PageArgs, PatientCommand, PrescriptionCommand};

pub async fn run(command: Command, account: &Account) -> Result<()> {
    let client = account.client();
    match command {
        Command::Login { email, password } => {
            let request = LoginRequest {
                email,
                password: Secret::new(password),
            };
            let user = api(account.login(&request).await)?;
            print_json(&user)
        }
        Command::Register {
            email,
            password,
            full_name,
            role,
        } => {
            let request = RegisterRequest {
                email,
                password: Secret::new(password),
                full_name,
                role: role.map(Into::into),
            };
            let user = api(account.register(&request).await)?;
            print_json(&user)
        }
        Command::Logout => {
            api(account.logout().await)?;
            print_json(&serde_json::json!({ "logged_out": true }))
        }
        Command::Whoami => match account.restore().await {
            Some(user) => print_json(&user),
            None => bail!("not signed in; run `triage login`"),
        },
        Command::OauthUrl => {
            let url = api(account.google_oauth_url().await)?;
            print_json(&serde_json::json!({ "url": url }))
        }
        Command::OauthCallback { redirect } => {
            let user = api(account.complete_oauth(&redirect).await)?;
            print_json(&user)
        }
        Command::Profile {
            full_name,
            role,
            specialization,
            clinic,
        } => {
            let update = ProfileUpdate {
                full_name,
                role,
                specialization,
                clinic,
            };
            if update.is_empty() {
                bail!("nothing to update; pass at least one of --full-name, --role, --specialization, --clinic");
            }
            let user = api(account.update_profile(&update).await)?;
            print_json(&user)
        }
        Command::Patients { command } => match command {
            PatientCommand::List { page } => print_json(&api(client.list_patients(page.into()).await)?),
            PatientCommand::Get { id } => print_json(&api(client.get_patient(&id).await)?),
            PatientCommand::Create {
                name,
                age,
                gender,
                symptoms,
                history,
            } => {
                let patient = NewPatient {
                    name,
                    age,
                    gender,
                    symptoms,
                    history,
                };
                print_json(&api(client.create_patient(&patient).await)?)
            }
            PatientCommand::Delete { id } => {
                api(client.delete_patient(&id).await)?;
                print_json(&serde_json::json!({ "deleted": id }))
            }
            PatientCommand::Transcribe { file } => {
                let audio = read_file(&file)?;
                print_json(&api(client.transcribe_voice(audio).await)?)
            }
        },
        Command::Prescriptions { command } => match command {
            PrescriptionCommand::Upload {
                file,
                patient_name,
                patient_id,
            } => {
                let image = PrescriptionImage {
                    file_name: file_name(&file)?,
                    bytes: read_file(&file)?,
                };
                let rx = client
                    .upload_prescription(image, &patient_name, patient_id.as_deref())
                    .await;
                print_json(&api(rx)?)
            }
            PrescriptionCommand::List { page } => {
                print_json(&api(client.list_prescriptions(page.into()).await)?)
            }
            PrescriptionCommand::Get { id } => print_json(&api(client.get_prescription(&id).await)?),
            PrescriptionCommand::Status { id, status } => {
                print_json(&api(client.update_prescription_status(&id, status).await)?)
            }
        },
        Command::Stats => print_json(&api(client.dashboard_stats().await)?),
    }
}

impl From<PageArgs> for Pagination {
    fn from(page: PageArgs) -> Self {
        Pagination {
            limit: page.limit,
            offset: page.offset,
        }
    }
}

/// Surface the backend's own message instead of the error chain.
fn api<T>(result: triage_client::Result<T>) -> Result<T> {
    result.map_err(|e| anyhow!(error_message(&e)))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{out}");
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} is not a file path", path.display()))
}
