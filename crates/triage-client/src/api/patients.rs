//! `/patients` endpoints

use crate::client::ApiClient;
use crate::error::Result;
use crate::request::{ApiRequest, FormPart, path_segment};
use crate::types::{NewPatient, Pagination, Patient, PatientList, VoiceTranscription};

const PATIENTS_PATH: &str = "/patients";
const TRANSCRIBE_PATH: &str = "/patients/transcribe-voice";
const RECORDING_FILE_NAME: &str = "recording.wav";

impl ApiClient {
    /// Submit an intake. The backend scores urgency and risk before answering.
    pub async fn create_patient(&self, patient: &NewPatient) -> Result<Patient> {
        self.send_json(ApiRequest::post(PATIENTS_PATH).json(patient)?)
            .await
    }

    pub async fn list_patients(&self, page: Pagination) -> Result<PatientList> {
        let request = ApiRequest::get(PATIENTS_PATH)
            .query("limit", page.limit)
            .query("offset", page.offset);
        self.send_json(request).await
    }

    pub async fn get_patient(&self, id: &str) -> Result<Patient> {
        let path = format!("{PATIENTS_PATH}/{}", path_segment(id)?);
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn delete_patient(&self, id: &str) -> Result<()> {
        let path = format!("{PATIENTS_PATH}/{}", path_segment(id)?);
        self.send_empty(ApiRequest::delete(path)).await
    }

    /// Upload a voice recording for transcription and field extraction.
    pub async fn transcribe_voice(&self, audio: Vec<u8>) -> Result<VoiceTranscription> {
        let request = ApiRequest::post(TRANSCRIBE_PATH).multipart(vec![FormPart::file(
            "file",
            RECORDING_FILE_NAME,
            Some("audio/wav"),
            audio,
        )]);
        self.send_json(request).await
    }
}
