//! `/prescriptions` endpoints

use serde::Serialize;

use crate::client::ApiClient;
use crate::error::Result;
use crate::request::{ApiRequest, FormPart, path_segment};
use crate::types::{Pagination, Prescription, PrescriptionList, PrescriptionStatus};

const PRESCRIPTIONS_PATH: &str = "/prescriptions";
const DIGITIZE_PATH: &str = "/prescriptions/digitize";

#[derive(Serialize)]
struct StatusUpdate {
    status: PrescriptionStatus,
}

/// Image of a handwritten or printed prescription.
#[derive(Debug, Clone)]
pub struct PrescriptionImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PrescriptionImage {
    /// Content type from the file extension, left to the backend when unknown.
    fn mime(&self) -> Option<&'static str> {
        let ext = self.file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some("image/png"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "webp" => Some("image/webp"),
            "pdf" => Some("application/pdf"),
            _ => None,
        }
    }
}

impl ApiClient {
    /// Upload an image for OCR. The result starts out as `Digitized`.
    pub async fn upload_prescription(
        &self,
        image: PrescriptionImage,
        patient_name: &str,
        patient_id: Option<&str>,
    ) -> Result<Prescription> {
        let mime = image.mime();
        let mut parts = vec![
            FormPart::file("file", image.file_name, mime, image.bytes),
            FormPart::text("patient_name", patient_name),
        ];
        if let Some(id) = patient_id.filter(|id| !id.is_empty()) {
            parts.push(FormPart::text("patient_id", id));
        }
        self.send_json(ApiRequest::post(DIGITIZE_PATH).multipart(parts))
            .await
    }

    pub async fn list_prescriptions(&self, page: Pagination) -> Result<PrescriptionList> {
        let request = ApiRequest::get(PRESCRIPTIONS_PATH)
            .query("limit", page.limit)
            .query("offset", page.offset);
        self.send_json(request).await
    }

    pub async fn get_prescription(&self, id: &str) -> Result<Prescription> {
        let path = format!("{PRESCRIPTIONS_PATH}/{}", path_segment(id)?);
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn update_prescription_status(
        &self,
        id: &str,
        status: PrescriptionStatus,
    ) -> Result<Prescription> {
        let path = format!("{PRESCRIPTIONS_PATH}/{}/status", path_segment(id)?);
        self.send_json(ApiRequest::patch(path).json(&StatusUpdate { status })?)
            .await
    }
}
