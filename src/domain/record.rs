//! Stored patient records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::form::lenient_text;
use super::{ClinicalForm, DiagnosisResult, Identity};

/// A diagnosis as held by the record store.
///
/// The store reports `age` and `gfr` as numbers; they are kept as text here.
/// Keys this client does not know about are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// "YYYY-MM-DD HH:MM"
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub age: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub gender: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub diagnosis: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub stage: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tdf_status: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub gfr: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_by: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PatientRecord {
    /// "age / gender" column text.
    #[must_use]
    pub fn age_gender(&self) -> String {
        format!("{} / {}", self.age, self.gender)
    }
}

/// Body of a save request: the full form plus the verdict and authorship.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavePatientRequest {
    #[serde(flatten)]
    pub form: ClinicalForm,
    pub name: String,
    pub diagnosis: String,
    pub stage: String,
    pub gfr: String,
    pub tdf_status: String,
    pub created_by: String,
}

impl SavePatientRequest {
    #[must_use]
    pub fn new(
        form: &ClinicalForm,
        result: &DiagnosisResult,
        author: &Identity,
        patient_name: &str,
    ) -> Self {
        Self {
            form: form.clone(),
            name: patient_name.trim().to_string(),
            diagnosis: result.prediction.clone(),
            stage: result.stage.clone(),
            gfr: result.gfr.clone(),
            tdf_status: result.tdf.status.clone(),
            created_by: author.username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, TdfAdvisory, TdfColor};

    #[test]
    fn test_record_from_store_row() {
        let row = r#"{
            "id": 7, "name": "Jane Doe", "date": "2024-05-02 14:10", "age": 41,
            "gender": "female", "diagnosis": "NO CKD DETECTED", "stage": "Stage 1",
            "tdf_status": "SAFE", "gfr": 104.2, "created_by": "drmwangi"
        }"#;
        let record: PatientRecord = serde_json::from_str(row).expect("Should parse");
        assert_eq!(record.id, Some(7));
        assert_eq!(record.age, "41");
        assert_eq!(record.gfr, "104.2");
        assert_eq!(record.age_gender(), "41 / female");
        assert!(record.extra.is_empty());
    }

    #[test]
    fn test_record_tolerates_nulls_and_extra_keys() {
        let row = r#"{"name": "A", "gender": null, "cd4": "300"}"#;
        let record: PatientRecord = serde_json::from_str(row).expect("Should parse");
        assert_eq!(record.gender, "");
        assert_eq!(record.extra.get("cd4"), Some(&serde_json::json!("300")));
    }

    #[test]
    fn test_save_request_flattens_form() {
        let result = DiagnosisResult {
            prediction: "CKD DETECTED".into(),
            confidence: "88.0%".into(),
            stage: "Stage 3a".into(),
            gfr: "51.0".into(),
            tdf: TdfAdvisory {
                status: "CONTRAINDICATED".into(),
                color: TdfColor::Red,
                msg: "High toxicity risk".into(),
            },
        };
        let mut form = ClinicalForm::default();
        form.age = "60".into();
        let author = Identity::new("drmwangi", Role::User);

        let body = SavePatientRequest::new(&form, &result, &author, "  John Okoth ");
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["name"], "John Okoth");
        assert_eq!(json["age"], "60");
        assert_eq!(json["tdf_status"], "CONTRAINDICATED");
        assert_eq!(json["created_by"], "drmwangi");
        assert_eq!(json["pus_cell_clumps"], "notpresent");
    }
}
