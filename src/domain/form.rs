//! Clinical form for CKD screening.
//!
//! Field names are the wire keys used by the parsing and scoring services.
//! Numeric inputs are kept as free text: the form is always submittable and
//! the scoring service is the only judge of whether a value is meaningful.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};

/// Accept a JSON string, number, or null as display text.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// Accept a choice value in any letter case; null gives the default.
fn lenient_choice<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(T::default()),
        Some(raw) => serde_json::from_value(serde_json::Value::String(normalize_choice(&raw)))
            .map_err(D::Error::custom),
    }
}

fn normalize_choice(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Patient gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

/// Yes/no clinical flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YesNo {
    Yes,
    #[default]
    No,
}

/// Microscopy finding for red blood cells and pus cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellFinding {
    #[default]
    Normal,
    Abnormal,
}

/// Microscopy finding for bacteria and pus cell clumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Present,
    #[default]
    NotPresent,
}

/// The clinical data submitted for scoring.
///
/// Missing keys in a parsed field map are completed from [`ClinicalForm::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicalForm {
    // Demographics
    #[serde(deserialize_with = "lenient_text")]
    pub age: String,
    #[serde(deserialize_with = "lenient_choice")]
    pub gender: Gender,
    /// "systolic/diastolic"
    #[serde(deserialize_with = "lenient_text")]
    pub blood_pressure: String,

    // History flags
    #[serde(deserialize_with = "lenient_choice")]
    pub hypertension: YesNo,
    #[serde(deserialize_with = "lenient_choice")]
    pub diabetes_mellitus: YesNo,
    #[serde(deserialize_with = "lenient_choice")]
    pub coronary_artery_disease: YesNo,
    #[serde(deserialize_with = "lenient_choice")]
    pub anaemia: YesNo,
    #[serde(deserialize_with = "lenient_choice")]
    pub pedal_edema: YesNo,

    // Biochemistry
    #[serde(deserialize_with = "lenient_text")]
    pub serum_creatinine: String,
    #[serde(deserialize_with = "lenient_text")]
    pub blood_urea: String,
    #[serde(deserialize_with = "lenient_text")]
    pub potassium: String,
    /// Urine albumin grade, 0-5
    #[serde(deserialize_with = "lenient_text")]
    pub albumin: String,
    /// Urine sugar grade, 0-5
    #[serde(deserialize_with = "lenient_text")]
    pub sugar: String,
    #[serde(deserialize_with = "lenient_text")]
    pub blood_glucose_random: String,
    #[serde(deserialize_with = "lenient_text")]
    pub white_blood_cell_count: String,
    #[serde(deserialize_with = "lenient_text")]
    pub cd4: String,

    // Microscopy
    #[serde(deserialize_with = "lenient_choice")]
    pub red_blood_cells: CellFinding,
    #[serde(deserialize_with = "lenient_choice")]
    pub pus_cell: CellFinding,
    #[serde(deserialize_with = "lenient_choice")]
    pub bacteria: Presence,
    #[serde(deserialize_with = "lenient_choice")]
    pub pus_cell_clumps: Presence,
}

impl Default for ClinicalForm {
    fn default() -> Self {
        Self {
            age: String::new(),
            gender: Gender::default(),
            blood_pressure: String::new(),
            hypertension: YesNo::No,
            diabetes_mellitus: YesNo::No,
            coronary_artery_disease: YesNo::No,
            anaemia: YesNo::No,
            pedal_edema: YesNo::No,
            serum_creatinine: String::new(),
            blood_urea: String::new(),
            potassium: String::new(),
            albumin: "0".to_string(),
            sugar: "0".to_string(),
            blood_glucose_random: String::new(),
            white_blood_cell_count: String::new(),
            cd4: String::new(),
            red_blood_cells: CellFinding::Normal,
            pus_cell: CellFinding::Normal,
            bacteria: Presence::NotPresent,
            pus_cell_clumps: Presence::NotPresent,
        }
    }
}

/// How a field is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text (numbers, blood pressure)
    Text,
    /// One of a fixed set of wire values
    Choice(&'static [&'static str]),
}

const YES_NO: &[&str] = &["yes", "no"];
const CELL: &[&str] = &["normal", "abnormal"];
const PRESENCE: &[&str] = &["present", "notpresent"];
const GENDER: &[&str] = &["male", "female", "other"];

/// Addressable form fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Age,
    Gender,
    BloodPressure,
    Hypertension,
    DiabetesMellitus,
    CoronaryArteryDisease,
    Anaemia,
    PedalEdema,
    SerumCreatinine,
    BloodUrea,
    Potassium,
    Albumin,
    Sugar,
    BloodGlucoseRandom,
    WhiteBloodCellCount,
    Cd4,
    RedBloodCells,
    PusCell,
    Bacteria,
    PusCellClumps,
}

impl FormField {
    pub const ALL: [FormField; 20] = [
        Self::Age,
        Self::Gender,
        Self::BloodPressure,
        Self::Hypertension,
        Self::DiabetesMellitus,
        Self::CoronaryArteryDisease,
        Self::Anaemia,
        Self::PedalEdema,
        Self::SerumCreatinine,
        Self::BloodUrea,
        Self::Potassium,
        Self::Albumin,
        Self::Sugar,
        Self::BloodGlucoseRandom,
        Self::WhiteBloodCellCount,
        Self::Cd4,
        Self::RedBloodCells,
        Self::PusCell,
        Self::Bacteria,
        Self::PusCellClumps,
    ];

    /// Wire key of the field.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Gender => "gender",
            Self::BloodPressure => "blood_pressure",
            Self::Hypertension => "hypertension",
            Self::DiabetesMellitus => "diabetes_mellitus",
            Self::CoronaryArteryDisease => "coronary_artery_disease",
            Self::Anaemia => "anaemia",
            Self::PedalEdema => "pedal_edema",
            Self::SerumCreatinine => "serum_creatinine",
            Self::BloodUrea => "blood_urea",
            Self::Potassium => "potassium",
            Self::Albumin => "albumin",
            Self::Sugar => "sugar",
            Self::BloodGlucoseRandom => "blood_glucose_random",
            Self::WhiteBloodCellCount => "white_blood_cell_count",
            Self::Cd4 => "cd4",
            Self::RedBloodCells => "red_blood_cells",
            Self::PusCell => "pus_cell",
            Self::Bacteria => "bacteria",
            Self::PusCellClumps => "pus_cell_clumps",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::Gender => "Gender",
            Self::BloodPressure => "Blood Pressure",
            Self::Hypertension => "Hypertension",
            Self::DiabetesMellitus => "Diabetes",
            Self::CoronaryArteryDisease => "Coronary Disease",
            Self::Anaemia => "Anaemia",
            Self::PedalEdema => "Pedal Edema",
            Self::SerumCreatinine => "Serum Creatinine",
            Self::BloodUrea => "Blood Urea",
            Self::Potassium => "Potassium",
            Self::Albumin => "Albumin (0-5)",
            Self::Sugar => "Sugar (0-5)",
            Self::BloodGlucoseRandom => "Glucose (random)",
            Self::WhiteBloodCellCount => "WBC Count",
            Self::Cd4 => "CD4 Count",
            Self::RedBloodCells => "Red Blood Cells",
            Self::PusCell => "Pus Cells",
            Self::Bacteria => "Bacteria",
            Self::PusCellClumps => "Pus Cell Clumps",
        }
    }

    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Gender => FieldKind::Choice(GENDER),
            Self::Hypertension
            | Self::DiabetesMellitus
            | Self::CoronaryArteryDisease
            | Self::Anaemia
            | Self::PedalEdema => FieldKind::Choice(YES_NO),
            Self::RedBloodCells | Self::PusCell => FieldKind::Choice(CELL),
            Self::Bacteria | Self::PusCellClumps => FieldKind::Choice(PRESENCE),
            _ => FieldKind::Text,
        }
    }
}

fn choice<T: for<'de> Deserialize<'de>>(field: FormField, value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(normalize_choice(value)))
        .map_err(|_| format!("{}: '{}' is not one of {:?}", field.label(), value, allowed(field)))
}

fn allowed(field: FormField) -> &'static [&'static str] {
    match field.kind() {
        FieldKind::Choice(values) => values,
        FieldKind::Text => &[],
    }
}

fn wire<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

impl ClinicalForm {
    /// Current value of a field, as it would appear on the wire.
    #[must_use]
    pub fn get(&self, field: FormField) -> String {
        match field {
            FormField::Age => self.age.clone(),
            FormField::Gender => wire(&self.gender),
            FormField::BloodPressure => self.blood_pressure.clone(),
            FormField::Hypertension => wire(&self.hypertension),
            FormField::DiabetesMellitus => wire(&self.diabetes_mellitus),
            FormField::CoronaryArteryDisease => wire(&self.coronary_artery_disease),
            FormField::Anaemia => wire(&self.anaemia),
            FormField::PedalEdema => wire(&self.pedal_edema),
            FormField::SerumCreatinine => self.serum_creatinine.clone(),
            FormField::BloodUrea => self.blood_urea.clone(),
            FormField::Potassium => self.potassium.clone(),
            FormField::Albumin => self.albumin.clone(),
            FormField::Sugar => self.sugar.clone(),
            FormField::BloodGlucoseRandom => self.blood_glucose_random.clone(),
            FormField::WhiteBloodCellCount => self.white_blood_cell_count.clone(),
            FormField::Cd4 => self.cd4.clone(),
            FormField::RedBloodCells => wire(&self.red_blood_cells),
            FormField::PusCell => wire(&self.pus_cell),
            FormField::Bacteria => wire(&self.bacteria),
            FormField::PusCellClumps => wire(&self.pus_cell_clumps),
        }
    }

    /// Set a single field from its wire value.
    ///
    /// Text fields accept anything. Choice fields must match an allowed value.
    ///
    /// # Errors
    /// Returns a message naming the field if a choice value is not allowed.
    pub fn set(&mut self, field: FormField, value: &str) -> Result<(), String> {
        let text = value.to_string();
        match field {
            FormField::Age => self.age = text,
            FormField::Gender => self.gender = choice(field, value)?,
            FormField::BloodPressure => self.blood_pressure = text,
            FormField::Hypertension => self.hypertension = choice(field, value)?,
            FormField::DiabetesMellitus => self.diabetes_mellitus = choice(field, value)?,
            FormField::CoronaryArteryDisease => {
                self.coronary_artery_disease = choice(field, value)?
            }
            FormField::Anaemia => self.anaemia = choice(field, value)?,
            FormField::PedalEdema => self.pedal_edema = choice(field, value)?,
            FormField::SerumCreatinine => self.serum_creatinine = text,
            FormField::BloodUrea => self.blood_urea = text,
            FormField::Potassium => self.potassium = text,
            FormField::Albumin => self.albumin = text,
            FormField::Sugar => self.sugar = text,
            FormField::BloodGlucoseRandom => self.blood_glucose_random = text,
            FormField::WhiteBloodCellCount => self.white_blood_cell_count = text,
            FormField::Cd4 => self.cd4 = text,
            FormField::RedBloodCells => self.red_blood_cells = choice(field, value)?,
            FormField::PusCell => self.pus_cell = choice(field, value)?,
            FormField::Bacteria => self.bacteria = choice(field, value)?,
            FormField::PusCellClumps => self.pus_cell_clumps = choice(field, value)?,
        }
        Ok(())
    }

    /// Advance a choice field to its next allowed value (wrapping).
    ///
    /// No-op for text fields.
    pub fn cycle(&mut self, field: FormField, forward: bool) {
        let FieldKind::Choice(values) = field.kind() else {
            return;
        };
        let current = self.get(field);
        let idx = values.iter().position(|v| *v == current).unwrap_or(0);
        let next = if forward {
            (idx + 1) % values.len()
        } else {
            (idx + values.len() - 1) % values.len()
        };
        // Values come from the field's own allowed set.
        let _ = self.set(field, values[next]);
    }

    /// True when a text field holds a value that parses as a number.
    #[must_use]
    pub fn is_numeric(&self, field: FormField) -> bool {
        field.kind() == FieldKind::Text
            && field != FormField::BloodPressure
            && self.get(field).trim().parse::<f64>().is_ok()
    }
}
