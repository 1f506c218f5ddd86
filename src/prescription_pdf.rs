//! Printable OPD prescription.
//!
//! Two steps:
//! 1. `compose_layout`: pure, positions every line on an A4 page
//!    (millimetres measured from the top edge)
//! 2. `render_pdf`: draws the layout with `printpdf`
//!
//! The layout is a fixed vertical flow. Diagnosis and notes wrap and push
//! later blocks down; each medicine takes a fixed three-line slot. The
//! signature block sits at a fixed offset and is never reflowed, so very
//! long prescriptions can run into it.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use printpdf::*;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::HOSPITAL_NAME;
use crate::models::{DoctorSummary, Patient, Prescription, User};

// ─── Page geometry ────────────────────────────────────────────────────────────

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

const LEFT_MM: f32 = 20.0;
const VALUE_MM: f32 = 60.0;
const MEDICINE_MM: f32 = 25.0;
const DATE_MM: f32 = 150.0;
const CENTER_MM: f32 = PAGE_WIDTH_MM / 2.0;

/// Advance per wrapped line of diagnosis or notes.
pub const LINE_HEIGHT_MM: f32 = 6.0;
/// Fixed slot per medicine (name / dosage / duration).
pub const MEDICINE_SLOT_MM: f32 = 20.0;
/// Signature rule; "Doctor Signature" and the date sit 8mm below.
pub const SIGNATURE_TOP_MM: f32 = 250.0;
/// About 170mm of 12pt Helvetica.
pub const WRAP_CHARS: usize = 80;

const DOCTOR_TOP_MM: f32 = 50.0;
const PATIENT_TOP_MM: f32 = 75.0;

const TITLE_PT: f32 = 20.0;
const BODY_PT: f32 = 12.0;

// ─── Types ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Align {
    Left,
    Center,
}

/// One line of text placed on the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextItem {
    pub text: String,
    pub x_mm: f32,
    pub top_mm: f32,
    pub size_pt: f32,
    pub weight: FontWeight,
    pub align: Align,
}

/// Doctor details printed in the header block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrescriberInfo {
    pub full_name: String,
    pub specialization: Option<String>,
}

impl From<&User> for PrescriberInfo {
    fn from(user: &User) -> Self {
        Self {
            full_name: user.full_name.clone(),
            specialization: user.specialization.clone(),
        }
    }
}

impl From<&DoctorSummary> for PrescriberInfo {
    fn from(doctor: &DoctorSummary) -> Self {
        Self {
            full_name: doctor.full_name.clone(),
            specialization: doctor.specialization.clone(),
        }
    }
}

/// Positioned content of one prescription page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrescriptionLayout {
    pub title: String,
    pub date: NaiveDate,
    pub items: Vec<TextItem>,
    /// Top of the "Prescribed Medicines:" heading.
    pub medicines_top: f32,
    /// Top of the "Notes:" heading, when notes are printed.
    pub notes_top: Option<f32>,
    /// First free offset after the flowing content.
    pub content_bottom: f32,
}

impl PrescriptionLayout {
    /// Flowing content reaches the fixed signature block.
    pub fn overlaps_signature(&self) -> bool {
        self.content_bottom > SIGNATURE_TOP_MM
    }
}

/// Rendered prescription plus the name it should be saved under.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedDocument {
    pub bytes: Vec<u8>,
    pub suggested_filename: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("PDF font error: {0}")]
    Font(String),
    #[error("PDF save error: {0}")]
    Save(String),
    #[error("Date not representable in PDF metadata: {0}")]
    InvalidDate(NaiveDate),
    #[error("Cannot write prescription: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Layout ───────────────────────────────────────────────────────────────────

/// Date as stamped on the page, e.g. "10/19/2026".
pub fn stamp_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// `prescription_{name}_{M-D-YYYY}.pdf`, every whitespace character in the
/// name replaced by `_`.
pub fn prescription_filename(patient_name: &str, date: NaiveDate) -> String {
    let name: String = patient_name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("prescription_{}_{}.pdf", name, date.format("%-m-%-d-%Y"))
}

fn text(s: impl Into<String>, x_mm: f32, top_mm: f32, size_pt: f32, weight: FontWeight) -> TextItem {
    TextItem {
        text: s.into(),
        x_mm,
        top_mm,
        size_pt,
        weight,
        align: Align::Left,
    }
}

fn centered(s: impl Into<String>, top_mm: f32, size_pt: f32) -> TextItem {
    TextItem {
        text: s.into(),
        x_mm: CENTER_MM,
        top_mm,
        size_pt,
        weight: FontWeight::Regular,
        align: Align::Center,
    }
}

/// Lay out the prescription. Pure: same inputs, same layout.
pub fn compose_layout(
    patient: &Patient,
    doctor: &PrescriberInfo,
    prescription: &Prescription,
    date: NaiveDate,
) -> PrescriptionLayout {
    use FontWeight::{Bold, Regular};

    let mut items = Vec::new();

    // Title block
    items.push(centered(HOSPITAL_NAME, 20.0, TITLE_PT));
    items.push(centered("OPD Prescription", 30.0, BODY_PT));

    // Doctor block
    items.push(text("Doctor:", LEFT_MM, DOCTOR_TOP_MM, BODY_PT, Bold));
    items.push(text(&doctor.full_name, VALUE_MM, DOCTOR_TOP_MM, BODY_PT, Regular));
    if let Some(spec) = doctor.specialization.as_deref().filter(|s| !s.trim().is_empty()) {
        items.push(text(spec, LEFT_MM, DOCTOR_TOP_MM + 8.0, BODY_PT, Regular));
    }

    // Patient block
    let y = PATIENT_TOP_MM;
    items.push(text("Patient Information:", LEFT_MM, y, BODY_PT, Bold));
    items.push(text(format!("Name: {}", patient.full_name), LEFT_MM, y + 8.0, BODY_PT, Regular));
    items.push(text(format!("Age: {}", patient.age), LEFT_MM, y + 16.0, BODY_PT, Regular));
    items.push(text(format!("Token No: {}", patient.token_number), LEFT_MM, y + 24.0, BODY_PT, Regular));
    items.push(text(format!("Issue: {}", patient.disease), LEFT_MM, y + 32.0, BODY_PT, Regular));

    // Diagnosis
    let mut y = PATIENT_TOP_MM + 45.0;
    items.push(text("Diagnosis:", LEFT_MM, y, BODY_PT, Bold));
    let diagnosis_lines = wrap_text(&prescription.diagnosis, WRAP_CHARS);
    for (i, line) in diagnosis_lines.iter().enumerate() {
        let top = y + 8.0 + i as f32 * LINE_HEIGHT_MM;
        items.push(text(line.as_str(), LEFT_MM, top, BODY_PT, Regular));
    }
    y += diagnosis_lines.len() as f32 * LINE_HEIGHT_MM + 12.0;

    // Medicines
    let medicines_top = y;
    items.push(text("Prescribed Medicines:", LEFT_MM, y, BODY_PT, Bold));
    y += 10.0;
    for (i, medicine) in prescription.medicines.iter().enumerate() {
        items.push(text(format!("{}. {}", i + 1, medicine.name), MEDICINE_MM, y, BODY_PT, Regular));
        items.push(text(format!("   Dosage: {}", medicine.dosage), MEDICINE_MM, y + 6.0, BODY_PT, Regular));
        items.push(text(format!("   Duration: {}", medicine.duration), MEDICINE_MM, y + 12.0, BODY_PT, Regular));
        y += MEDICINE_SLOT_MM;
    }

    // Notes
    let notes_top = match prescription.printable_notes() {
        Some(notes) => {
            y += 5.0;
            let top = y;
            items.push(text("Notes:", LEFT_MM, y, BODY_PT, Bold));
            let lines = wrap_text(notes, WRAP_CHARS);
            for (i, line) in lines.iter().enumerate() {
                let line_top = y + 8.0 + i as f32 * LINE_HEIGHT_MM;
                items.push(text(line.as_str(), LEFT_MM, line_top, BODY_PT, Regular));
            }
            y += lines.len() as f32 * LINE_HEIGHT_MM + 8.0;
            Some(top)
        }
        None => None,
    };

    // Signature block, fixed position
    items.push(text("___________________", LEFT_MM, SIGNATURE_TOP_MM, BODY_PT, Regular));
    items.push(text("Doctor Signature", LEFT_MM, SIGNATURE_TOP_MM + 8.0, BODY_PT, Regular));
    items.push(text(format!("Date: {}", stamp_date(date)), DATE_MM, SIGNATURE_TOP_MM + 8.0, BODY_PT, Regular));

    PrescriptionLayout {
        title: format!("OPD Prescription - {}", patient.full_name),
        date,
        items,
        medicines_top,
        notes_top,
        content_bottom: y,
    }
}

// ─── PDF rendering ────────────────────────────────────────────────────────────

/// Rough Helvetica advance: half an em per character.
fn approx_width_mm(s: &str, size_pt: f32) -> f32 {
    s.chars().count() as f32 * size_pt * 0.5 * 0.352_778
}

fn pdf_timestamp(date: NaiveDate) -> Result<::time::OffsetDateTime, ComposeError> {
    let month = ::time::Month::try_from(date.month() as u8)
        .map_err(|_| ComposeError::InvalidDate(date))?;
    let day = ::time::Date::from_calendar_date(date.year(), month, date.day() as u8)
        .map_err(|_| ComposeError::InvalidDate(date))?;
    Ok(day.midnight().assume_utc())
}

/// Hex digest of the layout; seeds every id written into the file.
fn layout_digest(layout: &PrescriptionLayout) -> String {
    let mut hasher = Sha256::new();
    match serde_json::to_vec(layout) {
        Ok(bytes) => hasher.update(&bytes),
        Err(_) => hasher.update(format!("{layout:?}").as_bytes()),
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// Overwrite both strings of the trailer `/ID` array with digest characters.
/// printpdf fills the second one with random characters on every save.
fn pin_trailer_id(pdf: &mut [u8], digest_hex: &[u8]) {
    let Some(id_pos) = rfind(pdf, b"/ID") else {
        return;
    };
    let mut cursor = id_pos + 3;
    for _ in 0..2 {
        let Some(open) = pdf[cursor..].iter().position(|b| *b == b'(').map(|p| cursor + p) else {
            return;
        };
        let Some(close) = pdf[open + 1..]
            .iter()
            .position(|b| *b == b')')
            .map(|p| open + 1 + p)
        else {
            return;
        };
        for (i, byte) in pdf[open + 1..close].iter_mut().enumerate() {
            *byte = digest_hex[i % digest_hex.len()];
        }
        cursor = close + 1;
    }
}

/// Draws the layout on a single A4 page. Returns PDF bytes.
pub fn render_pdf(layout: &PrescriptionLayout) -> Result<Vec<u8>, ComposeError> {
    let digest = layout_digest(layout);
    let stamp = pdf_timestamp(layout.date)?;

    let (doc, page1, layer1) =
        PdfDocument::new(&layout.title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let doc = doc
        .with_conformance(PdfConformance::Custom(CustomPdfConformance {
            requires_icc_profile: false,
            requires_xmp_metadata: false,
            allows_default_fonts: true,
            ..Default::default()
        }))
        .with_document_id(digest[..32].to_string())
        .with_creation_date(stamp)
        .with_mod_date(stamp)
        .with_metadata_date(stamp);

    let layer = doc.get_page(page1).get_layer(layer1);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ComposeError::Font(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ComposeError::Font(e.to_string()))?;

    for item in &layout.items {
        let face = match item.weight {
            FontWeight::Regular => &font,
            FontWeight::Bold => &bold,
        };
        let x = match item.align {
            Align::Left => item.x_mm,
            Align::Center => item.x_mm - approx_width_mm(&item.text, item.size_pt) / 2.0,
        };
        let y = PAGE_HEIGHT_MM - item.top_mm;
        layer.use_text(item.text.as_str(), item.size_pt, Mm(x), Mm(y), face);
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ComposeError::Save(e.to_string()))?;
    let mut bytes = buf
        .into_inner()
        .map_err(|e| ComposeError::Save(e.to_string()))?;

    pin_trailer_id(&mut bytes, digest.as_bytes());
    Ok(bytes)
}

/// Compose the prescription for `patient` and render it.
pub fn compose_prescription_document(
    patient: &Patient,
    doctor: &PrescriberInfo,
    prescription: &Prescription,
    date: NaiveDate,
) -> Result<ComposedDocument, ComposeError> {
    let layout = compose_layout(patient, doctor, prescription, date);
    if layout.overlaps_signature() {
        tracing::warn!(
            content_bottom = layout.content_bottom,
            "Prescription content reaches the signature block"
        );
    }
    let bytes = render_pdf(&layout)?;
    Ok(ComposedDocument {
        bytes,
        suggested_filename: prescription_filename(&patient.full_name, date),
    })
}

/// Saves the document under `dir` using its suggested filename.
pub fn export_to_dir(document: &ComposedDocument, dir: &Path) -> Result<PathBuf, ComposeError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(&document.suggested_filename);
    std::fs::write(&path, &document.bytes)?;
    tracing::info!(path = %path.display(), "Prescription exported");
    Ok(path)
}

// ─── Export seam ──────────────────────────────────────────────────────────────

/// Where finished prescriptions go (allows mocking).
pub trait PrescriptionExporter {
    fn export(
        &self,
        patient: &Patient,
        doctor: &PrescriberInfo,
        prescription: &Prescription,
        date: NaiveDate,
    ) -> Result<PathBuf, ComposeError>;
}

/// Writes PDFs into a directory.
#[derive(Debug, Clone)]
pub struct PdfExporter {
    dir: PathBuf,
}

impl PdfExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PrescriptionExporter for PdfExporter {
    fn export(
        &self,
        patient: &Patient,
        doctor: &PrescriberInfo,
        prescription: &Prescription,
        date: NaiveDate,
    ) -> Result<PathBuf, ComposeError> {
        let document = compose_prescription_document(patient, doctor, prescription, date)?;
        export_to_dir(&document, &self.dir)
    }
}

/// Simple word-wrap helper for PDF text rendering.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.chars().count() + word.chars().count() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Medicine, PatientStatus};
    use chrono::{TimeZone, Utc};

    fn patient(name: &str) -> Patient {
        Patient {
            id: "p1".into(),
            full_name: name.into(),
            mobile_number: "9000000001".into(),
            address: "MG Road".into(),
            age: 34,
            disease: "Fever and body ache".into(),
            doctor: None,
            fees: Some(500.0),
            token_number: 7,
            registration_date: Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap(),
            status: PatientStatus::InProgress,
            prescription: None,
        }
    }

    fn doctor() -> PrescriberInfo {
        PrescriberInfo {
            full_name: "Asha Rao".into(),
            specialization: Some("General Medicine".into()),
        }
    }

    fn prescription(diagnosis: &str, notes: Option<&str>) -> Prescription {
        Prescription {
            diagnosis: diagnosis.into(),
            medicines: vec![
                Medicine::new("Paracetamol", "500mg twice daily", "5 days"),
                Medicine::new("ORS", "1 sachet after each loose stool", "3 days"),
            ],
            notes: notes.map(str::to_string),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn item<'a>(layout: &'a PrescriptionLayout, starts_with: &str) -> &'a TextItem {
        layout
            .items
            .iter()
            .find(|i| i.text.starts_with(starts_with))
            .unwrap_or_else(|| panic!("no item starting with {starts_with:?}"))
    }

    #[test]
    fn layout_has_fixed_header_positions() {
        let layout = compose_layout(&patient("Ravi Kumar"), &doctor(), &prescription("Viral fever", None), date());

        let title = item(&layout, HOSPITAL_NAME);
        assert_eq!(title.top_mm, 20.0);
        assert_eq!(title.align, Align::Center);
        assert_eq!(item(&layout, "Asha Rao").x_mm, 60.0);
        assert_eq!(item(&layout, "General Medicine").top_mm, 58.0);
        assert_eq!(item(&layout, "Name: Ravi Kumar").top_mm, 83.0);
        assert_eq!(item(&layout, "Token No: 7").top_mm, 99.0);
        assert_eq!(item(&layout, "Issue: Fever and body ache").top_mm, 107.0);
        assert_eq!(item(&layout, "Diagnosis:").top_mm, 120.0);
    }

    #[test]
    fn specialization_line_is_optional() {
        let doc = PrescriberInfo {
            full_name: "Asha Rao".into(),
            specialization: None,
        };
        let layout = compose_layout(&patient("Ravi"), &doc, &prescription("Viral fever", None), date());
        assert!(!layout.items.iter().any(|i| i.top_mm == 58.0));
    }

    #[test]
    fn one_line_diagnosis_places_medicines_at_138() {
        let layout = compose_layout(&patient("Ravi"), &doctor(), &prescription("Viral fever", None), date());
        // 120 + 1 line * 6 + 12
        assert_eq!(layout.medicines_top, 138.0);
        assert_eq!(item(&layout, "1. Paracetamol").top_mm, 148.0);
        assert_eq!(item(&layout, "   Dosage: 500mg").top_mm, 154.0);
        assert_eq!(item(&layout, "   Duration: 5 days").top_mm, 160.0);
        assert_eq!(item(&layout, "2. ORS").top_mm, 168.0);
    }

    #[test]
    fn long_diagnosis_pushes_medicines_down() {
        let short = compose_layout(&patient("Ravi"), &doctor(), &prescription("Viral fever", None), date());
        let long_text = "Acute viral upper respiratory tract infection with mild dehydration \
                         and associated myalgia; rule out dengue if fever persists beyond \
                         seventy-two hours, review platelet count and liver function on follow up";
        let long = compose_layout(&patient("Ravi"), &doctor(), &prescription(long_text, None), date());

        assert_eq!(wrap_text(long_text, WRAP_CHARS).len(), 3);
        assert!(long.medicines_top > short.medicines_top);
        assert_eq!(long.medicines_top - short.medicines_top, 2.0 * LINE_HEIGHT_MM);
    }

    #[test]
    fn notes_are_emitted_only_when_present() {
        let without = compose_layout(&patient("Ravi"), &doctor(), &prescription("Viral fever", None), date());
        assert!(without.notes_top.is_none());
        assert!(!without.items.iter().any(|i| i.text == "Notes:"));

        let blank = compose_layout(&patient("Ravi"), &doctor(), &prescription("Viral fever", Some("  ")), date());
        assert!(blank.notes_top.is_none());

        let with = compose_layout(&patient("Ravi"), &doctor(), &prescription("Viral fever", Some("Drink plenty of fluids")), date());
        // medicines start at 148, two slots of 20, then +5
        assert_eq!(with.notes_top, Some(193.0));
        assert_eq!(item(&with, "Drink plenty").top_mm, 201.0);
    }

    #[test]
    fn signature_block_is_not_reflowed() {
        let short = compose_layout(&patient("Ravi"), &doctor(), &prescription("Viral fever", None), date());
        let mut many = prescription("Viral fever", Some("Rest"));
        many.medicines = (0..8)
            .map(|i| Medicine::new(&format!("Drug {i}"), "1 tab", "3 days"))
            .collect();
        let long = compose_layout(&patient("Ravi"), &doctor(), &many, date());

        for layout in [&short, &long] {
            assert_eq!(item(layout, "___").top_mm, SIGNATURE_TOP_MM);
            let stamp = item(layout, "Date: ");
            assert_eq!(stamp.text, "Date: 10/19/2026");
            assert_eq!(stamp.top_mm, 258.0);
            assert_eq!(stamp.x_mm, 150.0);
        }
        assert!(!short.overlaps_signature());
        assert!(long.overlaps_signature());
    }

    #[test]
    fn layout_does_not_mutate_inputs() {
        let p = patient("Ravi");
        let rx = prescription("Viral fever", Some("Rest"));
        let (p_before, rx_before) = (p.clone(), rx.clone());
        let _ = compose_layout(&p, &doctor(), &rx, date());
        assert_eq!(p, p_before);
        assert_eq!(rx, rx_before);
    }

    #[test]
    fn filename_replaces_each_whitespace_character() {
        assert_eq!(
            prescription_filename("Ravi  Kumar\tS", date()),
            "prescription_Ravi__Kumar_S_10-19-2026.pdf"
        );
        assert_eq!(
            prescription_filename("Asha", NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()),
            "prescription_Asha_1-5-2026.pdf"
        );
    }

    #[test]
    fn pdf_generation() {
        let doc = compose_prescription_document(
            &patient("Ravi Kumar"),
            &doctor(),
            &prescription("Viral fever", Some("Rest")),
            date(),
        )
        .unwrap();
        assert!(!doc.bytes.is_empty());
        // PDF magic bytes: %PDF
        assert_eq!(&doc.bytes[0..4], b"%PDF");
        assert_eq!(doc.suggested_filename, "prescription_Ravi_Kumar_10-19-2026.pdf");
    }

    #[test]
    fn pdf_output_is_deterministic() {
        let render = || {
            compose_prescription_document(
                &patient("Ravi Kumar"),
                &doctor(),
                &prescription("Viral fever", Some("Rest")),
                date(),
            )
            .unwrap()
        };
        assert_eq!(render().bytes, render().bytes);
    }

    #[test]
    fn different_content_gives_different_pdf() {
        let a = compose_prescription_document(&patient("Ravi"), &doctor(), &prescription("Viral fever", None), date()).unwrap();
        let b = compose_prescription_document(&patient("Ravi"), &doctor(), &prescription("Migraine", None), date()).unwrap();
        assert_ne!(a.bytes, b.bytes);
    }

    #[test]
    fn pin_trailer_id_rewrites_both_strings() {
        let mut pdf = b"xref\ntrailer\n<</Root 1 0 R/ID[(AAAA)(RANDOM)]>>\n%%EOF".to_vec();
        pin_trailer_id(&mut pdf, b"0123456789");
        let out = String::from_utf8(pdf).unwrap();
        assert!(out.contains("/ID[(0123)(012345)]"));
    }

    #[test]
    fn pin_trailer_id_without_id_is_noop() {
        let mut pdf = b"%PDF-1.3 no trailer id".to_vec();
        let before = pdf.clone();
        pin_trailer_id(&mut pdf, b"abc");
        assert_eq!(pdf, before);
    }

    #[test]
    fn export_writes_file_under_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("exports");
        let exporter = PdfExporter::new(&dir);

        let path = exporter
            .export(&patient("Ravi Kumar"), &doctor(), &prescription("Viral fever", None), date())
            .unwrap();

        assert!(path.exists());
        assert!(path.starts_with(&dir));
        assert!(path.ends_with("prescription_Ravi_Kumar_10-19-2026.pdf"));
        assert_eq!(&std::fs::read(&path).unwrap()[0..4], b"%PDF");
    }

    #[test]
    fn test_wrap_text() {
        let text = "This is a long sentence that should be wrapped at around forty characters or so.";
        let lines = wrap_text(text, 40);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.len() <= 40);
        }
    }

    #[test]
    fn test_wrap_text_empty() {
        let lines = wrap_text("", 40);
        assert_eq!(lines.len(), 1);
    }
}
