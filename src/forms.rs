//! Multipart form decoding and field validation for write requests.
//!
//! A request body is first collected into [`FormData`], then parsed into one of the typed forms
//! below. Parsing collects every field problem before failing, so a client sees all of them at once.
//! Uploaded files stay in memory until the handler streams them to storage.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use axum::{
    body::Bytes,
    extract::{Multipart, multipart::MultipartRejection},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::{error::AppError, models::BannerType};

/// The multipart extractor as handlers take it, so a rejected body still reaches `AppError`.
pub type MultipartRequest = Result<Multipart, MultipartRejection>;

const MAX_CHAR_FIELD: usize = 255;
const PRICE_MAX_DIGITS: u32 = 10;
const PRICE_DECIMAL_PLACES: u32 = 2;

/// UploadedFile
///
/// One file part of a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// The lowercase file extension, falling back to `bin`.
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "bin".to_string())
    }

    fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    fn is_pdf(&self) -> bool {
        self.content_type == "application/pdf" || self.extension() == "pdf"
    }
}

/// FormData
///
/// Text fields and file parts of a multipart body, keyed by field name in arrival order.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    texts: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<UploadedFile>>,
}

impl FormData {
    /// Drains a multipart body. A part carrying a file name is a file, anything else is text.
    pub async fn from_multipart(multipart: MultipartRequest) -> Result<Self, AppError> {
        let mut multipart = multipart?;
        let mut form = FormData::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await.map_err(|e| {
                        AppError::Validation(format!("{name}: could not read upload: {e}"))
                    })?;
                    form.insert_file(name, UploadedFile::new(file_name, content_type, bytes));
                }
                None => {
                    let text = field.text().await.map_err(|e| {
                        AppError::Validation(format!("{name}: could not read field: {e}"))
                    })?;
                    form.insert_text(name, text);
                }
            }
        }
        Ok(form)
    }

    pub fn insert_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.texts.entry(name.into()).or_default().push(value.into());
    }

    pub fn insert_file(&mut self, name: impl Into<String>, file: UploadedFile) {
        self.files.entry(name.into()).or_default().push(file);
    }

    /// The last value sent for a text field, trimmed.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .get(name)
            .and_then(|values| values.last())
            .map(|value| value.trim())
    }

    pub fn texts(&self, name: &str) -> &[String] {
        self.texts.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name).and_then(|files| files.last())
    }

    pub fn files(&self, name: &str) -> &[UploadedFile] {
        self.files.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

/// FormMode
///
/// Which fields a write must carry: everything on create, every text field on a full update
/// (files may be omitted to keep the stored ones), nothing in particular on a partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Replace,
    Patch,
}

impl FormMode {
    fn requires_text(self) -> bool {
        matches!(self, FormMode::Create | FormMode::Replace)
    }

    fn requires_files(self) -> bool {
        self == FormMode::Create
    }
}

/// Per-field error collector.
#[derive(Debug, Default)]
struct Violations(BTreeMap<String, String>);

impl Violations {
    fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    fn finish<T>(self, value: T) -> Result<T, AppError> {
        if self.0.is_empty() {
            return Ok(value);
        }
        let message = self
            .0
            .into_iter()
            .map(|(field, msg)| format!("{field}: {msg}"))
            .collect::<Vec<_>>()
            .join("; ");
        Err(AppError::Validation(message))
    }
}

/// Field readers shared by every form; each records its own violation.
struct Reader<'a> {
    form: &'a FormData,
    mode: FormMode,
    violations: Violations,
}

impl<'a> Reader<'a> {
    fn new(form: &'a FormData, mode: FormMode) -> Self {
        Self {
            form,
            mode,
            violations: Violations::default(),
        }
    }

    fn char_field(&mut self, name: &str, required: bool) -> Option<String> {
        match self.form.text(name) {
            Some(value) if !value.is_empty() => {
                if value.chars().count() > MAX_CHAR_FIELD {
                    self.violations.add(
                        name,
                        format!("Ensure this field has no more than {MAX_CHAR_FIELD} characters."),
                    );
                    return None;
                }
                Some(value.to_string())
            }
            Some(_) if required => {
                self.violations.add(name, "This field may not be blank.");
                None
            }
            None if required && self.mode.requires_text() => {
                self.violations.add(name, "This field is required.");
                None
            }
            _ => None,
        }
    }

    fn text_field(&mut self, name: &str, required: bool) -> Option<String> {
        match self.form.text(name) {
            Some(value) if !value.is_empty() => Some(value.to_string()),
            Some(_) if required => {
                self.violations.add(name, "This field may not be blank.");
                None
            }
            None if required && self.mode.requires_text() => {
                self.violations.add(name, "This field is required.");
                None
            }
            _ => None,
        }
    }

    fn parsed<T>(&mut self, name: &str, required: bool, what: &str) -> Option<T>
    where
        T: FromStr,
    {
        let raw = self.text_field(name, required)?;
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.violations.add(name, format!("'{raw}' is not a valid {what}."));
                None
            }
        }
    }

    fn date(&mut self, name: &str) -> Option<NaiveDate> {
        let raw = self.text_field(name, true)?;
        match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.violations
                    .add(name, "Date has wrong format. Use YYYY-MM-DD.");
                None
            }
        }
    }

    fn price(&mut self, name: &str) -> Option<Decimal> {
        let price: Decimal = self.parsed(name, true, "number")?;
        let digits = price.abs().trunc().to_string().trim_start_matches('0').len() as u32;
        if price.is_sign_negative() {
            self.violations.add(name, "Ensure this value is greater than or equal to 0.");
        } else if price.normalize().scale() > PRICE_DECIMAL_PLACES {
            self.violations.add(
                name,
                format!("Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."),
            );
        } else if digits > PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES {
            self.violations.add(
                name,
                format!(
                    "Ensure that there are no more than {} digits before the decimal point.",
                    PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES
                ),
            );
        } else {
            let mut price = price.round_dp(PRICE_DECIMAL_PLACES);
            price.rescale(PRICE_DECIMAL_PLACES);
            return Some(price);
        }
        None
    }

    fn boolean(&mut self, name: &str) -> Option<bool> {
        let raw = self.form.text(name)?;
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => {
                self.violations.add(name, "Must be a valid boolean.");
                None
            }
        }
    }

    fn id(&mut self, name: &str, required: bool) -> Option<i64> {
        self.parsed(name, required, "id")
    }

    fn image(&mut self, name: &str, required: bool) -> Option<UploadedFile> {
        match self.form.file(name) {
            Some(file) if file.bytes.is_empty() => {
                self.violations.add(name, "The submitted file is empty.");
                None
            }
            Some(file) if !file.is_image() => {
                self.violations.add(
                    name,
                    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
                );
                None
            }
            Some(file) => Some(file.clone()),
            None if required && self.mode.requires_files() => {
                self.violations.add(name, "No file was submitted.");
                None
            }
            None => None,
        }
    }

    fn pdf(&mut self, name: &str) -> Option<UploadedFile> {
        let file = self.form.file(name)?;
        if file.bytes.is_empty() || !file.is_pdf() {
            self.violations.add(name, "Upload a valid PDF document.");
            return None;
        }
        Some(file.clone())
    }

    /// Supplementary `images` with their positional `captions`.
    fn gallery(&mut self) -> Vec<(UploadedFile, Option<String>)> {
        let captions = self.form.texts("captions");
        let mut gallery = Vec::new();
        for (index, file) in self.form.files("images").iter().enumerate() {
            if file.bytes.is_empty() || !file.is_image() {
                self.violations.add(
                    "images",
                    format!("File #{} ('{}') is not a valid image.", index + 1, file.file_name),
                );
                continue;
            }
            let caption = captions
                .get(index)
                .map(|caption| caption.trim().to_string())
                .filter(|caption| !caption.is_empty());
            gallery.push((file.clone(), caption));
        }
        gallery
    }
}

/// RegionForm
#[derive(Debug, Clone)]
pub struct RegionForm {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub thumbnail: Option<UploadedFile>,
}

impl RegionForm {
    pub fn parse(form: &FormData, mode: FormMode) -> Result<Self, AppError> {
        let mut reader = Reader::new(form, mode);
        let parsed = RegionForm {
            name: reader.char_field("name", true),
            is_active: reader.boolean("is_active"),
            thumbnail: reader.image("thumbnail", false),
        };
        reader.violations.finish(parsed)
    }
}

/// TourForm
///
/// The fields shared by domestic and international tours. `description` also accepts the
/// `tour_info` field name.
#[derive(Debug, Clone)]
pub struct TourForm {
    pub name: Option<String>,
    pub airline: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub thumbnail: Option<UploadedFile>,
    pub tour_program_pdf: Option<UploadedFile>,
    pub images: Vec<(UploadedFile, Option<String>)>,
}

impl TourForm {
    pub fn parse(form: &FormData, mode: FormMode) -> Result<Self, AppError> {
        let mut reader = Reader::new(form, mode);
        let parsed = Self::read(&mut reader);
        reader.violations.finish(parsed)
    }

    fn read(reader: &mut Reader<'_>) -> Self {
        let description_field = if reader.form.text("description").is_none()
            && reader.form.text("tour_info").is_some()
        {
            "tour_info"
        } else {
            "description"
        };
        let parsed = TourForm {
            name: reader.char_field("name", true),
            airline: reader.char_field("airline", true),
            start_date: reader.date("start_date"),
            end_date: reader.date("end_date"),
            price: reader.price("price"),
            description: reader.text_field(description_field, true),
            is_active: reader.boolean("is_active"),
            thumbnail: reader.image("thumbnail", true),
            tour_program_pdf: reader.pdf("tour_program_pdf"),
            images: reader.gallery(),
        };
        if let (Some(start), Some(end)) = (parsed.start_date, parsed.end_date) {
            if end < start {
                reader
                    .violations
                    .add("end_date", "End date must not be before the start date.");
            }
        }
        parsed
    }
}

/// InternationalTourForm
#[derive(Debug, Clone)]
pub struct InternationalTourForm {
    pub tour: TourForm,
    pub region_id: Option<i64>,
}

impl InternationalTourForm {
    pub fn parse(form: &FormData, mode: FormMode) -> Result<Self, AppError> {
        let mut reader = Reader::new(form, mode);
        let tour = TourForm::read(&mut reader);
        let region_id = reader.id("region_id", mode == FormMode::Create);
        reader
            .violations
            .finish(InternationalTourForm { tour, region_id })
    }
}

/// BannerForm
#[derive(Debug, Clone)]
pub struct BannerForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<UploadedFile>,
    pub banner_type: Option<BannerType>,
    pub is_active: Option<bool>,
}

impl BannerForm {
    pub fn parse(form: &FormData, mode: FormMode) -> Result<Self, AppError> {
        let mut reader = Reader::new(form, mode);
        let banner_type = match reader.text_field("type", false) {
            Some(raw) => match raw.parse::<BannerType>() {
                Ok(kind) => Some(kind),
                Err(e) => {
                    reader.violations.add("type", e.to_string());
                    None
                }
            },
            None => None,
        };
        let parsed = BannerForm {
            title: reader.char_field("title", true),
            description: reader.text_field("description", false),
            image: reader.image("image", true),
            banner_type,
            is_active: reader.boolean("is_active"),
        };
        reader.violations.finish(parsed)
    }
}

/// RegionBannerForm
#[derive(Debug, Clone)]
pub struct RegionBannerForm {
    pub image: UploadedFile,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl RegionBannerForm {
    /// Region banners are only ever created through the API.
    pub fn parse(form: &FormData) -> Result<Self, AppError> {
        let mut reader = Reader::new(form, FormMode::Create);
        let image = reader.image("image", true);
        let title = reader.char_field("title", false);
        let description = reader.text_field("description", false);
        let is_active = reader.boolean("is_active");
        match reader.violations.finish((image, title, description, is_active))? {
            (Some(image), title, description, is_active) => Ok(RegionBannerForm {
                image,
                title,
                description,
                is_active,
            }),
            (None, ..) => Err(AppError::Validation(
                "image: No file was submitted.".to_string(),
            )),
        }
    }
}
