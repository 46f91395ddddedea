use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use tour_cms::{
    AppError,
    forms::{
        BannerForm, FormData, FormMode, InternationalTourForm, RegionBannerForm, RegionForm,
        TourForm, UploadedFile,
    },
    models::BannerType,
};

fn png(name: &str) -> UploadedFile {
    UploadedFile::new(name, "image/png", b"png-bytes".to_vec())
}

fn tour_data() -> FormData {
    let mut form = FormData::default();
    form.insert_text("name", "Paris Tour");
    form.insert_text("airline", "Sky Air");
    form.insert_text("start_date", "2025-06-01");
    form.insert_text("end_date", "2025-06-08");
    form.insert_text("price", "1499.9");
    form.insert_text("description", "Seven nights.");
    form.insert_file("thumbnail", png("cover.png"));
    form
}

fn validation_message(err: AppError) -> String {
    match err {
        AppError::Validation(msg) => msg,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

// --- FormData ---

#[test]
fn test_form_data_keeps_last_text_and_every_file() {
    let mut form = FormData::default();
    form.insert_text("name", " first ");
    form.insert_text("name", " second ");
    form.insert_file("images", png("a.png"));
    form.insert_file("images", png("b.png"));

    assert_eq!(form.text("name"), Some("second"));
    assert_eq!(form.texts("name").len(), 2);
    assert_eq!(form.files("images").len(), 2);
    assert_eq!(form.file("images").map(|f| f.file_name.as_str()), Some("b.png"));
    assert!(form.text("missing").is_none());
    assert!(form.files("missing").is_empty());
}

#[test]
fn test_uploaded_file_extension() {
    assert_eq!(png("Cover.PNG").extension(), "png");
    assert_eq!(png("no-extension").extension(), "bin");
}

// --- Tours ---

#[test]
fn test_tour_form_parses_complete_create() {
    let parsed = TourForm::parse(&tour_data(), FormMode::Create).unwrap();

    assert_eq!(parsed.name.as_deref(), Some("Paris Tour"));
    assert_eq!(parsed.start_date, NaiveDate::from_ymd_opt(2025, 6, 1));
    assert_eq!(parsed.price.map(|p| p.to_string()).as_deref(), Some("1499.90"));
    assert_eq!(parsed.is_active, None);
    assert!(parsed.thumbnail.is_some());
    assert!(parsed.tour_program_pdf.is_none());
    assert!(parsed.images.is_empty());
}

#[test]
fn test_tour_form_reports_missing_fields_on_create() {
    let err = TourForm::parse(&FormData::default(), FormMode::Create).unwrap_err();
    let message = validation_message(err);
    for field in ["airline", "description", "end_date", "name", "price", "start_date", "thumbnail"] {
        assert!(message.contains(&format!("{field}: ")), "{field} missing in {message}");
    }
    // Fields are reported in name order.
    assert!(message.starts_with("airline: This field is required."));
}

#[test]
fn test_tour_form_patch_accepts_empty_body() {
    let parsed = TourForm::parse(&FormData::default(), FormMode::Patch).unwrap();
    assert!(parsed.name.is_none());
    assert!(parsed.thumbnail.is_none());
}

#[test]
fn test_tour_form_replace_needs_text_but_not_files() {
    let mut form = tour_data();
    form.insert_text("name", "Renamed");
    let mut without_thumbnail = FormData::default();
    for field in ["name", "airline", "start_date", "end_date", "price", "description"] {
        without_thumbnail.insert_text(field, form.text(field).unwrap());
    }
    assert!(TourForm::parse(&without_thumbnail, FormMode::Replace).is_ok());

    let err = TourForm::parse(&FormData::default(), FormMode::Replace).unwrap_err();
    let message = validation_message(err);
    assert!(message.contains("name: This field is required."));
    assert!(!message.contains("thumbnail"));
}

#[test]
fn test_tour_form_rejects_blank_required_text() {
    let mut form = tour_data();
    form.insert_text("name", "   ");
    let message = validation_message(TourForm::parse(&form, FormMode::Patch).unwrap_err());
    assert_eq!(message, "name: This field may not be blank.");
}

#[test]
fn test_tour_form_price_rules() {
    let cases = [
        ("-1", "greater than or equal to 0"),
        ("10.999", "no more than 2 decimal places"),
        ("123456789", "no more than 8 digits"),
        ("cheap", "is not a valid number"),
    ];
    for (raw, expected) in cases {
        let mut form = tour_data();
        form.insert_text("price", raw);
        let message = validation_message(TourForm::parse(&form, FormMode::Create).unwrap_err());
        assert!(message.starts_with("price: "), "{raw}: {message}");
        assert!(message.contains(expected), "{raw}: {message}");
    }

    let mut form = tour_data();
    form.insert_text("price", "99999999.99");
    let parsed = TourForm::parse(&form, FormMode::Create).unwrap();
    assert_eq!(parsed.price, Some(Decimal::from_str("99999999.99").unwrap()));

    // Trailing zeros beyond two places are fine.
    form.insert_text("price", "12.500");
    let parsed = TourForm::parse(&form, FormMode::Create).unwrap();
    assert_eq!(parsed.price.map(|p| p.to_string()).as_deref(), Some("12.50"));
}

#[test]
fn test_tour_form_dates() {
    let mut form = tour_data();
    form.insert_text("start_date", "2025/06/01");
    let message = validation_message(TourForm::parse(&form, FormMode::Create).unwrap_err());
    assert_eq!(message, "start_date: Date has wrong format. Use YYYY-MM-DD.");

    let mut form = tour_data();
    form.insert_text("end_date", "2025-05-31");
    let message = validation_message(TourForm::parse(&form, FormMode::Create).unwrap_err());
    assert_eq!(message, "end_date: End date must not be before the start date.");

    // A single-day tour is valid.
    let mut form = tour_data();
    form.insert_text("end_date", "2025-06-01");
    assert!(TourForm::parse(&form, FormMode::Create).is_ok());
}

#[test]
fn test_tour_form_tour_info_alias() {
    let mut form = FormData::default();
    form.insert_text("tour_info", "Alias text");
    let parsed = TourForm::parse(&form, FormMode::Patch).unwrap();
    assert_eq!(parsed.description.as_deref(), Some("Alias text"));

    // `description` wins when both are sent.
    form.insert_text("description", "Primary text");
    let parsed = TourForm::parse(&form, FormMode::Patch).unwrap();
    assert_eq!(parsed.description.as_deref(), Some("Primary text"));
}

#[test]
fn test_tour_form_files() {
    let mut form = tour_data();
    form.insert_file(
        "tour_program_pdf",
        UploadedFile::new("program.pdf", "application/octet-stream", b"%PDF".to_vec()),
    );
    form.insert_file("images", png("one.png"));
    form.insert_file("images", png("two.png"));
    form.insert_text("captions", "First");
    let parsed = TourForm::parse(&form, FormMode::Create).unwrap();
    assert!(parsed.tour_program_pdf.is_some());
    assert_eq!(parsed.images.len(), 2);
    assert_eq!(parsed.images[0].1.as_deref(), Some("First"));
    assert_eq!(parsed.images[1].1, None);

    let mut form = tour_data();
    form.insert_file("thumbnail", UploadedFile::new("doc.txt", "text/plain", b"x".to_vec()));
    form.insert_file("images", UploadedFile::new("empty.png", "image/png", Vec::new()));
    form.insert_file("tour_program_pdf", png("program.png"));
    let message = validation_message(TourForm::parse(&form, FormMode::Create).unwrap_err());
    assert!(message.contains("images: File #1 ('empty.png') is not a valid image."));
    assert!(message.contains("thumbnail: Upload a valid image."));
    assert!(message.contains("tour_program_pdf: Upload a valid PDF document."));
}

#[test]
fn test_tour_form_is_active_values() {
    for (raw, expected) in [("true", true), ("On", true), ("1", true), ("no", false), ("0", false)] {
        let mut form = FormData::default();
        form.insert_text("is_active", raw);
        let parsed = TourForm::parse(&form, FormMode::Patch).unwrap();
        assert_eq!(parsed.is_active, Some(expected), "{raw}");
    }
    let mut form = FormData::default();
    form.insert_text("is_active", "sometimes");
    let message = validation_message(TourForm::parse(&form, FormMode::Patch).unwrap_err());
    assert_eq!(message, "is_active: Must be a valid boolean.");
}

#[test]
fn test_char_fields_are_bounded() {
    let mut form = FormData::default();
    form.insert_text("airline", "x".repeat(256));
    let message = validation_message(TourForm::parse(&form, FormMode::Patch).unwrap_err());
    assert!(message.starts_with("airline: Ensure this field has no more than 255 characters."));
}

// --- International Tours ---

#[test]
fn test_international_form_requires_region_on_create_only() {
    let message =
        validation_message(InternationalTourForm::parse(&tour_data(), FormMode::Create).unwrap_err());
    assert_eq!(message, "region_id: This field is required.");

    let parsed = InternationalTourForm::parse(&tour_data(), FormMode::Patch).unwrap();
    assert_eq!(parsed.region_id, None);

    let mut form = tour_data();
    form.insert_text("region_id", "3");
    let parsed = InternationalTourForm::parse(&form, FormMode::Create).unwrap();
    assert_eq!(parsed.region_id, Some(3));

    form.insert_text("region_id", "europe");
    let message = validation_message(InternationalTourForm::parse(&form, FormMode::Create).unwrap_err());
    assert_eq!(message, "region_id: 'europe' is not a valid id.");
}

// --- Regions and Banners ---

#[test]
fn test_region_form() {
    let mut form = FormData::default();
    form.insert_text("name", "Alps");
    form.insert_text("is_active", "false");
    let parsed = RegionForm::parse(&form, FormMode::Create).unwrap();
    assert_eq!(parsed.name.as_deref(), Some("Alps"));
    assert_eq!(parsed.is_active, Some(false));
    assert!(parsed.thumbnail.is_none());

    let message =
        validation_message(RegionForm::parse(&FormData::default(), FormMode::Create).unwrap_err());
    assert_eq!(message, "name: This field is required.");
}

#[test]
fn test_banner_form_type() {
    let mut form = FormData::default();
    form.insert_text("title", "Hello");
    form.insert_file("image", png("hero.png"));
    let parsed = BannerForm::parse(&form, FormMode::Create).unwrap();
    assert_eq!(parsed.banner_type, None);

    form.insert_text("type", "international");
    let parsed = BannerForm::parse(&form, FormMode::Create).unwrap();
    assert_eq!(parsed.banner_type, Some(BannerType::International));

    form.insert_text("type", "landing");
    let message = validation_message(BannerForm::parse(&form, FormMode::Create).unwrap_err());
    assert!(message.starts_with("type: "), "{message}");
}

#[test]
fn test_region_banner_form_requires_image() {
    let mut form = FormData::default();
    form.insert_text("title", "Winter");
    let message = validation_message(RegionBannerForm::parse(&form).unwrap_err());
    assert_eq!(message, "image: No file was submitted.");

    form.insert_file("image", png("winter.png"));
    let parsed = RegionBannerForm::parse(&form).unwrap();
    assert_eq!(parsed.title.as_deref(), Some("Winter"));
    assert_eq!(parsed.is_active, None);
}
