use super::codes::{format_code, next_sequence};
use super::validation::{
    normalize_email, parse_date, validate_length, validate_password, validate_phone,
    validate_pincode, validate_positive,
};
use super::{PaginationParams, SortOrder, build_page};
use crate::error::AppError;
use crate::management::response::Pagination;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn pagination_params_apply_defaults_and_limits() {
    let params = PaginationParams::new(Some(0), Some(200), 20, 100);
    assert_eq!(params.page, 1, "page 应回退到最小值 1");
    assert_eq!(params.limit, 100, "limit 应被限制在最大值内");
    assert_eq!(params.offset(), 0, "第一页 offset 应为 0");

    let defaults = PaginationParams::new(None, None, 25, 100);
    assert_eq!(defaults.limit, 25);
}

#[test]
fn pagination_offset_saturates_on_huge_page() {
    let params = PaginationParams::new(Some(u64::MAX), Some(10), 10, 100);
    assert_eq!(params.page, u64::MAX);
    assert_eq!(params.offset(), i64::MAX.unsigned_abs());

    let params = PaginationParams::new(Some(3), Some(10), 10, 100);
    assert_eq!(params.offset(), 20);
}

#[test]
fn build_page_computes_pages_and_into_response() {
    let params = PaginationParams::new(Some(2), Some(15), 20, 50);
    let info = build_page(95, params);
    assert_eq!(info.pages, 7);

    let response: Pagination = info.into();
    assert_eq!(
        response,
        Pagination {
            page: 2,
            limit: 15,
            total: 95,
            pages: 7
        }
    );
    assert_eq!(build_page(0, params).pages, 0);
}

#[rstest]
#[case(Some("asc"), SortOrder::Asc)]
#[case(Some("ASC"), SortOrder::Asc)]
#[case(Some("desc"), SortOrder::Desc)]
#[case(Some("sideways"), SortOrder::Desc)]
#[case(None, SortOrder::Desc)]
fn sort_order_defaults_to_desc(#[case] raw: Option<&str>, #[case] expected: SortOrder) {
    assert_eq!(SortOrder::parse(raw), expected);
}

#[rstest]
#[case(&[], "HO", 1)]
#[case(&["HO001", "HO002", "FR009"], "HO", 3)]
#[case(&["FR009", "HO120"], "FR", 10)]
#[case(&["HO999", "HO1000"], "HO", 1001)]
#[case(&["ADMIN001", "HOX12", "HO"], "HO", 1)]
fn next_sequence_uses_highest_numeric_suffix(
    #[case] existing: &[&str],
    #[case] prefix: &str,
    #[case] expected: u64,
) {
    assert_eq!(next_sequence(existing.iter().copied(), prefix), expected);
}

#[test]
fn format_code_pads_to_width() {
    assert_eq!(format_code("HO", 1, 3), "HO001");
    assert_eq!(format_code("FR", 7, 4), "FR0007");
    assert_eq!(format_code("HO", 1234, 3), "HO1234");
}

#[test]
fn email_is_normalised_and_checked() {
    assert_eq!(normalize_email("  Asha@Example.COM ").unwrap(), "asha@example.com");
    assert!(normalize_email("not-an-email").is_err());
    assert!(normalize_email("a@b").is_err());
}

#[rstest]
#[case("9876543210", true)]
#[case("987654321", false)]
#[case("98765432100", false)]
#[case("98765x3210", false)]
fn phone_must_be_ten_digits(#[case] phone: &str, #[case] ok: bool) {
    assert_eq!(validate_phone(phone).is_ok(), ok);
}

#[test]
fn field_rules() {
    assert!(validate_pincode("560001").is_ok());
    assert!(validate_pincode("5600").is_err());
    assert!(validate_password("12345678").is_ok());
    assert!(validate_password("1234567").is_err());
    assert!(validate_positive("baseSalary", 1.0).is_ok());
    assert!(validate_positive("baseSalary", 0.0).is_err());
    assert!(validate_positive("baseSalary", f64::NAN).is_err());
    assert!(parse_date("effectiveFrom", "2024-02-29").is_ok());
    assert!(parse_date("effectiveFrom", "29/02/2024").is_err());
}

#[test]
fn length_errors_name_the_field() {
    assert!(validate_length("name", "Al", 2, 100).is_ok());
    match validate_length("name", " A ", 2, 100) {
        Err(AppError::Validation { field, message }) => {
            assert_eq!(field.as_deref(), Some("name"));
            assert_eq!(message, "name must be at least 2 characters");
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(validate_length("name", &"x".repeat(101), 2, 100).is_err());
}
