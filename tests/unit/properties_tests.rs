// Metadata properties codec unit tests

use restcache::cache::properties::Properties;
use rstest::rstest;

#[rstest]
#[case::equals("status=200", "status", "200")]
#[case::colon("status:200", "status", "200")]
#[case::whitespace("status 200", "status", "200")]
#[case::padded_separator("status = 200", "status", "200")]
#[case::escaped_separator("Set-Cookie=a\\=b", "Set-Cookie", "a=b")]
#[case::unicode_escape("Content-Type=text/plain; charset\\=caf\\u00E9", "Content-Type", "text/plain; charset=café")]
fn test_parse_line_forms(#[case] text: &str, #[case] key: &str, #[case] value: &str) {
    let props = Properties::parse(text).unwrap();
    assert_eq!(props.get(key), Some(value));
}

#[test]
fn test_comments_and_blank_lines_skipped() {
    let props = Properties::parse("#Mon Jan 01 00:00:00 UTC 2024\n\n! other\nstatus=404\n").unwrap();
    assert_eq!(props.len(), 1);
    assert_eq!(props.get("status"), Some("404"));
}

#[test]
fn test_line_continuation() {
    let props = Properties::parse("Set-Cookie=a\\\n    b\n").unwrap();
    assert_eq!(props.get("Set-Cookie"), Some("ab"));
}

#[test]
fn test_multi_line_cookie_survives_write_and_read() {
    let mut props = Properties::new();
    props.set("status", "200");
    props.set("Set-Cookie", "a=1; Path=/\nb=2");

    let text = props.to_text(None);
    assert_eq!(text.lines().count(), 2, "Newlines must be escaped");

    let parsed = Properties::parse(&text).unwrap();
    assert_eq!(parsed.get("Set-Cookie"), Some("a=1; Path=/\nb=2"));
}

#[test]
fn test_malformed_unicode_escape_rejected() {
    assert!(Properties::parse("key=\\u12").is_err());
}
