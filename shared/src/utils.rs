// String helpers shared by the CSV reader and the command line parser.

/// Case-sensitive prefix test. An empty prefix matches every text.
pub fn starts_with(text: &str, prefix: &str) -> bool {
    text.as_bytes().get(..prefix.len()) == Some(prefix.as_bytes())
}

// Conversion of field text into typed values, as used for typed CSV reads
// and for command line value options.
pub mod convert {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use tracing::warn;

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y"];
    const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];
    const DATE_TIME_FORMATS: &[&str] =
        &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"];

    /// Builds a value out of a single field of text.
    ///
    /// Plain numeric types follow stream extraction rules: leading whitespace is
    /// skipped, the longest numeric prefix is used and anything unparsable yields
    /// the type's default. The `Option` variants are strict and return `None`
    /// unless the whole trimmed text is a valid value.
    pub trait FromField: Sized {
        fn from_field(text: &str) -> Self;
    }

    pub fn to<T: FromField>(text: &str) -> T {
        T::from_field(text)
    }

    impl FromField for String {
        fn from_field(text: &str) -> Self {
            text.to_string()
        }
    }

    impl FromField for bool {
        fn from_field(text: &str) -> Self {
            match text.trim() {
                "1" | "true" => true,
                "0" | "false" | "" => false,
                other => {
                    warn!(field = other, "Unrecognised boolean field, using false");
                    false
                }
            }
        }
    }

    impl FromField for char {
        fn from_field(text: &str) -> Self {
            text.trim_start().chars().next().unwrap_or('\0')
        }
    }

    // Returns the optionally signed run of digits at the start of `text`.
    fn integer_prefix(text: &str) -> &str {
        let bytes = text.as_bytes();
        let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
        let digits_start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end == digits_start {
            ""
        } else {
            &text[..end]
        }
    }

    // Returns the decimal number (sign, mantissa and optional exponent) at the start of `text`.
    fn float_prefix(text: &str) -> &str {
        let bytes = text.as_bytes();
        let count_digits =
            |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

        let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
        let mut digits = count_digits(end);
        end += digits;
        if bytes.get(end) == Some(&b'.') {
            let fraction = count_digits(end + 1);
            digits += fraction;
            end += 1 + fraction;
        }
        if digits == 0 {
            return "";
        }
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp_end = end + 1;
            if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
                exp_end += 1;
            }
            let exp_digits = count_digits(exp_end);
            if exp_digits > 0 {
                end = exp_end + exp_digits;
            }
        }
        &text[..end]
    }

    macro_rules! impl_numeric_field {
        ($prefix:ident => $($t:ty),+) => {
            $(
                impl FromField for $t {
                    fn from_field(text: &str) -> Self {
                        let candidate = $prefix(text.trim_start());
                        match candidate.parse::<$t>() {
                            Ok(value) => value,
                            Err(e) => {
                                if !text.trim().is_empty() {
                                    warn!(
                                        field = text,
                                        error = %e,
                                        "Could not convert field to {}, using default",
                                        stringify!($t)
                                    );
                                }
                                <$t>::default()
                            }
                        }
                    }
                }

                impl FromField for Option<$t> {
                    fn from_field(text: &str) -> Self {
                        text.trim().parse::<$t>().ok()
                    }
                }
            )+
        };
    }

    impl_numeric_field!(integer_prefix => i8, i16, i32, i64, i128, isize);
    impl_numeric_field!(integer_prefix => u8, u16, u32, u64, u128, usize);
    impl_numeric_field!(float_prefix => f32, f64);

    impl FromField for Option<NaiveDate> {
        fn from_field(text: &str) -> Self {
            let text = text.trim();
            DATE_FORMATS.iter().find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        }
    }

    impl FromField for Option<NaiveTime> {
        fn from_field(text: &str) -> Self {
            let text = text.trim();
            TIME_FORMATS.iter().find_map(|format| NaiveTime::parse_from_str(text, format).ok())
        }
    }

    impl FromField for Option<NaiveDateTime> {
        fn from_field(text: &str) -> Self {
            let text = text.trim();
            DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::{Datelike, Timelike};

        #[test]
        fn test_integer_extraction_uses_leading_digits() {
            assert_eq!(to::<i32>("42"), 42);
            assert_eq!(to::<i32>("  -17abc"), -17);
            assert_eq!(to::<u64>("+8"), 8);
        }

        #[test]
        fn test_integer_extraction_falls_back_to_default() {
            assert_eq!(to::<i32>("abc"), 0);
            assert_eq!(to::<i32>(""), 0);
            assert_eq!(to::<u8>("300"), 0);
            assert_eq!(to::<u32>("-5"), 0);
        }

        #[test]
        fn test_float_extraction() {
            assert_eq!(to::<f64>("3.25"), 3.25);
            assert_eq!(to::<f64>(" 1e3 items"), 1000.0);
            assert_eq!(to::<f64>("2.5e"), 2.5);
            assert_eq!(to::<f64>(".5"), 0.5);
            assert_eq!(to::<f64>("-"), 0.0);
        }

        #[test]
        fn test_strict_optional_numbers() {
            assert_eq!(to::<Option<i32>>(" 12 "), Some(12));
            assert_eq!(to::<Option<i32>>("12x"), None);
            assert_eq!(to::<Option<f64>>(""), None);
        }

        #[test]
        fn test_text_bool_and_char() {
            assert_eq!(to::<String>("  keep spaces "), "  keep spaces ");
            assert!(to::<bool>("1"));
            assert!(to::<bool>("true"));
            assert!(!to::<bool>("0"));
            assert!(!to::<bool>("yes"));
            assert_eq!(to::<char>("  xyz"), 'x');
            assert_eq!(to::<char>(""), '\0');
        }

        #[test]
        fn test_dates_and_times() {
            let iso = to::<Option<NaiveDate>>("2024-12-30").unwrap();
            let local = to::<Option<NaiveDate>>("30/12/2024").unwrap();
            assert_eq!(iso, local);
            assert_eq!(iso.year(), 2024);
            assert_eq!(iso.month(), 12);
            assert_eq!(iso.day(), 30);

            let time = to::<Option<NaiveTime>>("18:20").unwrap();
            assert_eq!(time.hour(), 18);
            assert_eq!(time.minute(), 20);

            let stamp = to::<Option<NaiveDateTime>>("2024-12-30T18:20:05").unwrap();
            assert_eq!(stamp.second(), 5);

            assert!(to::<Option<NaiveDate>>("2024/12/30").is_none());
            assert!(to::<Option<NaiveTime>>("25:00:00").is_none());
        }
    }
}
