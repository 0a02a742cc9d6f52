//! Admission-number formatting.
//!
//! A school's configuration (format kind, prefix, padding) plus a year and a
//! sequence number deterministically yield the identifier string. Sequence
//! allocation lives in the database layer; this module only formats.

use crate::models::AdmissionNumberFormat;

pub const DEFAULT_SEQ_PADDING: u16 = 4;

/// A school's effective admission-number configuration.
#[derive(Debug, Clone)]
pub struct AdmissionNumberSpec {
    pub format: AdmissionNumberFormat,
    pub prefix: String,
    pub padding: u16,
}

impl Default for AdmissionNumberSpec {
    /// Fallback for schools with no configured format.
    fn default() -> Self {
        Self {
            format: AdmissionNumberFormat::YearSeq,
            prefix: String::new(),
            padding: DEFAULT_SEQ_PADDING,
        }
    }
}

impl AdmissionNumberSpec {
    pub fn new(format: AdmissionNumberFormat, prefix: &str, padding: i16) -> Self {
        Self {
            format,
            prefix: prefix.to_string(),
            // Padding below 1 means an unconfigured row; use the default.
            padding: if padding >= 1 {
                padding as u16
            } else {
                DEFAULT_SEQ_PADDING
            },
        }
    }

    /// The prefix that keys the sequence counter. YEAR_SEQ uses the empty
    /// prefix so its counter is distinct from any prefixed series.
    pub fn sequence_prefix(&self) -> &str {
        match self.format {
            AdmissionNumberFormat::PrefixYearSeq => &self.prefix,
            _ => "",
        }
    }
}

/// Format an identifier, or `None` for CUSTOM (caller supplies the value
/// manually; the generator must not overwrite it).
pub fn format_admission_number(spec: &AdmissionNumberSpec, year: i32, seq: i64) -> Option<String> {
    let width = spec.padding as usize;
    match spec.format {
        AdmissionNumberFormat::YearSeq => Some(format!("{}-{:0width$}", year, seq)),
        AdmissionNumberFormat::PrefixYearSeq => {
            Some(format!("{}{}-{:0width$}", spec.prefix, year, seq))
        }
        AdmissionNumberFormat::Custom => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_seq_format() {
        let spec = AdmissionNumberSpec::default();
        assert_eq!(
            format_admission_number(&spec, 2026, 1).as_deref(),
            Some("2026-0001")
        );
        assert_eq!(
            format_admission_number(&spec, 2026, 123).as_deref(),
            Some("2026-0123")
        );
    }

    #[test]
    fn test_prefix_year_seq_format() {
        let spec =
            AdmissionNumberSpec::new(AdmissionNumberFormat::PrefixYearSeq, "KCB-", 4);
        assert_eq!(
            format_admission_number(&spec, 2026, 1).as_deref(),
            Some("KCB-2026-0001")
        );
        assert_eq!(
            format_admission_number(&spec, 2026, 2).as_deref(),
            Some("KCB-2026-0002")
        );
    }

    #[test]
    fn test_custom_format_is_a_no_op() {
        let spec = AdmissionNumberSpec::new(AdmissionNumberFormat::Custom, "", 4);
        assert_eq!(format_admission_number(&spec, 2026, 1), None);
    }

    #[test]
    fn test_padding_widths() {
        let spec = AdmissionNumberSpec::new(AdmissionNumberFormat::YearSeq, "", 5);
        assert_eq!(
            format_admission_number(&spec, 2026, 42).as_deref(),
            Some("2026-00042")
        );

        // Sequence wider than the padding is never truncated.
        let spec = AdmissionNumberSpec::new(AdmissionNumberFormat::YearSeq, "", 2);
        assert_eq!(
            format_admission_number(&spec, 2026, 12345).as_deref(),
            Some("2026-12345")
        );
    }

    #[test]
    fn test_unconfigured_padding_defaults() {
        let spec = AdmissionNumberSpec::new(AdmissionNumberFormat::YearSeq, "", 0);
        assert_eq!(spec.padding, DEFAULT_SEQ_PADDING);
    }

    #[test]
    fn test_sequence_prefix_keying() {
        let spec =
            AdmissionNumberSpec::new(AdmissionNumberFormat::PrefixYearSeq, "INT-", 4);
        assert_eq!(spec.sequence_prefix(), "INT-");

        let spec = AdmissionNumberSpec::new(AdmissionNumberFormat::YearSeq, "INT-", 4);
        assert_eq!(spec.sequence_prefix(), "");
    }
}
