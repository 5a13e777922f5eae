use serde::{Deserialize, Serialize};

/// Barcode encoding standards a platform detector may report.
///
/// Names follow the identifiers host barcode APIs use (`qr_code`,
/// `ean_13`, ...). Only [`Symbology::QrCode`] is ever requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    Aztec,
    #[serde(rename = "code_128")]
    Code128,
    #[serde(rename = "code_39")]
    Code39,
    DataMatrix,
    #[serde(rename = "ean_13")]
    Ean13,
    #[serde(rename = "ean_8")]
    Ean8,
    Pdf417,
    QrCode,
    UpcA,
    UpcE,
}

pub const REQUIRED_SYMBOLOGY: Symbology = Symbology::QrCode;

impl Symbology {
    pub fn as_str(self) -> &'static str {
        match self {
            Symbology::Aztec => "aztec",
            Symbology::Code128 => "code_128",
            Symbology::Code39 => "code_39",
            Symbology::DataMatrix => "data_matrix",
            Symbology::Ean13 => "ean_13",
            Symbology::Ean8 => "ean_8",
            Symbology::Pdf417 => "pdf417",
            Symbology::QrCode => "qr_code",
            Symbology::UpcA => "upc_a",
            Symbology::UpcE => "upc_e",
        }
    }
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_required_symbology_is_qr() {
        assert_eq!(REQUIRED_SYMBOLOGY.as_str(), "qr_code");
    }

    #[rstest]
    #[case(Symbology::Aztec)]
    #[case(Symbology::Code128)]
    #[case(Symbology::Code39)]
    #[case(Symbology::DataMatrix)]
    #[case(Symbology::Ean13)]
    #[case(Symbology::Ean8)]
    #[case(Symbology::Pdf417)]
    #[case(Symbology::QrCode)]
    #[case(Symbology::UpcA)]
    #[case(Symbology::UpcE)]
    fn test_serde_name_matches_display(#[case] symbology: Symbology) {
        let json = serde_json::to_string(&symbology).unwrap();
        assert_eq!(json, format!("\"{symbology}\""));
        let parsed: Symbology = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, symbology);
    }

    #[test]
    fn test_parses_host_format_list() {
        let json = r#"["ean_13","code_128","qr_code"]"#;
        let parsed: Vec<Symbology> = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed,
            vec![Symbology::Ean13, Symbology::Code128, Symbology::QrCode]
        );
    }
}
