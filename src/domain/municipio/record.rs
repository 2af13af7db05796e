// ============================================================
// MUNICIPIO RECORD
// ============================================================
// Canonical row of the municipality table, keyed on (uf, cod_municipio)

use serde::{Deserialize, Serialize};

/// A normalized municipality row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MunicipioRecord {
    /// Two-letter state code, upper-case
    pub uf: String,

    /// External identifier, kept verbatim (leading zeros are significant)
    pub cod_municipio: String,

    /// Municipality name, upper-case
    pub nome_municipio: String,
}

impl MunicipioRecord {
    /// Build a record from already validated fields, applying normalization
    pub fn new(uf: &str, cod_municipio: &str, nome_municipio: &str) -> Self {
        Self {
            uf: uf.to_uppercase(),
            cod_municipio: cod_municipio.to_string(),
            nome_municipio: nome_municipio.to_uppercase(),
        }
    }
}

/// A state code is exactly two alphabetic characters.
pub fn is_uf_token(value: &str) -> bool {
    let mut count = 0usize;
    for c in value.chars() {
        if !c.is_alphabetic() {
            return false;
        }
        count += 1;
        if count > 2 {
            return false;
        }
    }
    count == 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_case_but_not_code() {
        let record = MunicipioRecord::new("go", "0052108", "Goiânia");
        assert_eq!(record.uf, "GO");
        assert_eq!(record.cod_municipio, "0052108");
        assert_eq!(record.nome_municipio, "GOIÂNIA");
    }

    #[test]
    fn test_uf_token() {
        assert!(is_uf_token("SP"));
        assert!(is_uf_token("go"));
        assert!(!is_uf_token("S"));
        assert!(!is_uf_token("SPX"));
        assert!(!is_uf_token("S1"));
        assert!(!is_uf_token(""));
    }
}
