// ============================================================
// FORMAT DESCRIPTOR
// ============================================================
// Record layout inferred from a file sample, carried into the line pass

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field separator of a delimited layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delimiter {
    Semicolon,
    Comma,
}

impl Delimiter {
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Semicolon => ';',
            Delimiter::Comma => ',',
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Semicolon => b';',
            Delimiter::Comma => b',',
        }
    }
}

/// One of the three canonical fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    Code,
    Name,
    Uf,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Code => "codigo",
            Field::Name => "nome",
            Field::Uf => "uf",
        }
    }
}

/// Physical column order of a delimited layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOrder([Field; 3]);

impl FieldOrder {
    /// `CODIGO;NOME;UF`
    pub const CODE_NAME_UF: FieldOrder = FieldOrder([Field::Code, Field::Name, Field::Uf]);

    /// `UF;NOME;CODIGO`
    pub const UF_NAME_CODE: FieldOrder = FieldOrder([Field::Uf, Field::Name, Field::Code]);

    /// Column index holding `field`
    pub fn position(&self, field: Field) -> usize {
        self.0
            .iter()
            .position(|f| *f == field)
            .unwrap_or_default()
    }
}

impl fmt::Display for FieldOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.0.iter().map(|f| f.label().to_uppercase()).collect();
        write!(f, "{}", labels.join(","))
    }
}

/// Structural layout of every line in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordLayout {
    /// Three positional fields split on a fixed delimiter
    Delimited {
        delimiter: Delimiter,
        order: FieldOrder,
    },

    /// `[Processando: ]Código=<code>, Município=<name>, UF=<uf>`
    KeyValue,
}

impl fmt::Display for RecordLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordLayout::Delimited { delimiter, order } => {
                let order = order.to_string().replace(',', &delimiter.as_char().to_string());
                write!(f, "{}", order)
            }
            RecordLayout::KeyValue => write!(f, "Código=X, Município=Y, UF=Z"),
        }
    }
}

/// Layout plus the encoding that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub layout: RecordLayout,
    pub encoding: &'static Encoding,
}

impl FormatDescriptor {
    pub fn new(layout: RecordLayout, encoding: &'static Encoding) -> Self {
        Self { layout, encoding }
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.layout, self.encoding.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_positions() {
        assert_eq!(FieldOrder::CODE_NAME_UF.position(Field::Uf), 2);
        assert_eq!(FieldOrder::UF_NAME_CODE.position(Field::Uf), 0);
        assert_eq!(FieldOrder::UF_NAME_CODE.position(Field::Code), 2);
    }

    #[test]
    fn test_layout_display() {
        let layout = RecordLayout::Delimited {
            delimiter: Delimiter::Semicolon,
            order: FieldOrder::CODE_NAME_UF,
        };
        assert_eq!(layout.to_string(), "CODIGO;NOME;UF");
    }
}
