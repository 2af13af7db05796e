// ============================================================
// LINE PARSER
// ============================================================
// Extract (uf, code, name) from one line of a classified file

use super::format_sniffer::{CODE_TAG, NAME_TAG, PROCESSING_PREFIX, UF_TAG};
use super::line_reader::split_fields;
use crate::domain::municipio::{
    is_uf_token, Delimiter, Field, FieldOrder, LineError, LineErrorKind, MunicipioRecord,
    RecordLayout,
};

/// Stateless parser bound to one layout
#[derive(Debug, Clone, Copy)]
pub struct LineParser {
    layout: RecordLayout,
}

impl LineParser {
    pub fn new(layout: RecordLayout) -> Self {
        Self { layout }
    }

    /// Parse one non-blank line into a normalized record
    pub fn parse(&self, line: &str) -> Result<MunicipioRecord, LineError> {
        let line = line.trim();
        match self.layout {
            RecordLayout::Delimited { delimiter, order } => {
                Self::parse_delimited(line, delimiter, order)
            }
            RecordLayout::KeyValue => {
                let (code, name, uf) = Self::split_key_value(line)?;
                Self::build(line, code, name, uf)
            }
        }
    }

    fn parse_delimited(
        line: &str,
        delimiter: Delimiter,
        order: FieldOrder,
    ) -> Result<MunicipioRecord, LineError> {
        let parts = split_fields(line, delimiter);
        if parts.len() != 3 {
            return Err(LineError::new(
                line,
                LineErrorKind::FieldCount {
                    delimiter: delimiter.as_char(),
                    found: parts.len(),
                },
            ));
        }

        Self::build(
            line,
            &parts[order.position(Field::Code)],
            &parts[order.position(Field::Name)],
            &parts[order.position(Field::Uf)],
        )
    }

    fn split_key_value(line: &str) -> Result<(&str, &str, &str), LineError> {
        let body = line.strip_prefix(PROCESSING_PREFIX).unwrap_or(line);

        let code = tag_value(body, CODE_TAG, true)
            .ok_or_else(|| LineError::new(line, LineErrorKind::MissingTag(CODE_TAG.into())))?;
        let name = tag_value(body, NAME_TAG, true)
            .ok_or_else(|| LineError::new(line, LineErrorKind::MissingTag(NAME_TAG.into())))?;
        // UF is the trailing field; take it to end of line
        let uf = tag_value(body, UF_TAG, false)
            .ok_or_else(|| LineError::new(line, LineErrorKind::MissingTag(UF_TAG.into())))?;

        Ok((code, name, uf))
    }

    /// Validate the extracted fields and normalize them into a record
    fn build(line: &str, code: &str, name: &str, uf: &str) -> Result<MunicipioRecord, LineError> {
        for (field, value) in [(Field::Code, code), (Field::Name, name), (Field::Uf, uf)] {
            if value.is_empty() {
                return Err(LineError::new(line, LineErrorKind::EmptyField(field)));
            }
        }
        if !is_uf_token(uf) {
            return Err(LineError::new(line, LineErrorKind::InvalidUf(uf.to_string())));
        }
        Ok(MunicipioRecord::new(uf, code, name))
    }
}

/// Text after `tag`, up to the next comma when `until_comma`, trimmed
fn tag_value<'a>(body: &'a str, tag: &str, until_comma: bool) -> Option<&'a str> {
    let start = body.find(tag)? + tag.len();
    let rest = &body[start..];
    let value = if until_comma {
        rest.split(',').next().unwrap_or(rest)
    } else {
        rest
    };
    Some(value.trim())
}
