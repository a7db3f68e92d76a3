// src/common/field_compare.rs

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

/// Valor de um campo de classificação visto pela detecção de mudanças.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Missing,
    Number(Decimal),
    /// Texto que pode carregar um número (ex.: fração arancelária).
    Text(&'a str),
    /// Texto livre: comparado só como texto, nunca como número.
    Label(&'a str),
    Ref(Uuid),
}

impl<'a> FieldValue<'a> {
    pub fn label(value: &'a Option<String>) -> Self {
        match value {
            Some(text) => FieldValue::Label(text),
            None => FieldValue::Missing,
        }
    }
}

impl<'a> From<&'a Option<String>> for FieldValue<'a> {
    fn from(value: &'a Option<String>) -> Self {
        match value {
            Some(text) => FieldValue::Text(text),
            None => FieldValue::Missing,
        }
    }
}

impl From<&Option<Decimal>> for FieldValue<'_> {
    fn from(value: &Option<Decimal>) -> Self {
        value.map_or(FieldValue::Missing, FieldValue::Number)
    }
}

impl From<&Option<Uuid>> for FieldValue<'_> {
    fn from(value: &Option<Uuid>) -> Self {
        value.map_or(FieldValue::Missing, FieldValue::Ref)
    }
}

impl FieldValue<'_> {
    // Vazio conta como zero, do mesmo jeito que o formulário envia "".
    fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Missing => Some(Decimal::ZERO),
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(t) if t.trim().is_empty() => Some(Decimal::ZERO),
            FieldValue::Text(t) => Decimal::from_str(t.trim()).ok(),
            FieldValue::Label(_) | FieldValue::Ref(_) => None,
        }
    }

    fn as_text(&self) -> String {
        match self {
            FieldValue::Missing => String::new(),
            FieldValue::Number(n) => n.normalize().to_string(),
            FieldValue::Text(t) | FieldValue::Label(t) => t.trim().to_string(),
            FieldValue::Ref(id) => id.to_string(),
        }
    }

    /// Verdadeiro quando o valor é vazio ou numericamente zero.
    pub fn is_blank(&self) -> bool {
        fields_equal(self, &FieldValue::Missing)
    }
}

/// Igualdade "frouxa" usada na detecção de mudanças.
///
/// Regra de coerção: se os dois lados podem ser lidos como número (vazio
/// conta como 0, texto é aparado e interpretado como decimal), compara
/// numericamente; senão compara o texto aparado. Assim `"0"`, `0`, `""` e
/// ausente são iguais entre si, e `"5.0"` é igual a `5`.
///
/// `Label` fica fora da coerção: `"007"` e `"7"` são valores diferentes, e só
/// o texto vazio equivale a ausente.
pub fn fields_equal(a: &FieldValue<'_>, b: &FieldValue<'_>) -> bool {
    match (a, b) {
        (FieldValue::Ref(x), FieldValue::Ref(y)) => x == y,
        (FieldValue::Label(_), _) | (_, FieldValue::Label(_)) => a.as_text() == b.as_text(),
        _ => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x == y,
            _ => a.as_text() == b.as_text(),
        },
    }
}

// ---
// Desserialização tolerante para payloads vindos de formulários
// ---

/// Aceita número, texto numérico, `""` ou `null`. Texto vazio vira `None`.
pub fn loose_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Decimal::from_str(s.trim())
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("valor numérico inválido: '{}'", s))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "esperado número ou texto numérico, recebido {}",
            other
        ))),
    }
}

/// Aceita texto ou número (ex.: fração arancelária digitada como número).
/// Texto vazio vira `None`.
pub fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "esperado texto, recebido {}",
            other
        ))),
    }
}

/// Referência opcional: `""` e `null` viram `None`.
pub fn loose_ref<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(s.trim())
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("referência inválida: '{}'", s))),
    }
}
