//! Input model – the typed view of one expediente record, plus payload
//! validation.
//!
//! Every field is optional. Scalar values are kept as opaque text: strings
//! are copied verbatim, numbers use their JSON spelling, booleans read
//! `True`/`False`, and `null` counts as absent. Defaults are declared here
//! and nowhere else.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// Title used when a record carries no `expedientName`.
pub const DEFAULT_TITLE: &str = "Informe Legal";
/// Value shown for absent monetary summary figures.
pub const DEFAULT_AMOUNT: &str = "0.00";

/// Deserialize any JSON value into optional text.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(&value))
}

/// Textual representation of a JSON value; `None` for `null`.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn text_or<'a>(field: &'a Option<String>, default: &'a str) -> &'a str {
    field.as_deref().unwrap_or(default)
}

/// A participant of the case.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Interviniente {
    #[serde(deserialize_with = "lenient_text")]
    pub tipo: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub nombre: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub identificacion: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub telefono: Option<String>,
}

/// A financial line item.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatoEconomico {
    #[serde(deserialize_with = "lenient_text")]
    pub tipo: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub fecha: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub descripcion: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub importe: Option<String>,
}

/// A logged case action with billing metadata.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Actuacion {
    #[serde(deserialize_with = "lenient_text")]
    pub fecha: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub asunto: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub responsable: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub etapa: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub facturable: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub importe: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub duracion: Option<String>,
}

/// A recovery-ledger entry. Unlike the other collections its keys are
/// capitalized in the input, and only the capitalized spelling is read.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct Recobro {
    #[serde(deserialize_with = "lenient_text")]
    pub tipo: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub fecha: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub descripcion: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub haber: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub saldo: Option<String>,
}

/// One case file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpedienteRecord {
    #[serde(deserialize_with = "lenient_text")]
    pub expedient_name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub modified_by: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub modified_date: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub situation: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub titular: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub responsable: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub cliente: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub contrario: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub organo: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub num_autos: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub cuantia: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub intereses: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub saldo: Option<String>,

    pub intervinientes: Option<Vec<Interviniente>>,
    pub datos_economicos: Option<Vec<DatoEconomico>>,
    pub actuaciones: Option<Vec<Actuacion>>,
    pub recobros: Option<Vec<Recobro>>,
}

/// Typed accessors with the documented defaults.
impl ExpedienteRecord {
    pub fn title(&self) -> &str {
        text_or(&self.expedient_name, DEFAULT_TITLE)
    }
    pub fn modified_by(&self) -> &str {
        text_or(&self.modified_by, "")
    }
    pub fn modified_date(&self) -> &str {
        text_or(&self.modified_date, "")
    }
    pub fn situation(&self) -> &str {
        text_or(&self.situation, "")
    }
    pub fn titular(&self) -> &str {
        text_or(&self.titular, "")
    }
    pub fn responsable(&self) -> &str {
        text_or(&self.responsable, "")
    }
    pub fn cliente(&self) -> &str {
        text_or(&self.cliente, "")
    }
    pub fn contrario(&self) -> &str {
        text_or(&self.contrario, "")
    }
    pub fn organo(&self) -> &str {
        text_or(&self.organo, "")
    }
    pub fn num_autos(&self) -> &str {
        text_or(&self.num_autos, "")
    }
    pub fn cuantia(&self) -> &str {
        text_or(&self.cuantia, DEFAULT_AMOUNT)
    }
    pub fn intereses(&self) -> &str {
        text_or(&self.intereses, DEFAULT_AMOUNT)
    }
    pub fn saldo(&self) -> &str {
        text_or(&self.saldo, DEFAULT_AMOUNT)
    }

    /// Participants, or an empty slice when absent.
    pub fn intervinientes(&self) -> &[Interviniente] {
        self.intervinientes.as_deref().unwrap_or_default()
    }
    pub fn datos_economicos(&self) -> &[DatoEconomico] {
        self.datos_economicos.as_deref().unwrap_or_default()
    }
    pub fn actuaciones(&self) -> &[Actuacion] {
        self.actuaciones.as_deref().unwrap_or_default()
    }
    pub fn recobros(&self) -> &[Recobro] {
        self.recobros.as_deref().unwrap_or_default()
    }
}

/// Text of an optional cell value, blank when absent.
pub fn cell(field: &Option<String>) -> &str {
    text_or(field, "")
}

/// Input keys of the row collections.
const COLLECTIONS: [&str; 4] = ["intervinientes", "datosEconomicos", "actuaciones", "recobros"];

/// Every present row collection must be a list of objects.
fn check_collections(index: usize, record: &Value) -> Result<()> {
    for key in COLLECTIONS {
        let rows = match record.get(key) {
            None | Some(Value::Null) => continue,
            Some(Value::Array(rows)) => rows,
            Some(_) => {
                return Err(Error::Validation(format!(
                    "record {index}: '{key}' must be a list"
                )))
            }
        };
        if let Some(row) = rows.iter().position(|r| !r.is_object()) {
            return Err(Error::Validation(format!(
                "record {index}: '{key}' row {row} must be an object"
            )));
        }
    }
    Ok(())
}

/// Check that the payload is a list of record objects and decode it.
///
/// Nothing is rendered when this fails.
pub fn validate_payload(payload: &Value) -> Result<Vec<ExpedienteRecord>> {
    let items = payload
        .as_array()
        .ok_or_else(|| Error::Validation("payload must be a list of records".to_string()))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                return Err(Error::Validation(format!("record {i} must be an object")));
            }
            check_collections(i, item)?;
            ExpedienteRecord::deserialize(item)
                .map_err(|e| Error::Validation(format!("record {i}: {e}")))
        })
        .collect()
}
