//! Sample record batches for testing and demonstration.
//!
//! Each sample exercises a different part of the report.

use serde_json::{json, Value};

/// A record with only a title; every optional section is skipped.
pub fn minimal_record() -> Value {
    json!({ "expedientName": "Reclamación de cantidad 112/2024" })
}

/// A record that fills every section of the report.
pub fn full_record() -> Value {
    json!({
        "expedientName": "Reclamación de cantidad 112/2024",
        "modifiedBy": "Lucía Ferrer",
        "modifiedDate": "12/03/2024",
        "situation": "En trámite",
        "titular": "Banco Meridional S.A.",
        "responsable": "Javier Ortega",
        "cliente": "Banco Meridional S.A.",
        "contrario": "Construcciones Arlanza S.L.",
        "organo": "Juzgado de Primera Instancia nº 4 de Valladolid",
        "numAutos": "112/2024",
        "cuantia": "18.450,00",
        "intereses": "1.203,75",
        "saldo": "15.653,75",
        "intervinientes": [
            {
                "tipo": "Demandante",
                "nombre": "Banco Meridional S.A.",
                "identificacion": "A28000000",
                "telefono": "983 000 111"
            },
            {
                "tipo": "Demandado",
                "nombre": "Construcciones Arlanza S.L.",
                "identificacion": "B47000000",
                "telefono": "983 222 333"
            }
        ],
        "datosEconomicos": [
            {
                "tipo": "Principal",
                "fecha": "01/02/2024",
                "descripcion": "Deuda reclamada",
                "importe": "18.450,00"
            },
            {
                "tipo": "Intereses",
                "fecha": "01/03/2024",
                "descripcion": "Intereses de demora",
                "importe": 1203.75
            }
        ],
        "actuaciones": [
            {
                "fecha": "05/02/2024",
                "asunto": "Presentación de demanda",
                "responsable": "Javier Ortega",
                "etapa": "Demanda",
                "facturable": true,
                "importe": "350,00",
                "duracion": "2h"
            },
            {
                "fecha": "20/02/2024",
                "asunto": "Requerimiento de pago",
                "responsable": "Lucía Ferrer",
                "etapa": "Ejecución",
                "facturable": false,
                "importe": null,
                "duracion": "30m"
            }
        ],
        "recobros": [
            {
                "Tipo": "Transferencia",
                "Fecha": "10/03/2024",
                "Descripcion": "Pago parcial",
                "Haber": "4.000,00",
                "Saldo": "15.653,75"
            }
        ]
    })
}

/// A record whose action log is long enough to span several pages.
pub fn long_actions_record(rows: usize) -> Value {
    let actuaciones: Vec<Value> = (0..rows)
        .map(|i| {
            json!({
                "fecha": format!("{:02}/01/2024", i % 28 + 1),
                "asunto": format!("Actuación {i}"),
                "responsable": "Javier Ortega",
                "etapa": "Ejecución",
                "facturable": i % 2 == 0,
                "importe": "100,00",
                "duracion": "1h"
            })
        })
        .collect();
    json!({
        "expedientName": "Ejecución hipotecaria 7/2023",
        "actuaciones": actuaciones
    })
}

/// Wrap records into a batch payload.
pub fn batch(records: &[Value]) -> Value {
    Value::Array(records.to_vec())
}
