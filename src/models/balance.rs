//! Balance-lookup payloads and their persisted representation.
//!
//! [`BenefitBalances`] mirrors the external service's camelCase response
//! body. [`CleansedRow`] mirrors the `cleansed_benefits` table, which keeps
//! the Portuguese column names consumers of the exported CSV expect.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Disbursement account block nested inside the lookup payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisbursementBankAccount {
    pub bank: Option<String>,
    pub branch: Option<String>,
    pub number: Option<String>,
    pub digit: Option<String>,
}

/// Structured payload returned by the balance-lookup endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BenefitBalances {
    pub name: Option<String>,
    pub benefit_number: Option<String>,
    pub document_number: Option<String>,
    pub state: Option<String>,
    pub alimony: Option<String>,
    pub birth_date: Option<String>,
    pub block_type: Option<String>,
    pub grant_date: Option<String>,
    pub credit_type: Option<String>,
    pub benefit_card_limit: Option<f64>,
    pub benefit_card_balance: Option<f64>,
    pub benefit_status: Option<String>,
    pub benefit_end_date: Option<String>,
    pub consigned_card_limit: Option<f64>,
    pub consigned_card_balance: Option<f64>,
    pub consigned_credit_balance: Option<f64>,
    pub max_total_balance: Option<f64>,
    pub used_total_balance: Option<f64>,
    pub available_total_balance: Option<f64>,
    pub query_date: Option<String>,
    pub query_return_date: Option<String>,
    pub query_return_time: Option<String>,
    pub legal_representative_name: Option<String>,
    pub disbursement_bank_account: Option<DisbursementBankAccount>,
    pub number_of_portabilities: Option<i64>,
}

impl BenefitBalances {
    /// A 200 reply only counts as usable when it carries a non-blank name.
    pub fn has_usable_name(&self) -> bool {
        self.name
            .as_deref()
            .map(|n| !n.trim().is_empty())
            .unwrap_or(false)
    }
}

/// One persisted row of the `cleansed_benefits` table, partitioned by
/// `nome_arquivo` (the batch label).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CleansedRow {
    pub numero_beneficio: Option<String>,
    pub numero_documento: Option<String>,
    pub nome: Option<String>,
    pub estado: Option<String>,
    pub pensao: Option<String>,
    pub data_nascimento: Option<String>,
    pub tipo_bloqueio: Option<String>,
    pub data_concessao: Option<String>,
    pub tipo_credito: Option<String>,
    pub limite_cartao_beneficio: Option<f64>,
    pub saldo_cartao_beneficio: Option<f64>,
    pub status_beneficio: Option<String>,
    pub data_fim_beneficio: Option<String>,
    pub limite_cartao_consignado: Option<f64>,
    pub saldo_cartao_consignado: Option<f64>,
    pub saldo_credito_consignado: Option<f64>,
    pub saldo_total_maximo: Option<f64>,
    pub saldo_total_utilizado: Option<f64>,
    pub saldo_total_disponivel: Option<f64>,
    pub data_consulta: Option<String>,
    pub data_retorno_consulta: Option<String>,
    pub tempo_retorno_consulta: Option<String>,
    pub nome_representante_legal: Option<String>,
    pub banco_desembolso: Option<String>,
    pub agencia_desembolso: Option<String>,
    pub numero_conta_desembolso: Option<String>,
    pub digito_conta_desembolso: Option<String>,
    pub numero_portabilidades: Option<i64>,
    pub nome_arquivo: String,
}

impl CleansedRow {
    /// Map a lookup payload to its persisted shape, applying the same field
    /// translations the source system used on save.
    pub fn from_balances(balances: &BenefitBalances, batch_label: &str) -> Self {
        let account = balances.disbursement_bank_account.clone().unwrap_or_default();

        Self {
            numero_beneficio: balances.benefit_number.clone(),
            numero_documento: balances.document_number.clone(),
            nome: balances.name.clone(),
            estado: balances.state.clone(),
            pensao: Some(translate_alimony(balances.alimony.as_deref())),
            data_nascimento: balances.birth_date.as_deref().and_then(format_birth_date),
            tipo_bloqueio: balances.block_type.clone(),
            data_concessao: balances.grant_date.clone(),
            tipo_credito: Some(translate_credit_type(balances.credit_type.as_deref())),
            limite_cartao_beneficio: balances.benefit_card_limit,
            saldo_cartao_beneficio: balances.benefit_card_balance,
            status_beneficio: balances.benefit_status.clone(),
            data_fim_beneficio: balances.benefit_end_date.clone(),
            limite_cartao_consignado: balances.consigned_card_limit,
            saldo_cartao_consignado: balances.consigned_card_balance,
            saldo_credito_consignado: balances.consigned_credit_balance,
            saldo_total_maximo: balances.max_total_balance,
            saldo_total_utilizado: balances.used_total_balance,
            saldo_total_disponivel: balances.available_total_balance,
            data_consulta: balances.query_date.clone(),
            data_retorno_consulta: balances.query_return_date.clone(),
            tempo_retorno_consulta: balances.query_return_time.clone(),
            nome_representante_legal: balances.legal_representative_name.clone(),
            banco_desembolso: account.bank,
            agencia_desembolso: account.branch,
            numero_conta_desembolso: account.number,
            digito_conta_desembolso: account.digit,
            numero_portabilidades: balances.number_of_portabilities,
            nome_arquivo: batch_label.to_string(),
        }
    }
}

fn translate_alimony(alimony: Option<&str>) -> String {
    if alimony == Some("payer") {
        "SIM".to_string()
    } else {
        "NÃO".to_string()
    }
}

fn translate_credit_type(credit_type: Option<&str>) -> String {
    if credit_type == Some("checking_account") {
        "Conta Corrente".to_string()
    } else {
        "Cartão Magnético".to_string()
    }
}

/// Reformat `ddmmyyyy` into `yyyy-mm-dd`; anything else yields `None`.
fn format_birth_date(raw: &str) -> Option<String> {
    if raw.len() != 8 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}-{}-{}", &raw[4..8], &raw[2..4], &raw[0..2]))
}
