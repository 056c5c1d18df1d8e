//! Result sink: persistence of cleansed benefit rows, partitioned by batch
//! label.
//!
//! Save failures are logged and absorbed by the engine (the record's outcome
//! is already decided by then); delete and select failures surface to the
//! caller since those back direct user actions.

use crate::error::{BatchError, Result};
use crate::logging::log_sink_operation;
use crate::models::{BenefitBalances, CleansedRow};
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Instant;

/// Seam between the engine and the persistence store.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Append one enriched record under the given batch label.
    async fn save(&self, balances: &BenefitBalances, label: &str) -> Result<()>;

    /// Purge every row persisted under the label.
    async fn delete_by_label(&self, label: &str) -> Result<()>;

    /// Fetch every row persisted under the label, used by export.
    async fn select_by_label(&self, label: &str) -> Result<Vec<CleansedRow>>;
}

/// Production sink over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PostgresSink {
    pool: PgPool,
}

impl PostgresSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultSink for PostgresSink {
    async fn save(&self, balances: &BenefitBalances, label: &str) -> Result<()> {
        let row = CleansedRow::from_balances(balances, label);
        let started = Instant::now();

        sqlx::query(
            r#"
            INSERT INTO cleansed_benefits (
                numero_beneficio, numero_documento, nome, estado, pensao,
                data_nascimento, tipo_bloqueio, data_concessao, tipo_credito,
                limite_cartao_beneficio, saldo_cartao_beneficio,
                status_beneficio, data_fim_beneficio,
                limite_cartao_consignado, saldo_cartao_consignado,
                saldo_credito_consignado, saldo_total_maximo,
                saldo_total_utilizado, saldo_total_disponivel,
                data_consulta, data_retorno_consulta, tempo_retorno_consulta,
                nome_representante_legal, banco_desembolso,
                agencia_desembolso, numero_conta_desembolso,
                digito_conta_desembolso, numero_portabilidades, nome_arquivo
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26,
                $27, $28, $29
            )
            "#,
        )
        .bind(&row.numero_beneficio)
        .bind(&row.numero_documento)
        .bind(&row.nome)
        .bind(&row.estado)
        .bind(&row.pensao)
        .bind(&row.data_nascimento)
        .bind(&row.tipo_bloqueio)
        .bind(&row.data_concessao)
        .bind(&row.tipo_credito)
        .bind(row.limite_cartao_beneficio)
        .bind(row.saldo_cartao_beneficio)
        .bind(&row.status_beneficio)
        .bind(&row.data_fim_beneficio)
        .bind(row.limite_cartao_consignado)
        .bind(row.saldo_cartao_consignado)
        .bind(row.saldo_credito_consignado)
        .bind(row.saldo_total_maximo)
        .bind(row.saldo_total_utilizado)
        .bind(row.saldo_total_disponivel)
        .bind(&row.data_consulta)
        .bind(&row.data_retorno_consulta)
        .bind(&row.tempo_retorno_consulta)
        .bind(&row.nome_representante_legal)
        .bind(&row.banco_desembolso)
        .bind(&row.agencia_desembolso)
        .bind(&row.numero_conta_desembolso)
        .bind(&row.digito_conta_desembolso)
        .bind(row.numero_portabilidades)
        .bind(&row.nome_arquivo)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            log_sink_operation("save", label, "failed", None, Some(&e.to_string()));
            BatchError::Persistence(format!("failed to save cleansed row: {e}"))
        })?;

        log_sink_operation(
            "save",
            label,
            "success",
            Some(started.elapsed().as_millis() as u64),
            None,
        );
        Ok(())
    }

    async fn delete_by_label(&self, label: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM cleansed_benefits WHERE nome_arquivo = $1")
            .bind(label)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log_sink_operation("delete_by_label", label, "failed", None, Some(&e.to_string()));
                BatchError::Persistence(format!("failed to delete rows for label {label}: {e}"))
            })?;

        log_sink_operation(
            "delete_by_label",
            label,
            "success",
            None,
            Some(&format!("{} row(s) deleted", result.rows_affected())),
        );
        Ok(())
    }

    async fn select_by_label(&self, label: &str) -> Result<Vec<CleansedRow>> {
        let rows = sqlx::query_as::<_, CleansedRow>(
            "SELECT * FROM cleansed_benefits WHERE nome_arquivo = $1",
        )
        .bind(label)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            log_sink_operation("select_by_label", label, "failed", None, Some(&e.to_string()));
            BatchError::Persistence(format!("failed to select rows for label {label}: {e}"))
        })?;

        Ok(rows)
    }
}
