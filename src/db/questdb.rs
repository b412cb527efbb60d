//! QuestDB storage over the PostgreSQL wire protocol

use super::{SignalQuery, SignalStore};
use crate::error::PipelineError;
use crate::models::indicators::Candle;
use crate::models::signal::{Alert, Signal};
use crate::models::timeframe::Timeframe;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{error, info};

/// Full signals are kept as JSON in `payload`; the other columns exist for filtering.
const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS market_data (
        timestamp TIMESTAMP,
        instrument SYMBOL,
        timeframe SYMBOL,
        open DOUBLE,
        high DOUBLE,
        low DOUBLE,
        close DOUBLE,
        volume DOUBLE
    ) TIMESTAMP(timestamp) PARTITION BY DAY WAL
    DEDUP UPSERT KEYS(timestamp, instrument, timeframe)",
    "CREATE TABLE IF NOT EXISTS signals (
        timestamp TIMESTAMP,
        instrument SYMBOL,
        timeframe SYMBOL,
        direction SYMBOL,
        confidence SYMBOL,
        price DOUBLE,
        target_price DOUBLE,
        stop_loss DOUBLE,
        composite_score DOUBLE,
        payload STRING
    ) TIMESTAMP(timestamp) PARTITION BY DAY WAL",
    "CREATE TABLE IF NOT EXISTS alerts (
        timestamp TIMESTAMP,
        instrument SYMBOL,
        timeframe SYMBOL,
        direction SYMBOL,
        confidence SYMBOL,
        price DOUBLE,
        message STRING
    ) TIMESTAMP(timestamp) PARTITION BY DAY WAL",
];

pub struct QuestDatabase {
    client: Client,
}

impl QuestDatabase {
    /// Connect and make sure the tables exist
    pub async fn connect(url: &str) -> Result<Self, PipelineError> {
        let (client, connection) = tokio_postgres::connect(url, NoTls)
            .await
            .map_err(|e| PipelineError::Persistence(format!("failed to connect to QuestDB: {e}")))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "QuestDB connection error");
            }
        });

        let db = Self { client };
        db.init_schema().await?;
        info!("QuestDB schema ready");
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), PipelineError> {
        for statement in SCHEMA {
            self.client.execute(statement, &[]).await?;
        }
        Ok(())
    }

    /// Stored window for one pair, oldest first
    pub async fn market_data(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, PipelineError> {
        let query = format!(
            "SELECT timestamp, open, high, low, close, volume
             FROM market_data
             WHERE instrument = $1 AND timeframe = $2
             ORDER BY timestamp DESC
             LIMIT {limit}"
        );
        let rows = self
            .client
            .query(&query, &[&instrument, &timeframe.as_str()])
            .await?;

        let mut candles: Vec<Candle> = rows
            .iter()
            .map(|row| {
                let timestamp: NaiveDateTime = row.get(0);
                Candle {
                    timestamp: timestamp.and_utc().timestamp_millis(),
                    open: row.get(1),
                    high: row.get(2),
                    low: row.get(3),
                    close: row.get(4),
                    volume: row.get(5),
                }
            })
            .collect();
        candles.reverse();
        Ok(candles)
    }
}

fn naive(millis: i64) -> Result<NaiveDateTime, PipelineError> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.naive_utc())
        .ok_or_else(|| PipelineError::Persistence(format!("timestamp {millis} out of range")))
}

fn signal_from_row(row: &Row) -> Result<Signal, PipelineError> {
    let payload: String = row.get("payload");
    Ok(serde_json::from_str(&payload)?)
}

#[async_trait]
impl SignalStore for QuestDatabase {
    async fn upsert_market_data(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<(), PipelineError> {
        let statement = self
            .client
            .prepare(
                "INSERT INTO market_data (timestamp, instrument, timeframe, open, high, low, close, volume)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .await?;
        for candle in candles {
            self.client
                .execute(
                    &statement,
                    &[
                        &naive(candle.timestamp)?,
                        &instrument,
                        &timeframe.as_str(),
                        &candle.open,
                        &candle.high,
                        &candle.low,
                        &candle.close,
                        &candle.volume,
                    ],
                )
                .await?;
        }
        Ok(())
    }

    async fn append_signal(&self, signal: &Signal) -> Result<(), PipelineError> {
        let payload = serde_json::to_string(signal)?;
        let confidence = signal.confidence.map(|c| c.as_str());
        self.client
            .execute(
                "INSERT INTO signals (timestamp, instrument, timeframe, direction, confidence, price, target_price, stop_loss, composite_score, payload)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
                &[
                    &signal.timestamp.naive_utc(),
                    &signal.instrument,
                    &signal.timeframe.as_str(),
                    &signal.direction.as_str(),
                    &confidence,
                    &signal.price,
                    &signal.target_price,
                    &signal.stop_loss,
                    &signal.composite_score,
                    &payload,
                ],
            )
            .await?;
        Ok(())
    }

    async fn append_alert(&self, alert: &Alert) -> Result<(), PipelineError> {
        self.client
            .execute(
                "INSERT INTO alerts (timestamp, instrument, timeframe, direction, confidence, price, message)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
                &[
                    &alert.timestamp.naive_utc(),
                    &alert.instrument,
                    &alert.timeframe.as_str(),
                    &alert.direction.as_str(),
                    &alert.confidence.as_str(),
                    &alert.price,
                    &alert.message,
                ],
            )
            .await?;
        Ok(())
    }

    async fn signals(&self, query: &SignalQuery) -> Result<Vec<Signal>, PipelineError> {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn ToSql + Sync + Send>> = Vec::new();

        if let Some(instrument) = &query.instrument {
            params.push(Box::new(instrument.to_ascii_uppercase()));
            clauses.push(format!("instrument = ${}", params.len()));
        }
        if !query.timeframes.is_empty() {
            let mut placeholders = Vec::with_capacity(query.timeframes.len());
            for tf in &query.timeframes {
                params.push(Box::new(tf.as_str().to_string()));
                placeholders.push(format!("${}", params.len()));
            }
            clauses.push(format!("timeframe IN ({})", placeholders.join(", ")));
        }
        if let Some(direction) = query.direction {
            params.push(Box::new(direction.as_str().to_string()));
            clauses.push(format!("direction = ${}", params.len()));
        }
        if let Some(since) = query.since {
            params.push(Box::new(since.naive_utc()));
            clauses.push(format!("timestamp >= ${}", params.len()));
        }

        let filter = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT payload FROM signals {filter} ORDER BY timestamp DESC LIMIT {}",
            query.limit
        );

        let refs: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();
        let rows = self.client.query(&sql, &refs).await?;
        rows.iter().map(signal_from_row).collect()
    }

    async fn latest_signals(&self) -> Result<Vec<Signal>, PipelineError> {
        let rows = self
            .client
            .query(
                "SELECT payload FROM signals LATEST ON timestamp PARTITION BY instrument, timeframe",
                &[],
            )
            .await?;
        let mut signals = rows.iter().map(signal_from_row).collect::<Result<Vec<_>, _>>()?;
        signals.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(signals)
    }

    async fn alerts(&self, limit: usize) -> Result<Vec<Alert>, PipelineError> {
        let query = format!(
            "SELECT timestamp, instrument, timeframe, direction, confidence, price, message
             FROM alerts ORDER BY timestamp DESC LIMIT {limit}"
        );
        let rows = self.client.query(&query, &[]).await?;
        rows.iter()
            .map(|row| -> Result<Alert, PipelineError> {
                let timestamp: NaiveDateTime = row.get(0);
                let timeframe: String = row.get(2);
                let direction: String = row.get(3);
                let confidence: String = row.get(4);
                Ok(Alert {
                    timestamp: timestamp.and_utc(),
                    instrument: row.get(1),
                    timeframe: timeframe.parse()?,
                    direction: serde_json::from_value(serde_json::Value::String(direction))?,
                    confidence: serde_json::from_value(serde_json::Value::String(confidence))?,
                    price: row.get(5),
                    message: row.get(6),
                })
            })
            .collect()
    }
}
