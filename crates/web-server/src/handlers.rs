use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use core_types::SignalReport;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub price: String,
}

#[derive(Debug, Deserialize)]
pub struct RiskQuery {
    pub risk: String,
}

#[derive(Debug, Serialize)]
pub struct Conversion {
    pub symbol: String,
    pub price: Decimal,
    pub risk: Decimal,
}

fn parse_decimal(name: &str, raw: &str) -> Result<Decimal, AppError> {
    Decimal::from_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("'{name}' must be a decimal number, got '{raw}'")))
}

/// # GET /api/health
pub async fn health() -> &'static str {
    "OK"
}

/// # GET /api/symbols
pub async fn list_symbols(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.service.symbols().await?))
}

/// # GET /api/risk/:symbol?price=
pub async fn get_risk(
    Path(symbol): Path<String>,
    Query(query): Query<PriceQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Conversion>, AppError> {
    let price = parse_decimal("price", &query.price)?;
    let risk = state.service.risk_of(&symbol, price).await?;
    Ok(Json(Conversion { symbol, price, risk }))
}

/// # GET /api/price/:symbol?risk=
pub async fn get_price(
    Path(symbol): Path<String>,
    Query(query): Query<RiskQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Conversion>, AppError> {
    let risk = parse_decimal("risk", &query.risk)?;
    let price = state.service.price_of(&symbol, risk).await?;
    Ok(Json(Conversion { symbol, price, risk }))
}

/// # GET /api/score/:symbol
pub async fn get_score(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SignalReport>, AppError> {
    Ok(Json(state.service.score_of(&symbol).await?))
}
